//! Data Transfer Objects for talking to the Chef server
//!
//! Request bodies and action markers that are not part of the stored
//! image record itself.

pub mod data_bag;
