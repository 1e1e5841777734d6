//! Core domain types
//!
//! This module contains the structures shared by the client library and the
//! command line tool. They mirror what is stored in the `images` data bag.

pub mod image;
pub mod machine_options;
pub mod server;
