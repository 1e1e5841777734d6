//! Imagespec Core
//!
//! Core types for storing machine image specifications on a Chef server.
//!
//! This crate contains:
//! - Domain types: the image record, its machine options and location, and
//!   the locator of the Chef server that owns it
//! - DTOs: request bodies and actions exchanged with the Chef server

pub mod domain;
pub mod dto;
