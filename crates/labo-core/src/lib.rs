//! Core types and trait definitions for the labo administration client.
//!
//! This crate has no HTTP dependencies. The HTTP client
//! (`labo-client`) implements the backend traits; the synchronisation layer
//! (`labo-sync`) consumes them.

pub mod backend;
pub mod change;
pub mod error;
pub mod landing;
pub mod member;
pub mod resource;

pub use error::{Error, Result};
