//! HTTP client for the laboratory backend services.
//!
//! [`ApiClient`] implements [`labo_core::backend::MemberBackend`] and
//! [`labo_core::backend::ResourceBackend`] for publications, events and tools
//! against the gateway paths of the member, publication, tool and event
//! services. Field-name normalisation between the backend's JSON and the
//! domain types lives in [`wire`].

mod client;
mod members;
mod resources;

pub mod error;
pub mod wire;

pub use client::{ApiClient, ApiConfig};
pub use error::{Error, Result};
pub use wire::WireResource;
