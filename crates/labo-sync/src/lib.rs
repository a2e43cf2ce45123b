//! Member-association synchronisation for the labo administration client.
//!
//! Everything here is generic over the backend traits in
//! [`labo_core::backend`], so the same flows run against the HTTP client and
//! against in-memory fakes.
//!
//! - [`client::ResourceClient`]: fail-soft CRUD plus the association cache.
//! - [`sync::Synchronizer`]: id-set diffing, link/unlink fan-out, change
//!   notification.
//! - [`bus::ChangeBus`]: multicast of [`labo_core::change::ResourceChange`].
//! - [`cascade::CascadeDelete`]: member deletion with supervision and
//!   association cleanup.
//! - [`editor::ResourceEditor`], [`detail::MemberDetail`],
//!   [`dashboard::DashboardStats`]: the flows built on top.

pub mod bus;
pub mod cache;
pub mod cascade;
pub mod client;
pub mod dashboard;
pub mod detail;
pub mod editor;
pub mod error;
pub mod lab;
pub mod sync;

pub use error::{Error, Result};
pub use lab::Lab;

#[cfg(test)]
mod tests;
