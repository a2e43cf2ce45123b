//! Error types for `labo-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The backend could not be reached or answered with a failure.
  #[error("transport error: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A draft is missing required fields; nothing was written.
  #[error("missing or invalid field(s): {}", .0.join(", "))]
  Validation(Vec<&'static str>),

  #[error("{kind} {id} not found")]
  NotFound { kind: &'static str, id: i64 },
}

impl Error {
  /// Box any backend error as a [`Error::Transport`].
  pub fn transport<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Transport(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
