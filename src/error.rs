//! Typed failures that cross the repository boundary.
//!
//! The HTTP and API layers work with `anyhow` chains whose root cause is a
//! [`MovieError`]; the repository turns those chains back into this enum so
//! nothing above it has to deal with `anyhow`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MovieError {
    /// Network unreachable, connection reset, or the body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-2xx status. Only the path is kept so the
    /// API key in the query string never ends up in logs.
    #[error("upstream returned {status} for {path}")]
    Status { status: u16, path: String },

    /// Response body did not match the expected record shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Movie id is neither selected nor present in the current list.
    #[error("movie {0} not found")]
    NotFoundLocal(i32),
}

impl MovieError {
    /// True for failures in the transport class (network or non-2xx status).
    pub fn is_transport(&self) -> bool {
        matches!(self, MovieError::Transport(_) | MovieError::Status { .. })
    }

    /// Recovers the typed root cause of an `anyhow` chain. Anything that did
    /// not originate as a `MovieError` is reported as a transport failure.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.root_cause().downcast_ref::<MovieError>() {
            Some(typed) => typed.clone(),
            None => MovieError::Transport(format!("{err:#}")),
        }
    }
}
