//! Service error taxonomy.
//!
//! The deliberate asymmetry: analyzer unreliability (tool crashes,
//! provider timeouts, malformed responses) is absorbed inside the
//! runners and never surfaces here. The only user-visible failures
//! are input validation problems and history lookups — everything
//! else degrades to neutral results with a status marker.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    /// The request itself is unacceptable; surfaced as HTTP 400,
    /// never retried.
    #[error("{0}")]
    Validation(String),

    /// Requested review id is not in the history window.
    #[error("review not found")]
    NotFound,

    /// Anything else; surfaced as HTTP 500. Should not occur during
    /// normal operation given the runners' no-fail contracts.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
