//! Review workflow error types.

use thiserror::Error;

/// Errors that can occur in the review workflow.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Database error; the message is surfaced to the user verbatim.
    #[error("{0}")]
    Database(#[from] database::DatabaseError),

    /// The acting profile lacks the capability for this action.
    #[error("{0}")]
    Forbidden(String),

    /// Input refused before any request was issued.
    #[error("{0}")]
    Validation(#[from] database::ValidationError),

    /// The selected service has no configured cost centers or expense
    /// types; approval cannot proceed until someone fixes the setup.
    #[error("service has no cost centers or expense types configured")]
    ClassificationGap,

    /// A state-machine transition that is not allowed from the current
    /// state (e.g. approving without a full classification).
    #[error("{0}")]
    InvalidTransition(&'static str),
}

/// Result type for review operations.
pub type Result<T> = std::result::Result<T, ReviewError>;
