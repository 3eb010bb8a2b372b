//! Errors that indicate a bug in Weft rather than in the user's fabric.

/// Result of an operation that only fails when Weft's own bookkeeping is wrong.
pub type WeftResult<T> = Result<T, InternalError>;

/// A pass or writer met a state its prerequisites should have excluded,
/// e.g. a completed routing facet with a tile that has no routing box.
///
/// Mistakes in the fabric description are reported through their own error
/// types and never through this one.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// What was found.
    pub message: String,
}

impl InternalError {
    /// Wraps `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
