//! Error types for dmcp.

use thiserror::Error;

/// Error type for dmcp operations.
#[derive(Debug, Error)]
pub enum DmcpError {
    /// An argument of the wrong kind was passed (e.g. a non-variable in a fix list).
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// A variable marked as fixed has no parameter to replace it with.
    #[error("No parameter was synthesized for fixed variable {id}")]
    MissingSubstitution { id: u64 },

    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Problem is not DCP-compliant.
    #[error("Problem is not DCP: {0}")]
    NotDcp(String),
}

/// Result type for dmcp operations.
pub type Result<T> = std::result::Result<T, DmcpError>;
