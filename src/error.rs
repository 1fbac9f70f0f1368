//! Error types for config-mask
//!
//! Sanitation never fails; these errors only come out of loading a
//! configuration from JSON and from the optional schema check.

use thiserror::Error;

/// Errors that can occur while authoring or loading a mask configuration
#[derive(Debug, Error)]
pub enum MaskError {
    /// A configuration field has the wrong shape
    #[error("Invalid configuration at '{path}': {reason}")]
    InvalidConfig {
        path: String,
        reason: String,
    },

    /// The configuration parsed, but describes a schema that cannot work
    #[error("Schema error at '{path}': {reason}")]
    Schema {
        path: String,
        reason: String,
    },

    /// JSON text could not be parsed
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MaskError {
    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, MaskError>;
