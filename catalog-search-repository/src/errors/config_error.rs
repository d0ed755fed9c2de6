//! Connection descriptor error types.

use thiserror::Error;

/// Errors raised while turning a connection descriptor into a handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The descriptor is not a valid URI.
    #[error("Failed to parse URI, {0}")]
    InvalidDescriptor(String),

    /// An option carried a value outside its domain.
    #[error("Invalid ?{name}= parameter {value:?}: {reason}")]
    InvalidOption {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A required option was not supplied.
    #[error("Missing required ?{0}= parameter")]
    MissingOption(&'static str),

    /// No backend is registered under the descriptor's scheme.
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),
}

impl ConfigError {
    /// Create an invalid option error.
    pub fn invalid_option(
        name: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            name,
            value: value.into(),
            reason: reason.into(),
        }
    }
}
