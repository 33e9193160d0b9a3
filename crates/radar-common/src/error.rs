//! Error types for the radar object model.

use thiserror::Error;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Primary error type for object and metadata operations.
#[derive(Debug, Error)]
pub enum RadarError {
    // === Attribute Errors ===
    #[error("Invalid attribute name '{0}', expected 'group/name'")]
    InvalidAttributeName(String),

    #[error("Invalid value for attribute '{name}': {message}")]
    InvalidAttributeValue { name: String, message: String },

    // === Time Errors ===
    #[error("Invalid nominal date '{0}', expected YYYYMMDD")]
    InvalidDate(String),

    #[error("Invalid nominal time '{0}', expected HHmmss")]
    InvalidTime(String),

    // === Object Errors ===
    #[error("Failed to construct {type_name}: {message}")]
    Construction {
        type_name: &'static str,
        message: String,
    },

    #[error("Invalid projection definition: {0}")]
    InvalidProjection(String),
}

impl RadarError {
    /// Create an InvalidAttributeValue error.
    pub fn invalid_attribute(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttributeValue {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a Construction error.
    pub fn construction(type_name: &'static str, message: impl Into<String>) -> Self {
        Self::Construction {
            type_name,
            message: message.into(),
        }
    }
}
