//! Error types for polar data operations.

use radar_common::RadarError;
use thiserror::Error;

/// Errors that can occur while building or modifying polar data.
#[derive(Error, Debug)]
pub enum PolarDataError {
    /// A parameter does not fit the geometry already fixed on the scan.
    #[error("parameter '{quantity}' is {actual:?} (nbins, nrays) but the scan is {expected:?}")]
    GeometryMismatch {
        quantity: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A parameter without a quantity cannot be keyed.
    #[error("parameter has no quantity")]
    MissingQuantity,

    /// Raster data of the wrong size (samples, or bytes for raw buffers).
    #[error("data length mismatch: expected {expected}, got {actual}")]
    DataLength { expected: usize, actual: usize },

    /// An empty or otherwise unusable default parameter name.
    #[error("invalid default parameter '{0}'")]
    InvalidDefaultParameter(String),

    /// Attribute, time or projection error from the object model.
    #[error(transparent)]
    Common(#[from] RadarError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A quality control pass failed.
    #[error("quality control '{task}' failed: {message}")]
    QualityControl { task: String, message: String },

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(String),

    /// Storage/IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl PolarDataError {
    /// Create a DataLength error.
    pub fn data_length(expected: usize, actual: usize) -> Self {
        Self::DataLength { expected, actual }
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a QualityControl error.
    pub fn quality_control(task: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::QualityControl {
            task: task.into(),
            message: msg.into(),
        }
    }
}

impl From<std::io::Error> for PolarDataError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for PolarDataError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err.to_string())
    }
}

/// Result type for polar data operations.
pub type Result<T> = std::result::Result<T, PolarDataError>;
