//! Unified error handling for the towertrace library.
//!
//! Degenerate data conditions (a device with no sightings, a tower set with
//! no coordinates, a disconnected event graph) are represented in the result
//! model, not here; this type covers conditions a caller must act on:
//! invalid configuration, unparseable input, internal invariant breaks.

use std::fmt;

/// Unified error type for towertrace operations.
#[derive(Debug, Clone)]
pub enum InferenceError {
    /// A threshold or weight failed startup validation.
    ConfigError { message: String },
    /// A record's timestamp could not be parsed; the record is excluded but
    /// the rest of the device's sightings continue processing.
    MalformedTimestamp { device_id: String, raw: String },
    /// A device had zero sightings after normalization.
    EmptyInput { device_id: String },
    /// Generic internal error.
    Internal { message: String },
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            InferenceError::MalformedTimestamp { device_id, raw } => {
                write!(
                    f,
                    "Device '{}' has unparseable timestamp '{}'",
                    device_id, raw
                )
            }
            InferenceError::EmptyInput { device_id } => {
                write!(f, "Device '{}' has no usable sightings", device_id)
            }
            InferenceError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for InferenceError {}

/// Result type alias for towertrace operations.
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Extension trait for converting Option to InferenceError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an empty-input error.
    fn ok_or_empty_input(self, device_id: &str) -> Result<T>;

    /// Convert Option to Result with a generic internal error.
    fn ok_or_internal(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_empty_input(self, device_id: &str) -> Result<T> {
        self.ok_or_else(|| InferenceError::EmptyInput {
            device_id: device_id.to_string(),
        })
    }

    fn ok_or_internal(self, message: &str) -> Result<T> {
        self.ok_or_else(|| InferenceError::Internal {
            message: message.to_string(),
        })
    }
}
