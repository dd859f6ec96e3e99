//! Error types for annotation engine operations.

use thiserror::Error;

/// Errors raised by the coordinate transform, format codec, detection store
/// and export sinks.
///
/// Looking up an unknown detection ID is deliberately absent: update and
/// delete of a missing ID are no-ops, not failures.
#[derive(Error, Debug)]
pub enum AnnotationError {
    /// Malformed numeric input (non-finite coordinates, non-positive sizes,
    /// unparsable tokens)
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the offending value
        message: String,
    },

    /// Operation needs input that is not there (no detections to export,
    /// no image dimensions to decode against)
    #[error("Empty input: {message}")]
    EmptyInput {
        /// Description of what was missing
        message: String,
    },

    /// Coordinate transform requested before the image size is known
    #[error("Image not loaded: natural size is zero or unknown")]
    ImageNotLoaded,

    /// I/O error while handing a payload to a sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Detector payload could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnnotationError {
    /// Create a validation error with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an empty input error with a message.
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: message.into(),
        }
    }

    /// Check whether this is a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check whether this is an empty input failure.
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput { .. })
    }
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, AnnotationError>;

/// Fail with a validation error unless `value` is finite.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnnotationError::validation(format!(
            "{name} must be a finite number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite("x1", 3.5).unwrap(), 3.5);
        assert!(ensure_finite("x1", f64::NAN).unwrap_err().is_validation());
        assert!(ensure_finite("x1", f64::INFINITY).unwrap_err().is_validation());
    }

    #[test]
    fn test_messages() {
        let err = AnnotationError::empty_input("no detections");
        assert!(err.is_empty_input());
        assert_eq!(err.to_string(), "Empty input: no detections");
        assert_eq!(
            AnnotationError::validation("bad").to_string(),
            "Validation error: bad"
        );
    }
}
