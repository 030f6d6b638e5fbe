//! Error types for NitroGIS

use thiserror::Error;

/// Main error type for NitroGIS operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input data: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidParameter`].
    pub fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for NitroGIS operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message() {
        let err = Error::InvalidInput("missing bounding box".into());
        assert_eq!(err.to_string(), "Invalid input data: missing bounding box");
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = Error::invalid_parameter("cell_size", -1.0, "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid parameter: cell_size = -1 (must be positive)"
        );
    }
}
