//! Error types for usage-core

use thiserror::Error;

/// Main error type for the usage-core library
///
/// Analytics never fails the host application: the capability
/// implementations log these and carry on. Only configuration and logging
/// setup hand them back to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable property storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Network transport error
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for usage-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport error: connection refused");

        let err = Error::Storage("quota exceeded".to_string());
        assert_eq!(err.to_string(), "storage error: quota exceeded");
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(Error::from(json_err), Error::Json(_)));
    }
}
