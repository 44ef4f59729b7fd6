//! Error types for the order scanner

use limit_order_core::DecodeError;
use thiserror::Error;

/// Main scanner error type
#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Decode error for {address}: {source}")]
    Decode {
        address: String,
        source: DecodeError,
    },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid account data for {address}: {reason}")]
    InvalidAccountData { address: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScannerError {
    /// Transport failures may succeed on retry; bad data never does
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScannerError::Network(_) | ScannerError::Rpc { .. })
    }
}

/// Result type alias for scanner operations
pub type ScannerResult<T> = Result<T, ScannerError>;

impl From<ureq::Error> for ScannerError {
    fn from(err: ureq::Error) -> Self {
        ScannerError::Network(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ScannerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ScannerError::Network(format!("RPC task failed: {}", err))
    }
}

impl From<serde_json::Error> for ScannerError {
    fn from(err: serde_json::Error) -> Self {
        ScannerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ScannerError {
    fn from(err: toml::de::Error) -> Self {
        ScannerError::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for ScannerError {
    fn from(err: toml::ser::Error) -> Self {
        ScannerError::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ScannerError {
    fn from(err: validator::ValidationErrors) -> Self {
        ScannerError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ScannerError::Network("reset".into()).is_retryable());
        assert!(ScannerError::Rpc {
            code: -32005,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!ScannerError::Decode {
            address: "x".into(),
            source: DecodeError::length_mismatch(372, 0),
        }
        .is_retryable());
    }
}
