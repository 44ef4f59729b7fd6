//! Error types for decoding order accounts

use thiserror::Error;

/// Why a buffer could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// Buffer length differs from the declared account size
    #[error("expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Option tag outside {0, 1}
    #[error("invalid option tag {tag} at offset {offset}")]
    InvalidOptionTag { offset: usize, tag: u8 },

    /// A field would read past the end of the buffer
    #[error("field '{field}' at offset {offset} needs {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// Decoder error type
///
/// A malformed buffer never becomes valid on retry, so callers should
/// surface this immediately and move on to the next record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed record: {0}")]
    MalformedRecord(#[from] MalformedReason),
}

impl DecodeError {
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        MalformedReason::LengthMismatch { expected, actual }.into()
    }

    pub fn invalid_option_tag(offset: usize, tag: u8) -> Self {
        MalformedReason::InvalidOptionTag { offset, tag }.into()
    }

    pub fn reason(&self) -> &MalformedReason {
        match self {
            DecodeError::MalformedRecord(reason) => reason,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, DecodeError::MalformedRecord(_))
    }
}

/// Result type alias for decoder operations
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DecodeError::length_mismatch(372, 371);
        assert_eq!(err.to_string(), "Malformed record: expected 372 bytes, got 371");

        let err = DecodeError::invalid_option_tag(248, 7);
        assert!(err.is_malformed());
        assert_eq!(
            err.reason(),
            &MalformedReason::InvalidOptionTag { offset: 248, tag: 7 }
        );
    }
}
