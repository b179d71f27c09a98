//! Error types for wire-level parsing.

use thiserror::Error;

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised when raw link bytes do not form a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Digit outside `1..=9`.
    #[error("digit {value} is outside 1..=9")]
    DigitOutOfRange {
        /// Offending value
        value: u8,
    },

    /// Credential byte at `position` is not a valid digit.
    #[error("credential byte {position} is {value:#04x}, expected a digit in 1..=9")]
    InvalidCredentialDigit {
        /// Zero-based index within the credential
        position: usize,
        /// Offending byte
        value: u8,
    },

    /// Credential built from the wrong number of digits.
    #[error("credential needs {expected} digits, got {actual}")]
    InvalidLength {
        /// Required digit count
        expected: usize,
        /// Supplied digit count
        actual: usize,
    },

    /// Character in a decimal credential that is not a digit.
    #[error("{character:?} is not a decimal digit")]
    NotADigit {
        /// Offending character
        character: char,
    },

    /// Byte outside the control vocabulary.
    #[error("unknown control byte {0:#04x}")]
    UnknownControlByte(u8),

    /// Stored record too short to hold a credential.
    #[error("record needs {expected} bytes, got {actual}")]
    TruncatedRecord {
        /// Record size
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },
}
