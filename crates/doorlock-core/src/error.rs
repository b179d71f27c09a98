//! Error types for credential storage.

use thiserror::Error;

/// Errors from a [`CredentialStore`](crate::store::CredentialStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Address beyond the end of the device.
    #[error("address {addr:#06x} out of range (capacity {capacity} bytes)")]
    OutOfRange {
        /// Requested address
        addr: u16,
        /// Device size in bytes
        capacity: usize,
    },

    /// Underlying device failed.
    #[error("store I/O failed: {reason}")]
    Io {
        /// Device-specific description
        reason: String,
    },
}
