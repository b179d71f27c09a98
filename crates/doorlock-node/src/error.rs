//! Node runtime errors.

use std::{io, path::PathBuf};

use doorlock_core::StoreError;
use thiserror::Error;

/// Errors that stop a node runtime.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Link transport failed.
    #[error("link I/O failed: {0}")]
    Link(#[from] io::Error),

    /// Peer closed the link.
    #[error("link closed by peer")]
    LinkClosed,

    /// Credential store failed.
    #[error("credential store: {0}")]
    Store(#[from] StoreError),

    /// Store image could not be opened.
    #[error("store image {path}: {source}")]
    StoreImage {
        /// Image file
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: io::Error,
    },

    /// Configuration file could not be read or parsed.
    #[error("config {path}: {reason}")]
    Config {
        /// Config file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
}
