//! Error types for the download ledger.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while persisting the ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to write or rename the backing file.
    #[error("Failed to write ledger to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize the ledger.
    #[error("Failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}
