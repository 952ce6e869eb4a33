use thiserror::Error;

use crate::catalog::CatalogError;

/// Why a single photo could not be saved.
///
/// None of these abort a run: the photo is reported as failed and the engine
/// moves on.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] CatalogError),

    #[error("Disk error: {0}")]
    Disk(#[from] std::io::Error),

    #[error("Filename {0:?} has no usable characters")]
    InvalidFilename(String),

    #[error("{} is already used by another requested file", .0.display())]
    PathCollision(std::path::PathBuf),
}
