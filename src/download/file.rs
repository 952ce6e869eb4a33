use std::path::Path;

use futures_util::StreamExt;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::error::DownloadError;
use super::paths::part_path;
use crate::catalog::{ContentTag, OrderCatalog};

/// Fetch the content addressed by `tag` into `download_path`.
///
/// The body is streamed into a `.part` sibling created exclusively, then
/// renamed into place, so `download_path` only ever exists complete. Any
/// failure removes the `.part` file. Returns the number of bytes written.
pub async fn fetch_to_file<C: OrderCatalog + ?Sized>(
    catalog: &C,
    tag: &ContentTag,
    download_path: &Path,
) -> Result<u64, DownloadError> {
    let part_path = part_path(download_path);
    // A stale .part is left only by a killed process; start over.
    let _ = fs::remove_file(&part_path).await;

    let result = attempt_download(catalog, tag, download_path, &part_path).await;
    if result.is_err() {
        let _ = fs::remove_file(&part_path).await;
    }
    result
}

async fn attempt_download<C: OrderCatalog + ?Sized>(
    catalog: &C,
    tag: &ContentTag,
    download_path: &Path,
    part_path: &Path,
) -> Result<u64, DownloadError> {
    let mut stream = catalog.fetch_content(tag).await?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(part_path)
        .await?;

    let mut bytes_written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::warn!(
                "Body error for {} after {} bytes: {}",
                download_path.display(),
                bytes_written,
                e
            );
            e
        })?;
        file.write_all(&chunk).await?;
        bytes_written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    fs::rename(part_path, download_path).await?;
    Ok(bytes_written)
}
