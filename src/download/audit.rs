//! Flat log of every catalog entry seen by a full scan.
//!
//! One JSON object per line; the file is truncated at the start of each run.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::catalog::CatalogPage;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditLine<'a> {
    order_id: &'a str,
    page_no: u32,
    total_page: u32,
    fname: &'a str,
    etag: &'a str,
}

pub struct AuditLog {
    path: PathBuf,
    file: File,
}

impl AuditLog {
    /// Create (or truncate) the audit log at `path`.
    pub async fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append every entry of `page` and flush.
    pub async fn append_page(&mut self, order_id: &str, page: &CatalogPage) -> std::io::Result<()> {
        let mut buf = Vec::new();
        for entry in &page.entries {
            let line = AuditLine {
                order_id,
                page_no: page.page_no,
                total_page: page.total_page,
                fname: &entry.filename,
                etag: entry.tag.as_str(),
            };
            serde_json::to_writer(&mut buf, &line)?;
            buf.push(b'\n');
        }
        self.file.write_all(&buf).await?;
        self.file.flush().await
    }
}
