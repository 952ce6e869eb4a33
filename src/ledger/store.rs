//! Ledger persistence trait and JSON file implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::LedgerError;
use super::types::{Ledger, LedgerRecord};

/// Backing store for the [`Ledger`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the ledger. Best-effort: an absent or unreadable store yields an
    /// empty ledger instead of failing the run.
    async fn load(&self) -> Ledger;

    /// Overwrite the store with the full ledger.
    async fn save(&self, ledger: &Ledger) -> Result<(), LedgerError>;
}

/// Ledger kept as a pretty-printed JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the ledger is written to before being renamed into place.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "history.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_err(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl LedgerStore for JsonLedgerStore {
    async fn load(&self) -> Ledger {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Ledger {} does not exist, starting fresh", self.path.display());
                return Ledger::new();
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read ledger {}: {}. Starting with an empty ledger.",
                    self.path.display(),
                    e
                );
                return Ledger::new();
            }
        };

        match serde_json::from_str::<Vec<LedgerRecord>>(&contents) {
            Ok(records) => {
                let ledger = Ledger::from_records(records);
                tracing::debug!(
                    entries = ledger.len(),
                    "Loaded ledger from {}",
                    self.path.display()
                );
                ledger
            }
            Err(e) => {
                tracing::warn!(
                    "Ledger {} is corrupt ({}), starting with an empty ledger",
                    self.path.display(),
                    e
                );
                Ledger::new()
            }
        }
    }

    async fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(ledger.records())?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_err(e))?;
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, json)
            .await
            .map_err(|e| self.write_err(e))?;
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(self.write_err(e));
        }

        tracing::debug!(entries = ledger.len(), "Saved ledger to {}", self.path.display());
        Ok(())
    }
}
