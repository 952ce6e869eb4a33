//! Sync engine. Walks an order's catalog page by page, matches entries
//! against the requested filenames, and downloads each match at most once.
//!
//! Two traversal policies share the same page walker:
//! - [`SyncPolicy::EarlyStop`] matches while paging, stops as soon as every
//!   requested name has been seen, and persists the download ledger;
//! - [`SyncPolicy::FullScan`] pages through the whole catalog writing an
//!   audit log, then downloads the requested names it found.

pub mod audit;
pub mod error;
pub mod file;
pub mod paths;
#[cfg(test)]
pub(crate) mod test_support;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::catalog::{CatalogEntry, CatalogPage, ContentTag, OrderCatalog};
use crate::ledger::{Ledger, LedgerStore};
use crate::types::SyncPolicy;

use audit::AuditLog;
use error::DownloadError;

/// Everything one sync run needs, decoupled from CLI parsing.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub(crate) order_id: String,
    pub(crate) requested: BTreeSet<String>,
    pub(crate) policy: SyncPolicy,
    pub(crate) download_root: PathBuf,
    pub(crate) fallback_dir_name: String,
    pub(crate) audit_path: PathBuf,
}

/// What happened to one requested filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The destination file was already on disk; nothing was fetched.
    AlreadyDownloaded(PathBuf),
    Saved(PathBuf),
    Failed(String),
    /// No catalog entry carried this filename.
    NotFound,
}

#[derive(Debug)]
pub struct SyncReport {
    pub destination: PathBuf,
    /// Exactly one outcome per requested filename.
    pub outcomes: BTreeMap<String, FileOutcome>,
    pub pages_fetched: u32,
    /// A page fetch failed before the walk finished.
    pub traversal_aborted: bool,
    /// `None` when the policy keeps no ledger.
    pub ledger_saved: Option<bool>,
    pub elapsed: Duration,
}

impl SyncReport {
    fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            outcomes: BTreeMap::new(),
            pages_fetched: 0,
            traversal_aborted: false,
            ledger_saved: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.values().filter(|o| pred(*o)).count()
    }

    /// One status line per requested filename, for stdout.
    pub fn status_lines(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .map(|(name, outcome)| match outcome {
                FileOutcome::AlreadyDownloaded(_) => format!("{}: already downloaded", name),
                FileOutcome::Saved(path) => format!("saved to {}", path.display()),
                FileOutcome::Failed(reason) => format!("failed to download {}: {}", name, reason),
                FileOutcome::NotFound => format!("{}: not found", name),
            })
            .collect()
    }
}

/// Walks catalog pages in increasing order until the last page or the first
/// failed fetch.
struct PageWalker<'a, C: ?Sized> {
    catalog: &'a C,
    order_id: &'a str,
    next: Option<u32>,
    fetched: u32,
    aborted: bool,
}

impl<'a, C: OrderCatalog + ?Sized> PageWalker<'a, C> {
    fn new(catalog: &'a C, order_id: &'a str) -> Self {
        Self {
            catalog,
            order_id,
            next: Some(1),
            fetched: 0,
            aborted: false,
        }
    }

    async fn next_page(&mut self) -> Option<CatalogPage> {
        let page_no = self.next.take()?;
        match self.catalog.fetch_page(self.order_id, page_no).await {
            Ok(page) => {
                self.fetched += 1;
                // Never step backwards, even if the server echoes an older page number.
                let current = page.page_no.max(page_no);
                if current < page.total_page {
                    self.next = Some(current + 1);
                }
                tracing::info!(
                    page_no = current,
                    total_page = page.total_page,
                    entries = page.entries.len(),
                    "Fetched catalog page"
                );
                Some(page)
            }
            Err(e) => {
                tracing::warn!("Request for page {} failed, stopping traversal: {}", page_no, e);
                self.aborted = true;
                None
            }
        }
    }
}

/// Entry point for the sync engine.
///
/// Fails only when the run cannot start: the order detail can't be fetched
/// or the destination directory can't be created. Page and download
/// failures are reported per filename in the returned [`SyncReport`].
pub async fn sync_order<C, S>(catalog: &C, ledger_store: &S, config: &SyncConfig) -> Result<SyncReport>
where
    C: OrderCatalog + ?Sized,
    S: LedgerStore + ?Sized,
{
    let started = Instant::now();

    let detail = catalog
        .fetch_detail(&config.order_id)
        .await
        .with_context(|| format!("Failed to fetch order detail for {}", config.order_id))?;
    let title = detail.title_or(&config.fallback_dir_name);
    let destination =
        paths::order_directory(&config.download_root, title, &config.fallback_dir_name);
    tokio::fs::create_dir_all(&destination)
        .await
        .with_context(|| {
            format!(
                "Failed to create download directory {}",
                destination.display()
            )
        })?;
    tracing::info!(
        order_id = %config.order_id,
        title,
        destination = %destination.display(),
        "Resolved order"
    );

    let mut report = SyncReport::new(destination);
    if config.requested.is_empty() {
        tracing::info!("No filenames requested, nothing to do");
        return Ok(report);
    }

    match config.policy {
        SyncPolicy::EarlyStop => {
            early_stop(catalog, ledger_store, config, title, &mut report).await;
        }
        SyncPolicy::FullScan => full_scan(catalog, config, &mut report).await,
    }

    for name in &config.requested {
        report
            .outcomes
            .entry(name.clone())
            .or_insert(FileOutcome::NotFound);
    }
    report.elapsed = started.elapsed();

    tracing::info!("── Summary ──");
    tracing::info!(
        "  {} saved, {} already downloaded, {} failed, {} not found",
        report.count(|o| matches!(o, FileOutcome::Saved(_))),
        report.count(|o| matches!(o, FileOutcome::AlreadyDownloaded(_))),
        report.count(|o| matches!(o, FileOutcome::Failed(_))),
        report.count(|o| matches!(o, FileOutcome::NotFound)),
    );
    tracing::info!(
        "  {} pages fetched in {}",
        report.pages_fetched,
        format_duration(report.elapsed)
    );

    Ok(report)
}

/// Match while paging; the first entry carrying a requested filename
/// consumes it, whatever the download outcome.
async fn early_stop<C, S>(
    catalog: &C,
    ledger_store: &S,
    config: &SyncConfig,
    title: &str,
    report: &mut SyncReport,
) where
    C: OrderCatalog + ?Sized,
    S: LedgerStore + ?Sized,
{
    let mut ledger = ledger_store.load().await;
    let mut targets: HashSet<&str> = config.requested.iter().map(String::as_str).collect();
    let mut claimed = HashSet::new();
    let mut walker = PageWalker::new(catalog, &config.order_id);

    while !targets.is_empty() {
        let Some(page) = walker.next_page().await else {
            break;
        };
        for entry in page.entries {
            if !targets.remove(entry.filename.as_str()) {
                continue;
            }
            let outcome = resolve_match(
                catalog,
                &mut ledger,
                &mut claimed,
                &config.order_id,
                title,
                &report.destination,
                &entry,
            )
            .await;
            report.outcomes.insert(entry.filename, outcome);
        }
    }
    report.pages_fetched = walker.fetched;
    report.traversal_aborted = walker.aborted;

    match ledger_store.save(&ledger).await {
        Ok(()) => report.ledger_saved = Some(true),
        Err(e) => {
            tracing::error!("Failed to save ledger: {}", e);
            report.ledger_saved = Some(false);
        }
    }
}

/// Skip an entry whose file is already on disk, otherwise download it and
/// note it in the ledger.
async fn resolve_match<C: OrderCatalog + ?Sized>(
    catalog: &C,
    ledger: &mut Ledger,
    claimed: &mut HashSet<PathBuf>,
    order_id: &str,
    title: &str,
    directory: &Path,
    entry: &CatalogEntry,
) -> FileOutcome {
    let path = match claim_path(claimed, directory, &entry.filename) {
        Ok(path) => path,
        Err(e) => return failed(&entry.filename, e),
    };

    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::info!("{} already downloaded, skipping", path.display());
        return FileOutcome::AlreadyDownloaded(path);
    }

    if ledger.contains(order_id, &entry.tag) {
        tracing::debug!(tag = %entry.tag, "In ledger but missing on disk, downloading again");
    }

    match download_entry(catalog, &entry.tag, &path).await {
        Ok(()) => {
            if !ledger.record(order_id, title, entry.tag.clone(), &entry.filename) {
                tracing::debug!(tag = %entry.tag, "Ledger already has this tag");
            }
            FileOutcome::Saved(path)
        }
        Err(e) => failed(&entry.filename, e),
    }
}

/// Page through the whole catalog, then download every requested name that
/// was seen. No on-disk check: found names are always fetched.
async fn full_scan<C: OrderCatalog + ?Sized>(
    catalog: &C,
    config: &SyncConfig,
    report: &mut SyncReport,
) {
    let mut audit = match AuditLog::create(&config.audit_path).await {
        Ok(log) => Some(log),
        Err(e) => {
            tracing::warn!(
                "Could not create audit log {}: {}",
                config.audit_path.display(),
                e
            );
            None
        }
    };

    let mut found: HashMap<String, ContentTag> = HashMap::new();
    let mut walker = PageWalker::new(catalog, &config.order_id);
    while let Some(page) = walker.next_page().await {
        let write_err = match audit.as_mut() {
            Some(log) => log.append_page(&config.order_id, &page).await.err(),
            None => None,
        };
        if let Some(e) = write_err {
            if let Some(log) = audit.take() {
                tracing::warn!(
                    "Failed to write audit log {}, disabling it: {}",
                    log.path().display(),
                    e
                );
            }
        }
        for entry in page.entries {
            found.entry(entry.filename).or_insert(entry.tag);
        }
    }
    report.pages_fetched = walker.fetched;
    report.traversal_aborted = walker.aborted;
    tracing::info!(entries = found.len(), "Catalog scan finished");

    let mut claimed = HashSet::new();
    for name in &config.requested {
        let Some(tag) = found.get(name) else {
            continue;
        };
        let outcome = match claim_path(&mut claimed, &report.destination, name) {
            Err(e) => failed(name, e),
            Ok(path) => match download_entry(catalog, tag, &path).await {
                Ok(()) => FileOutcome::Saved(path),
                Err(e) => failed(name, e),
            },
        };
        report.outcomes.insert(name.clone(), outcome);
    }
}

/// Resolve where `filename` is saved, refusing a path another requested
/// name already took this run.
fn claim_path(
    claimed: &mut HashSet<PathBuf>,
    directory: &Path,
    filename: &str,
) -> Result<PathBuf, DownloadError> {
    let path = paths::local_download_path(directory, filename)
        .ok_or_else(|| DownloadError::InvalidFilename(filename.to_string()))?;
    if !claimed.insert(path.clone()) {
        return Err(DownloadError::PathCollision(path));
    }
    Ok(path)
}

async fn download_entry<C: OrderCatalog + ?Sized>(
    catalog: &C,
    tag: &ContentTag,
    path: &Path,
) -> Result<(), DownloadError> {
    tracing::debug!(tag = %tag, path = %path.display(), "downloading");
    let size_bytes = file::fetch_to_file(catalog, tag, path).await?;
    tracing::info!(size_bytes, "Saved {}", path.display());
    Ok(())
}

fn failed(filename: &str, e: DownloadError) -> FileOutcome {
    tracing::warn!("Failed to download {}: {}", filename, e);
    FileOutcome::Failed(e.to_string())
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
