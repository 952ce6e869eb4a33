//! Types for the download ledger.
//!
//! Field names follow the on-disk `history.json` layout:
//! `[{"orderid": ..., "title": ..., "files": [{"etag": ..., "fname": ...}]}]`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::ContentTag;

/// One downloaded object of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFile {
    #[serde(default)]
    pub etag: String,
    #[serde(default)]
    pub fname: String,
}

/// Everything downloaded for one order, across all runs, in download order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(rename = "orderid")]
    pub order_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub files: Vec<LedgerFile>,
}

/// Cross-run record of downloads, keyed by order.
///
/// Holds at most one [`LedgerRecord`] per order plus a derived set of
/// `(order id, tag)` pairs so membership checks stay O(1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<LedgerRecord>,
    seen: HashSet<(String, ContentTag)>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from stored records, merging records that share an
    /// order id and dropping repeated or empty tags.
    pub fn from_records(records: Vec<LedgerRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            ledger.ensure_record(&record.order_id, &record.title);
            for file in record.files {
                if let Some(tag) = ContentTag::new(file.etag) {
                    ledger.record(&record.order_id, &record.title, tag, &file.fname);
                }
            }
        }
        ledger
    }

    pub fn contains(&self, order_id: &str, tag: &ContentTag) -> bool {
        // HashSet<(String, ContentTag)> can't be probed with borrowed parts.
        self.seen.contains(&(order_id.to_string(), tag.clone()))
    }

    /// Note that `tag` was downloaded as `filename` for `order_id`.
    ///
    /// A pair already present is left alone. Returns whether the ledger changed.
    pub fn record(&mut self, order_id: &str, title: &str, tag: ContentTag, filename: &str) -> bool {
        if !self.seen.insert((order_id.to_string(), tag.clone())) {
            return false;
        }
        let idx = self.ensure_record(order_id, title);
        self.records[idx].files.push(LedgerFile {
            etag: tag.as_str().to_string(),
            fname: filename.to_string(),
        });
        true
    }

    pub fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    pub fn record_for(&self, order_id: &str) -> Option<&LedgerRecord> {
        self.records.iter().find(|r| r.order_id == order_id)
    }

    /// Number of recorded downloads across all orders.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn ensure_record(&mut self, order_id: &str, title: &str) -> usize {
        if let Some(idx) = self.records.iter().position(|r| r.order_id == order_id) {
            return idx;
        }
        self.records.push(LedgerRecord {
            order_id: order_id.to_string(),
            title: title.to_string(),
            files: Vec::new(),
        });
        self.records.len() - 1
    }
}
