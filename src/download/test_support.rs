//! In-memory [`OrderCatalog`] and [`LedgerStore`] for exercising the
//! download engine.

use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};

use crate::catalog::client::ContentStream;
use crate::catalog::types::OrderDetail;
use crate::catalog::{CatalogEntry, CatalogError, CatalogPage, ContentTag, OrderCatalog};
use crate::ledger::error::LedgerError;
use crate::ledger::{Ledger, LedgerStore};

enum FakeContent {
    Complete(Vec<u8>),
    /// Yields the bytes, then a transport error.
    Broken(Vec<u8>),
}

pub struct FakeCatalog {
    title: Option<String>,
    detail_fails: bool,
    /// Index `n` serves page `n + 1`; `None` makes that fetch fail.
    pages: Vec<Option<CatalogPage>>,
    content: HashMap<String, FakeContent>,
    page_requests: Mutex<Vec<u32>>,
    content_requests: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            detail_fails: false,
            pages: Vec::new(),
            content: HashMap::new(),
            page_requests: Mutex::new(Vec::new()),
            content_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn untitled(mut self) -> Self {
        self.title = None;
        self
    }

    pub fn without_detail(mut self) -> Self {
        self.detail_fails = true;
        self
    }

    /// Append the next page, reporting `total_page` pages in the catalog.
    pub fn with_page(self, total_page: u32, entries: &[(&str, &str)]) -> Self {
        let page_no = self.pages.len() as u32 + 1;
        self.with_reported_page(page_no, total_page, entries)
    }

    /// Append the next page, but have the server claim it is `page_no`.
    pub fn with_reported_page(
        mut self,
        page_no: u32,
        total_page: u32,
        entries: &[(&str, &str)],
    ) -> Self {
        let entries = entries
            .iter()
            .map(|(fname, tag)| CatalogEntry {
                filename: fname.to_string(),
                tag: ContentTag::new(*tag).expect("non-empty tag"),
            })
            .collect();
        self.pages
            .push(Some(CatalogPage::new(page_no, total_page, entries)));
        self
    }

    /// Append a page whose fetch fails.
    pub fn with_failing_page(mut self) -> Self {
        self.pages.push(None);
        self
    }

    pub fn with_content(mut self, tag: &str, body: &[u8]) -> Self {
        self.content
            .insert(tag.to_string(), FakeContent::Complete(body.to_vec()));
        self
    }

    pub fn with_broken_content(mut self, tag: &str, body: &[u8]) -> Self {
        self.content
            .insert(tag.to_string(), FakeContent::Broken(body.to_vec()));
        self
    }

    pub fn page_requests(&self) -> Vec<u32> {
        self.page_requests.lock().unwrap().clone()
    }

    pub fn content_requests(&self) -> Vec<String> {
        self.content_requests.lock().unwrap().clone()
    }
}

fn fake_status(status: u16, url: String) -> CatalogError {
    CatalogError::HttpStatus { status, url }
}

#[async_trait::async_trait]
impl OrderCatalog for FakeCatalog {
    async fn fetch_detail(&self, order_id: &str) -> Result<OrderDetail, CatalogError> {
        if self.detail_fails {
            return Err(fake_status(503, format!("fake://detail/{}", order_id)));
        }
        Ok(OrderDetail {
            order_id: order_id.to_string(),
            title: self.title.clone(),
        })
    }

    async fn fetch_page(&self, order_id: &str, page_no: u32) -> Result<CatalogPage, CatalogError> {
        self.page_requests.lock().unwrap().push(page_no);
        let idx = page_no.checked_sub(1).map(|i| i as usize);
        match idx.and_then(|i| self.pages.get(i)) {
            Some(Some(page)) => Ok(page.clone()),
            _ => Err(fake_status(
                500,
                format!("fake://select-page/{}/{}", order_id, page_no),
            )),
        }
    }

    async fn fetch_content(&self, tag: &ContentTag) -> Result<ContentStream, CatalogError> {
        self.content_requests
            .lock()
            .unwrap()
            .push(tag.as_str().to_string());
        let url = format!("fake://content/{}", tag);
        match self.content.get(tag.as_str()) {
            Some(FakeContent::Complete(body)) => {
                let chunk: Result<Bytes, CatalogError> = Ok(Bytes::copy_from_slice(body));
                Ok(stream::iter(vec![chunk]).boxed())
            }
            Some(FakeContent::Broken(body)) => Ok(stream::iter(vec![
                Ok(Bytes::copy_from_slice(body)),
                Err(fake_status(502, url)),
            ])
            .boxed()),
            None => Err(fake_status(404, url)),
        }
    }
}

/// Ledger store that keeps the "persisted" ledger in memory.
#[derive(Default)]
pub struct MemoryLedgerStore {
    stored: Mutex<Ledger>,
    saves: Mutex<u32>,
}

impl MemoryLedgerStore {
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            stored: Mutex::new(ledger),
            saves: Mutex::new(0),
        }
    }

    pub fn stored(&self) -> Ledger {
        self.stored.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> u32 {
        *self.saves.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self) -> Ledger {
        self.stored()
    }

    async fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        *self.stored.lock().unwrap() = ledger.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}
