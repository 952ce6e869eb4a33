/// Directory and ledger title used when an order detail carries no title.
pub const DEFAULT_TITLE: &str = "album";

/// Opaque identifier of one binary object in the remote store (the "etag").
///
/// A tag has two uses, and both go through this type:
/// - identity: the ledger keys downloads by `(order id, tag)`;
/// - locator: the content host serves the object at `<content base>/<tag>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentTag(String);

impl ContentTag {
    /// Wrap a raw tag. Empty tags address nothing and are rejected.
    pub fn new(tag: impl Into<String>) -> Option<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            None
        } else {
            Some(Self(tag))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Download URL of this object on the given content host.
    pub fn locator(&self, content_base: &str) -> String {
        format!("{}/{}", content_base.trim_end_matches('/'), self.0)
    }
}

impl std::fmt::Display for ContentTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One photo listed on a catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub filename: String,
    pub tag: ContentTag,
}

/// One page of an order's photo listing. Pages are 1-indexed and
/// `page_no <= total_page` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage {
    pub page_no: u32,
    pub total_page: u32,
    pub entries: Vec<CatalogEntry>,
}

impl CatalogPage {
    /// Build a page, raising `total_page` to `page_no` if the server reported
    /// a smaller total.
    pub fn new(page_no: u32, total_page: u32, entries: Vec<CatalogEntry>) -> Self {
        Self {
            page_no,
            total_page: total_page.max(page_no),
            entries,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetail {
    pub order_id: String,
    pub title: Option<String>,
}

impl OrderDetail {
    /// Title recorded in the ledger and used to name the destination
    /// directory. An untitled order takes `fallback`, so the directory can be
    /// rebuilt from the ledger alone.
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_tag_rejects_empty() {
        assert!(ContentTag::new("").is_none());
        assert_eq!(ContentTag::new("T1").unwrap().as_str(), "T1");
    }

    #[test]
    fn test_content_tag_locator() {
        let tag = ContentTag::new("Fh3kq9").unwrap();
        assert_eq!(
            tag.locator("https://c360-o2o.c360dn.com"),
            "https://c360-o2o.c360dn.com/Fh3kq9"
        );
        assert_eq!(tag.locator("http://127.0.0.1:9000/"), "http://127.0.0.1:9000/Fh3kq9");
    }

    #[test]
    fn test_page_total_never_below_page_no() {
        let page = CatalogPage::new(3, 1, Vec::new());
        assert_eq!(page.total_page, 3);
        assert_eq!(CatalogPage::new(1, 2, Vec::new()).total_page, 2);
    }

    #[test]
    fn test_title_or_fallback() {
        let mut detail = OrderDetail {
            order_id: "O1".into(),
            title: None,
        };
        assert_eq!(detail.title_or(DEFAULT_TITLE), "album");
        assert_eq!(detail.title_or("photos"), "photos");
        detail.title = Some("Wedding".into());
        assert_eq!(detail.title_or("photos"), "Wedding");
    }
}
