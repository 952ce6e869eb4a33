use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::endpoints::Endpoints;
use super::error::CatalogError;
use super::responses::{OrderDetailResponse, SelectPageResponse};
use super::types::{CatalogEntry, CatalogPage, ContentTag, OrderDetail};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148 MicroMessenger/8.0.40";

/// Raw body of one content object, chunk by chunk.
pub type ContentStream = Pin<Box<dyn Stream<Item = Result<Bytes, CatalogError>> + Send>>;

/// Read access to an order's catalog, detail and content.
///
/// Every call is a single attempt; callers decide what a failure means.
#[async_trait::async_trait]
pub trait OrderCatalog: Send + Sync {
    /// Resolve the order's metadata (title).
    async fn fetch_detail(&self, order_id: &str) -> Result<OrderDetail, CatalogError>;

    /// Fetch one page of the order's photo listing. `page_no` starts at 1.
    async fn fetch_page(&self, order_id: &str, page_no: u32) -> Result<CatalogPage, CatalogError>;

    /// Open the binary content addressed by `tag`.
    async fn fetch_content(&self, tag: &ContentTag) -> Result<ContentStream, CatalogError>;
}

/// [`OrderCatalog`] over the public HTTP API. Requests are unauthenticated.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    endpoints: Endpoints,
}

impl HttpCatalog {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, CatalogError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        let client = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, endpoints })
    }

    /// POST a form and decode the JSON body.
    async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        debug!("POST {}", url);
        let response = self.client.post(url).form(form).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| CatalogError::Json {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait::async_trait]
impl OrderCatalog for HttpCatalog {
    async fn fetch_detail(&self, order_id: &str) -> Result<OrderDetail, CatalogError> {
        let resp: OrderDetailResponse = self
            .post_form(&self.endpoints.order_detail, &[("orderId", order_id)])
            .await?;
        Ok(OrderDetail {
            order_id: order_id.to_string(),
            title: resp.data.and_then(|d| d.title),
        })
    }

    async fn fetch_page(&self, order_id: &str, page_no: u32) -> Result<CatalogPage, CatalogError> {
        let page_str = page_no.to_string();
        let resp: SelectPageResponse = self
            .post_form(
                &self.endpoints.select_page,
                &[
                    ("orderId", order_id),
                    ("tagId", ""),
                    ("sortType", "desc"),
                    ("sortField", "createDateTime"),
                    ("pageNo", &page_str),
                ],
            )
            .await?;

        let data = resp.data;
        let reported_page = data.page_no.unwrap_or(page_no);
        let total_page = data.total_page.unwrap_or(reported_page);

        let mut entries = Vec::with_capacity(data.result.len());
        for item in data.result {
            if item.fname.is_empty() {
                continue;
            }
            match ContentTag::new(item.etag) {
                Some(tag) => entries.push(CatalogEntry {
                    filename: item.fname,
                    tag,
                }),
                None => tracing::warn!("Catalog entry {} has no etag, skipping", item.fname),
            }
        }

        debug!(
            order_id,
            page_no = reported_page,
            total_page,
            entries = entries.len(),
            "fetched catalog page"
        );
        Ok(CatalogPage::new(reported_page, total_page, entries))
    }

    async fn fetch_content(&self, tag: &ContentTag) -> Result<ContentStream, CatalogError> {
        let url = tag.locator(&self.endpoints.content_base);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response.bytes_stream().map(|chunk| chunk.map_err(CatalogError::from)).boxed())
    }
}
