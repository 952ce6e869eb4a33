use thiserror::Error;

/// Failures talking to the catalog API or the content host.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Malformed response from {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },
}
