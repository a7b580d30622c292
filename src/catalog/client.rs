use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::model::{AudioBytes, TrackDescriptor};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid API base address {0:?}")]
    InvalidBaseUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(StatusCode),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The remote catalog as seen by the player.
pub trait Catalog: Send + Sync {
    /// Run a search. Non-2xx answers are errors.
    fn search(&self, query: &str) -> Result<Vec<TrackDescriptor>, CatalogError>;

    /// Resolve the stream (and download) address for a track id.
    fn stream_url(&self, id: &str) -> String;

    /// Fetch a whole audio payload from a stream address.
    fn fetch_audio(&self, url: &str) -> Result<AudioBytes, CatalogError>;
}

/// `Catalog` backed by the HTTP API at a single configurable base address.
pub struct HttpCatalog {
    base: Url,
    client: Client,
}

impl HttpCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let base = parse_base_url(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl Catalog for HttpCatalog {
    fn search(&self, query: &str) -> Result<Vec<TrackDescriptor>, CatalogError> {
        let url = search_url(&self.base, query);
        debug!(%url, "catalog search");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }
        let body = response.bytes()?;
        parse_search_response(&body)
    }

    fn stream_url(&self, id: &str) -> String {
        stream_url(&self.base, id).to_string()
    }

    fn fetch_audio(&self, url: &str) -> Result<AudioBytes, CatalogError> {
        debug!(url, "fetching audio");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes()?.to_vec();
        Ok(AudioBytes {
            bytes,
            content_type,
        })
    }
}

/// Parse and sanity-check the API base address.
pub fn parse_base_url(base_url: &str) -> Result<Url, CatalogError> {
    let url = Url::parse(base_url.trim())
        .map_err(|_| CatalogError::InvalidBaseUrl(base_url.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(CatalogError::InvalidBaseUrl(base_url.to_string()));
    }
    Ok(url)
}

/// `{base}/search?query=<urlencoded>`
pub fn search_url(base: &Url, query: &str) -> Url {
    let mut url = join_segments(base, &["search"]);
    url.query_pairs_mut().append_pair("query", query);
    url
}

/// `{base}/get_audio/{id}`
pub fn stream_url(base: &Url, id: &str) -> Url {
    join_segments(base, &["get_audio", id])
}

fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    // Bases are validated to be hierarchical, so this cannot fail.
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

pub fn parse_search_response(body: &[u8]) -> Result<Vec<TrackDescriptor>, CatalogError> {
    Ok(serde_json::from_slice(body)?)
}
