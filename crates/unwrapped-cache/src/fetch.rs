//! Network fetcher trait - allows swapping the live HTTP client for a
//! scripted one in tests.

use crate::response::StoredResponse;

#[derive(Debug, thiserror::Error)]
#[error("fetch failed: {0}")]
pub struct FetchError(pub String);

/// One best-effort GET. Implementations must not retry; the caller decides
/// what a failure degrades to.
pub trait Fetcher: Send {
    fn fetch(&self, url: &str) -> Result<StoredResponse, FetchError>;
}

impl<T: Fetcher + Sync> Fetcher for std::sync::Arc<T> {
    fn fetch(&self, url: &str) -> Result<StoredResponse, FetchError> {
        (**self).fetch(url)
    }
}

/// Live fetcher over `ureq`.
#[derive(Debug, Default)]
pub struct UreqFetcher;

impl Fetcher for UreqFetcher {
    fn fetch(&self, url: &str) -> Result<StoredResponse, FetchError> {
        let mut resp = ureq::get(url)
            .call()
            .map_err(|e| FetchError(e.to_string()))?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_owned();
        let body = resp
            .body_mut()
            .read_to_vec()
            .map_err(|e| FetchError(e.to_string()))?;
        Ok(StoredResponse::new(status, content_type, body))
    }
}
