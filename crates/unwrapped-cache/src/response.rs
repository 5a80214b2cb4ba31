//! Cached response bodies and the synthesized offline fallbacks.

/// A response as held by the cache: status line, content type and raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl StoredResponse {
    pub fn new(status: u16, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
        }
    }

    /// Synthesized 503 served when a network-first fetch fails with nothing
    /// cached to fall back on.
    pub fn offline() -> Self {
        Self::new(
            503,
            "text/plain",
            b"Offline - Unable to fetch resource".to_vec(),
        )
    }

    /// Empty 503 served when a cache-first resource can be neither found in
    /// the cache nor fetched.
    pub fn unavailable() -> Self {
        Self::new(503, "text/plain", Vec::new())
    }

    /// Only 200 responses are eligible for cache population.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_response_is_plain_text_503() {
        let resp = StoredResponse::offline();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.content_type, "text/plain");
        assert_eq!(resp.body_text(), "Offline - Unable to fetch resource");
        assert!(!resp.is_success());
        assert!(!resp.is_cacheable());
    }

    #[test]
    fn unavailable_response_has_empty_body() {
        let resp = StoredResponse::unavailable();
        assert_eq!(resp.status, 503);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn only_200_is_cacheable() {
        assert!(StoredResponse::new(200, "image/jpeg", vec![1]).is_cacheable());
        assert!(!StoredResponse::new(204, "image/jpeg", vec![]).is_cacheable());
        assert!(!StoredResponse::new(404, "text/html", vec![]).is_cacheable());
    }
}
