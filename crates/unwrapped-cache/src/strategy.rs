//! Static URL-to-strategy routing.
//!
//! The routing table mirrors what the shell needs: metadata API hosts and
//! video embed hosts must always hit the live network, the image CDN is
//! immutable content worth keeping, and everything else prefers fresh bytes
//! with a stale fallback.

use crate::service::Request;

/// How a request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Never intercepted: fetched live, never cached.
    PassThrough,
    /// Serve the cached copy if present, else fetch and populate.
    CacheFirst,
    /// Attempt a live fetch (populating the cache), fall back to the last
    /// cached copy.
    NetworkFirst,
}

/// Hosts that always need fresh data (metadata/search API).
const API_HOSTS: [&str; 2] = ["www.googleapis.com", "googleapis.com"];

/// Hosts that need a live connection (video embeds).
const EMBED_HOSTS: [&str; 3] = ["www.youtube.com", "youtube.com", "youtu.be"];

/// The static image CDN, cached aggressively.
const CDN_HOST: &str = "images.unsplash.com";

/// Route a request to its caching strategy.
pub fn route(request: &Request) -> Strategy {
    if !request.is_get {
        return Strategy::PassThrough;
    }
    let Some(host) = host_of(&request.url) else {
        // Not an http(s) URL at all; never intercepted.
        return Strategy::PassThrough;
    };
    if API_HOSTS.contains(&host) || EMBED_HOSTS.contains(&host) {
        return Strategy::PassThrough;
    }
    if host == CDN_HOST {
        return Strategy::CacheFirst;
    }
    Strategy::NetworkFirst
}

/// Extract the hostname from an http(s) URL, without dragging in a full URL
/// parser for three fixed host lists.
fn host_of(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let end = rest
        .find(|c| c == '/' || c == '?' || c == '#' || c == ':')
        .unwrap_or(rest.len());
    let host = &rest[..end];
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> Request {
        Request::get(url)
    }

    #[test]
    fn api_hosts_pass_through() {
        let req = get("https://www.googleapis.com/youtube/v3/search?q=lofi");
        assert_eq!(route(&req), Strategy::PassThrough);
        let req = get("https://googleapis.com/youtube/v3/videos?id=abc");
        assert_eq!(route(&req), Strategy::PassThrough);
    }

    #[test]
    fn embed_hosts_pass_through() {
        for url in [
            "https://www.youtube.com/embed/abc123",
            "https://youtube.com/watch?v=abc123",
            "https://youtu.be/abc123",
        ] {
            assert_eq!(route(&get(url)), Strategy::PassThrough, "{url}");
        }
    }

    #[test]
    fn image_cdn_is_cache_first() {
        let req = get("https://images.unsplash.com/photo-1470225620780?w=1200");
        assert_eq!(route(&req), Strategy::CacheFirst);
    }

    #[test]
    fn everything_else_is_network_first() {
        assert_eq!(
            route(&get("https://i.ytimg.com/vi/abc123/default.jpg")),
            Strategy::NetworkFirst
        );
        assert_eq!(
            route(&get("http://example.com/styles.css")),
            Strategy::NetworkFirst
        );
    }

    #[test]
    fn non_get_requests_pass_through() {
        let mut req = get("https://images.unsplash.com/photo-1");
        req.is_get = false;
        assert_eq!(route(&req), Strategy::PassThrough);
    }

    #[test]
    fn non_http_urls_pass_through() {
        assert_eq!(
            route(&get("chrome-extension://abcdef/script.js")),
            Strategy::PassThrough
        );
        assert_eq!(route(&get("data:text/plain,hello")), Strategy::PassThrough);
    }

    #[test]
    fn host_extraction_handles_ports_and_paths() {
        assert_eq!(host_of("https://example.com:8080/x"), Some("example.com"));
        assert_eq!(host_of("http://example.com"), Some("example.com"));
        assert_eq!(host_of("ftp://example.com"), None);
    }
}
