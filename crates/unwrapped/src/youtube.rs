//! YouTube Data API v3 client: id lookup, free-text search, and video-id
//! extraction from pasted URLs.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("API key required")]
    MissingKey,
    #[error("Search failed: {0}")]
    Http(String),
    #[error("Unexpected API response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Metadata for one video, as much of it as the response carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDetails {
    pub title: String,
    pub thumbnail: String,
    pub channel_title: String,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub channel_title: String,
}

/// Optional search refinements, passed through to the API verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub duration: Option<String>,
    pub definition: Option<String>,
    pub order: Option<String>,
    pub published_after: Option<String>,
}

// Wire format. Every nested field is tolerated as absent.

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    id: Option<ItemId>,
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemId {
    Search {
        #[serde(rename = "videoId")]
        video_id: Option<String>,
    },
    Plain(String),
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "channelTitle", default)]
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(default)]
    url: Option<String>,
}

impl Snippet {
    fn details(self) -> VideoDetails {
        VideoDetails {
            title: self.title.unwrap_or_else(|| "Untitled Video".to_owned()),
            thumbnail: self
                .thumbnails
                .and_then(|t| t.default)
                .and_then(|d| d.url)
                .unwrap_or_default(),
            channel_title: self
                .channel_title
                .unwrap_or_else(|| "Unknown Channel".to_owned()),
        }
    }
}

/// Thin client over the `videos` and `search` endpoints.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    api_key: String,
}

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Look up one video's snippet. `Ok(None)` when the API answers but
    /// knows nothing about the id.
    pub fn video_details(&self, video_id: &str) -> Result<Option<VideoDetails>, ApiError> {
        if !self.has_key() {
            return Err(ApiError::MissingKey);
        }
        if video_id.is_empty() {
            return Ok(None);
        }
        let url = format!("{API_BASE}/videos");
        let mut resp = ureq::get(url.as_str())
            .query("part", "snippet")
            .query("id", video_id)
            .query("key", &self.api_key)
            .call()
            .map_err(|e| ApiError::Http(e.to_string()))?;
        let body = resp
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Http(e.to_string()))?;
        Ok(parse_video_details(&body)?)
    }

    /// Free-text search, newest-style snippet response, optionally
    /// filtered.
    pub fn search(
        &self,
        query: &str,
        max_results: u32,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchResult>, ApiError> {
        if !self.has_key() {
            return Err(ApiError::MissingKey);
        }
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{API_BASE}/search");
        let mut req = ureq::get(url.as_str())
            .query("part", "snippet")
            .query("type", "video")
            .query("maxResults", max_results.to_string())
            .query("q", query)
            .query("key", &self.api_key);
        if let Some(duration) = &filters.duration {
            req = req.query("videoDuration", duration);
        }
        if let Some(definition) = &filters.definition {
            req = req.query("videoDefinition", definition);
        }
        if let Some(order) = &filters.order {
            req = req.query("order", order);
        }
        if let Some(published_after) = &filters.published_after {
            req = req.query("publishedAfter", published_after);
        }
        let mut resp = req.call().map_err(|e| ApiError::Http(e.to_string()))?;
        let body = resp
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Http(e.to_string()))?;
        Ok(parse_search_results(&body)?)
    }
}

fn parse_video_details(body: &str) -> Result<Option<VideoDetails>, serde_json::Error> {
    let parsed: ListResponse = serde_json::from_str(body)?;
    Ok(parsed
        .items
        .into_iter()
        .next()
        .and_then(|item| item.snippet)
        .map(Snippet::details))
}

fn parse_search_results(body: &str) -> Result<Vec<SearchResult>, serde_json::Error> {
    let parsed: ListResponse = serde_json::from_str(body)?;
    Ok(parsed
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = match item.id? {
                ItemId::Search { video_id } => video_id?,
                ItemId::Plain(id) => id,
            };
            let details = item.snippet.unwrap_or_default().details();
            Some(SearchResult {
                id: video_id,
                title: details.title,
                thumbnail: details.thumbnail,
                channel_title: details.channel_title,
            })
        })
        .collect())
}

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)")
        .expect("video url pattern")
});

static BARE_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9_-]{11})$").expect("video id pattern"));

/// Extract a video id from a watch/short/embed URL, or accept a bare
/// 11-character id as-is.
pub fn extract_video_id(input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }
    for pattern in [&URL_PATTERN, &BARE_ID_PATTERN] {
        if let Some(caps) = pattern.captures(input) {
            return Some(caps[1].to_owned());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ids_from_the_supported_url_shapes() {
        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0",
            "dQw4w9WgXcQ",
        ] {
            assert_eq!(
                extract_video_id(input).as_deref(),
                Some("dQw4w9WgXcQ"),
                "{input}"
            );
        }
    }

    #[test]
    fn rejects_junk_input() {
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("not a url"), None);
        assert_eq!(extract_video_id("https://example.com/watch?v="), None);
        assert_eq!(extract_video_id("shortid"), None);
    }

    #[test]
    fn parses_a_full_video_details_response() {
        let body = r#"{
            "items": [{
                "id": "dQw4w9WgXcQ",
                "snippet": {
                    "title": "Never Gonna Give You Up",
                    "channelTitle": "Rick Astley",
                    "thumbnails": { "default": { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg" } }
                }
            }]
        }"#;
        let details = parse_video_details(body).unwrap().unwrap();
        assert_eq!(details.title, "Never Gonna Give You Up");
        assert_eq!(details.channel_title, "Rick Astley");
        assert!(details.thumbnail.ends_with("default.jpg"));
    }

    #[test]
    fn missing_nested_fields_fall_back_to_placeholders() {
        let body = r#"{ "items": [{ "snippet": {} }] }"#;
        let details = parse_video_details(body).unwrap().unwrap();
        assert_eq!(details.title, "Untitled Video");
        assert_eq!(details.channel_title, "Unknown Channel");
        assert_eq!(details.thumbnail, "");
    }

    #[test]
    fn empty_items_means_unknown_video() {
        assert_eq!(parse_video_details(r#"{ "items": [] }"#).unwrap(), None);
        assert_eq!(parse_video_details("{}").unwrap(), None);
    }

    #[test]
    fn parses_search_results_and_skips_idless_items() {
        let body = r#"{
            "items": [
                {
                    "id": { "videoId": "abc123def45" },
                    "snippet": { "title": "First", "channelTitle": "Chan" }
                },
                { "id": { "kind": "youtube#channel" }, "snippet": { "title": "No video id" } },
                { "snippet": { "title": "No id at all" } }
            ]
        }"#;
        let results = parse_search_results(body).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "abc123def45");
        assert_eq!(results[0].title, "First");
        assert_eq!(results[0].channel_title, "Chan");
    }

    #[test]
    fn client_without_key_refuses_to_call_out() {
        let client = YouTubeClient::new("");
        assert!(!client.has_key());
        assert!(matches!(
            client.video_details("abc"),
            Err(ApiError::MissingKey)
        ));
        assert!(matches!(
            client.search("q", 8, &SearchFilters::default()),
            Err(ApiError::MissingKey)
        ));
    }
}
