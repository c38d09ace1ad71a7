//! YouTube search
//!
//! Uses the Data API when a key is configured, otherwise reads the
//! `ytInitialData` blob embedded in the public results page.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{VideoResult, VideoSearch};
use crate::{Error, Result};

/// Results returned per query
const MAX_RESULTS: usize = 5;

static INITIAL_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:var ytInitialData|window\[.ytInitialData.\])\s*=\s*(\{.*?\});\s*</script>")
        .expect("valid regex")
});

/// YouTube search backend
#[derive(Debug)]
pub enum YouTubeProvider {
    /// YouTube Data API v3
    DataApi {
        /// API key for the Data API
        api_key: SecretString,
    },
    /// Scrape `https://www.youtube.com/results`
    ResultsPage,
}

/// YouTube video search
pub struct YouTubeSearch {
    provider: YouTubeProvider,
    client: reqwest::Client,
}

/// Data API search response
#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    title: String,
}

impl YouTubeSearch {
    /// Search through the Data API
    #[must_use]
    pub fn new_data_api(api_key: SecretString) -> Self {
        Self {
            provider: YouTubeProvider::DataApi { api_key },
            client: reqwest::Client::new(),
        }
    }

    /// Search by scraping the results page
    #[must_use]
    pub fn new_results_page() -> Self {
        Self {
            provider: YouTubeProvider::ResultsPage,
            client: reqwest::Client::new(),
        }
    }

    /// Pick a provider based on whether a Data API key is available
    #[must_use]
    pub fn from_key(api_key: Option<SecretString>) -> Self {
        api_key.map_or_else(Self::new_results_page, Self::new_data_api)
    }

    /// Active provider
    #[must_use]
    pub const fn provider(&self) -> &YouTubeProvider {
        &self.provider
    }

    async fn search_data_api(&self, api_key: &str, query: &str) -> Result<Vec<VideoResult>> {
        let max_results = MAX_RESULTS.to_string();
        let response = self
            .client
            .get("https://www.googleapis.com/youtube/v3/search")
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("q", query),
                ("key", api_key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "YouTube Data API error");
            return Err(Error::Search(format!("YouTube API error {status}")));
        }

        let list: SearchListResponse = response.json().await?;
        Ok(list
            .items
            .into_iter()
            .filter_map(|item| {
                item.id.video_id.map(|id| VideoResult {
                    id,
                    title: unescape_html(&item.snippet.title),
                })
            })
            .collect())
    }

    async fn search_results_page(&self, query: &str) -> Result<Vec<VideoResult>> {
        let url = format!(
            "https://www.youtube.com/results?search_query={}",
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("User-Agent", "Mozilla/5.0 (X11; Linux x86_64) vavi")
            .send()
            .await?
            .error_for_status()?;

        let html = response.text().await?;
        parse_results_page(&html)
    }
}

#[async_trait]
impl VideoSearch for YouTubeSearch {
    async fn search(&self, query: &str) -> Result<Vec<VideoResult>> {
        match &self.provider {
            YouTubeProvider::DataApi { api_key } => {
                self.search_data_api(api_key.expose_secret(), query).await
            }
            YouTubeProvider::ResultsPage => self.search_results_page(query).await,
        }
    }
}

/// Extract ranked videos from a results page
fn parse_results_page(html: &str) -> Result<Vec<VideoResult>> {
    let blob = INITIAL_DATA
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| Error::Search("results page has no ytInitialData".to_string()))?;

    let data: serde_json::Value = serde_json::from_str(blob.as_str())?;

    let mut videos = Vec::new();
    collect_video_renderers(&data, &mut videos);
    Ok(videos)
}

/// Depth-first walk collecting `videoRenderer` entries in page order
fn collect_video_renderers(value: &serde_json::Value, out: &mut Vec<VideoResult>) {
    if out.len() >= MAX_RESULTS {
        return;
    }

    match value {
        serde_json::Value::Object(map) => {
            if let Some(renderer) = map.get("videoRenderer") {
                if let Some(video) = video_from_renderer(renderer) {
                    out.push(video);
                }
                return;
            }
            for child in map.values() {
                collect_video_renderers(child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for child in items {
                collect_video_renderers(child, out);
            }
        }
        _ => {}
    }
}

fn video_from_renderer(renderer: &serde_json::Value) -> Option<VideoResult> {
    let id = renderer.get("videoId")?.as_str()?.to_string();
    let title = renderer
        .pointer("/title/runs/0/text")
        .or_else(|| renderer.pointer("/title/simpleText"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(VideoResult { id, title })
}

/// Decode the handful of entities the Data API puts in titles
fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_selects_provider() {
        let search = YouTubeSearch::from_key(None);
        assert!(matches!(search.provider(), YouTubeProvider::ResultsPage));

        let search = YouTubeSearch::from_key(Some(SecretString::from("k".to_string())));
        assert!(matches!(search.provider(), YouTubeProvider::DataApi { .. }));
    }

    #[test]
    fn test_parse_results_page() {
        let html = r#"<html><script>var ytInitialData = {"contents":{"sectionListRenderer":{"contents":[
            {"itemSectionRenderer":{"contents":[
                {"adSlotRenderer":{}},
                {"videoRenderer":{"videoId":"first01","title":{"runs":[{"text":"Lofi Beats"}]}}},
                {"videoRenderer":{"videoId":"second2","title":{"simpleText":"Rain Sounds"}}}
            ]}}
        ]}}};</script></html>"#;

        let videos = parse_results_page(html).unwrap();

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, "first01");
        assert_eq!(videos[0].title, "Lofi Beats");
        assert_eq!(videos[1].title, "Rain Sounds");
    }

    #[test]
    fn test_parse_results_page_without_videos() {
        let html = r#"<script>var ytInitialData = {"contents":{}};</script>"#;
        assert!(parse_results_page(html).unwrap().is_empty());
    }

    #[test]
    fn test_parse_results_page_missing_blob() {
        let err = parse_results_page("<html>consent wall</html>").unwrap_err();
        assert!(matches!(err, Error::Search(_)));
    }

    #[test]
    fn test_data_api_response_skips_channels() {
        let json = r#"{"items":[
            {"id":{"kind":"youtube#channel","channelId":"c1"},"snippet":{"title":"A channel"}},
            {"id":{"kind":"youtube#video","videoId":"v1"},"snippet":{"title":"Tom &amp; Jerry&#39;s"}}
        ]}"#;
        let list: SearchListResponse = serde_json::from_str(json).unwrap();
        let ids: Vec<_> = list.items.iter().filter_map(|i| i.id.video_id.clone()).collect();
        assert_eq!(ids, ["v1"]);
        assert_eq!(unescape_html(&list.items[1].snippet.title), "Tom & Jerry's");
    }
}
