//! Video search and playback
//!
//! Finds the top search result for a phrase. In interactive mode the watch
//! page is opened in the default browser; in API mode the URL and title are
//! handed back to the caller instead.

mod youtube;

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use youtube::{YouTubeProvider, YouTubeSearch};

use crate::{Error, Result};

/// One ranked search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResult {
    /// Video identifier
    pub id: String,
    /// Video title
    pub title: String,
}

impl VideoResult {
    /// Canonical watch URL
    #[must_use]
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// Structured reference returned to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoLink {
    pub url: String,
    pub title: String,
}

impl From<&VideoResult> for VideoLink {
    fn from(video: &VideoResult) -> Self {
        Self {
            url: video.watch_url(),
            title: video.title.clone(),
        }
    }
}

/// Outcome of a search that did not fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Browser navigation was requested for this video
    Playing(VideoResult),
    /// The video is returned for the caller to act on
    Found(VideoLink),
    /// The search succeeded with zero results
    NoMatch,
}

/// What to do with the top search result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoMode {
    /// Open the watch page in the default browser
    #[default]
    Interactive,
    /// Return the link without side effects
    Api,
}

impl FromStr for VideoMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "interactive" | "browser" => Ok(Self::Interactive),
            "api" | "link" => Ok(Self::Api),
            other => Err(Error::Config(format!("unknown video mode: {other}"))),
        }
    }
}

/// Video search backend
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Ranked results for `query`, best first
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be reached or answers garbage
    async fn search(&self, query: &str) -> Result<Vec<VideoResult>>;
}

/// Opens URLs for the user
pub trait BrowserOpener: Send + Sync {
    /// Navigate the default browser to `url`
    ///
    /// # Errors
    ///
    /// Returns error if no browser could be started
    fn open(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the desktop's default handler
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        open::that_detached(url).map_err(|e| Error::Browser(e.to_string()))
    }
}

/// Search for `phrase` and act on the first result according to `mode`
///
/// # Errors
///
/// Returns error if the search backend or browser navigation fails
pub async fn find_video(
    phrase: &str,
    search: &dyn VideoSearch,
    browser: &dyn BrowserOpener,
    mode: VideoMode,
) -> Result<VideoOutcome> {
    tracing::debug!(phrase, ?mode, "searching for video");

    let results = search.search(phrase).await?;
    let Some(video) = results.into_iter().next() else {
        tracing::info!(phrase, "no video found");
        return Ok(VideoOutcome::NoMatch);
    };

    tracing::info!(id = %video.id, title = %video.title, "found video");

    match mode {
        VideoMode::Interactive => {
            browser.open(&video.watch_url())?;
            Ok(VideoOutcome::Playing(video))
        }
        VideoMode::Api => Ok(VideoOutcome::Found(VideoLink::from(&video))),
    }
}
