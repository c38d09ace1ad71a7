//! Intent classification by fixed substring rules
//!
//! Rules are checked in order and the first match wins:
//!
//! 1. "open" plus a registered application name launches that application
//! 2. "play", "youtube" or "video" with something left over searches for a video
//! 3. anything else goes to the conversation model

use crate::registry::ApplicationRegistry;

/// Keyword that triggers an application launch
const LAUNCH_KEYWORD: &str = "open";

/// Keywords that trigger a video search, stripped in this order
const VIDEO_KEYWORDS: [&str; 3] = ["play", "youtube", "video"];

/// Classified purpose of one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Launch a registered application (registry key)
    LaunchApplication(String),
    /// Search for and play a video (keywords removed)
    PlayVideo(String),
    /// Forward to the conversation model
    Converse(String),
}

impl Intent {
    /// Short label for logging
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::LaunchApplication(_) => "launch",
            Self::PlayVideo(_) => "video",
            Self::Converse(_) => "converse",
        }
    }
}

/// Classify a normalized utterance
#[must_use]
pub fn classify(utterance: &str, registry: &ApplicationRegistry) -> Intent {
    if utterance.contains(LAUNCH_KEYWORD) {
        if let Some(app) = registry.first_match(utterance) {
            return Intent::LaunchApplication(app.to_string());
        }
    }

    if VIDEO_KEYWORDS.iter().any(|k| utterance.contains(k)) {
        let phrase = strip_video_keywords(utterance);
        if !phrase.is_empty() {
            return Intent::PlayVideo(phrase);
        }
    }

    Intent::Converse(utterance.to_string())
}

/// Remove every video keyword and trim the remainder
fn strip_video_keywords(utterance: &str) -> String {
    VIDEO_KEYWORDS
        .iter()
        .fold(utterance.to_string(), |acc, k| acc.replace(k, ""))
        .trim()
        .to_string()
}
