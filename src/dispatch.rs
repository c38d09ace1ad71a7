//! Command dispatch
//!
//! Every front end (HTTP, conversation loop, one-shot CLI) funnels utterances
//! through [`Assistant::process`]. Handlers report failures as values inside
//! [`Response`]; they only become text when the response is displayed.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::config::Config;
use crate::intent::{Intent, classify};
use crate::launcher::{LaunchOutcome, Spawner, SystemSpawner, launch};
use crate::llm::{GeminiClient, TextGenerator, converse};
use crate::normalize::normalize;
use crate::registry::ApplicationRegistry;
use crate::video::{
    BrowserOpener, SystemBrowser, VideoLink, VideoMode, VideoOutcome, VideoSearch, YouTubeSearch,
    find_video,
};
use crate::{Error, Result};

/// Shown when a search succeeds with zero results
pub const NO_VIDEO_MESSAGE: &str = "Sorry, I couldn't find any videos matching your request.";

/// Shown when the model answers with nothing printable
pub const EMPTY_REPLY_MESSAGE: &str = "Sorry, I don't have an answer for that.";

/// Outcome of dispatching one utterance
#[derive(Debug)]
pub enum Response {
    /// Application launch
    Launch {
        app: String,
        result: Result<LaunchOutcome>,
    },
    /// Video search
    Video {
        phrase: String,
        result: Result<VideoOutcome>,
    },
    /// Conversation model reply
    Conversation(Result<String>),
}

impl Response {
    /// The collaborator fault behind this response, if any
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        match self {
            Self::Launch { result: Err(e), .. }
            | Self::Video { result: Err(e), .. }
            | Self::Conversation(Err(e)) => Some(e),
            _ => None,
        }
    }

    /// Structured video reference (API mode only)
    #[must_use]
    pub const fn video_link(&self) -> Option<&VideoLink> {
        match self {
            Self::Video {
                result: Ok(VideoOutcome::Found(link)),
                ..
            } => Some(link),
            _ => None,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch { app, result } => match result {
                Ok(LaunchOutcome::Opened(_)) => write!(f, "Opening {app}"),
                Ok(LaunchOutcome::Unknown(_)) => {
                    write!(f, "Sorry, I don't know how to open {app}")
                }
                Err(e) => write!(f, "Error opening {app}: {e}"),
            },
            Self::Video { result, .. } => match result {
                Ok(VideoOutcome::Playing(video)) => write!(f, "Playing {}", video.title),
                Ok(VideoOutcome::Found(link)) => write!(f, "{}: {}", link.title, link.url),
                Ok(VideoOutcome::NoMatch) => f.write_str(NO_VIDEO_MESSAGE),
                Err(e) => write!(f, "Error playing video: {e}"),
            },
            Self::Conversation(result) => match result {
                Ok(text) if text.trim().is_empty() => f.write_str(EMPTY_REPLY_MESSAGE),
                Ok(text) => f.write_str(text),
                Err(e) => write!(f, "Sorry, I encountered an error: {e}"),
            },
        }
    }
}

/// Routes utterances to the launcher, video search or conversation model
pub struct Assistant {
    registry: Arc<ApplicationRegistry>,
    spawner: Arc<dyn Spawner>,
    search: Arc<dyn VideoSearch>,
    browser: Arc<dyn BrowserOpener>,
    generator: Option<Arc<dyn TextGenerator>>,
    video_mode: VideoMode,
}

impl Assistant {
    /// Start building an assistant around a video search backend
    #[must_use]
    pub fn builder(search: Arc<dyn VideoSearch>) -> AssistantBuilder {
        AssistantBuilder::new(search)
    }

    /// Assemble an assistant backed by YouTube and Gemini
    ///
    /// `default_mode` applies when the configuration leaves the video mode
    /// unset. Without a Gemini key the conversation handler reports a
    /// configuration error instead of replying.
    ///
    /// # Errors
    ///
    /// Returns error if the Gemini client cannot be created
    pub fn from_config(config: &Config, default_mode: VideoMode) -> Result<Self> {
        let youtube_key = config
            .api_keys
            .youtube
            .as_ref()
            .map(|k| SecretString::from(k.expose_secret().to_owned()));

        let mut builder = Self::builder(Arc::new(YouTubeSearch::from_key(youtube_key)))
            .registry(config.registry.clone())
            .video_mode(config.video_mode.unwrap_or(default_mode));

        if let Some(key) = &config.api_keys.gemini {
            let mut client = GeminiClient::new(
                SecretString::from(key.expose_secret().to_owned()),
                config.llm_model.clone(),
            )?;
            if let Some(base_url) = &config.llm_base_url {
                client = client.with_base_url(base_url.clone());
            }
            builder = builder.generator(Arc::new(client));
        }

        Ok(builder.build())
    }

    /// Normalize, classify and run one handler
    pub async fn dispatch(&self, utterance: &str) -> Response {
        let normalized = normalize(utterance);
        let intent = classify(&normalized, &self.registry);
        tracing::info!(intent = intent.label(), "classified utterance");

        match intent {
            Intent::LaunchApplication(app) => {
                let result = launch(&app, &self.registry, self.spawner.as_ref());
                Response::Launch { app, result }
            }
            Intent::PlayVideo(phrase) => {
                let result = find_video(
                    &phrase,
                    self.search.as_ref(),
                    self.browser.as_ref(),
                    self.video_mode,
                )
                .await;
                Response::Video { phrase, result }
            }
            Intent::Converse(text) => {
                let result = match &self.generator {
                    Some(generator) => converse(&text, generator.as_ref()).await,
                    None => Err(Error::Config(
                        "no text generation backend configured (set GEMINI_API_KEY)".to_string(),
                    )),
                };
                Response::Conversation(result)
            }
        }
    }

    /// Dispatch and render the response as display text
    ///
    /// Never fails and never returns an empty string.
    pub async fn process(&self, utterance: &str) -> String {
        let response = self.dispatch(utterance).await;
        if let Some(e) = response.error() {
            tracing::warn!(kind = ?e.kind(), error = %e, "handler failed");
        }
        response.to_string()
    }

    /// Configured video mode
    #[must_use]
    pub const fn video_mode(&self) -> VideoMode {
        self.video_mode
    }

    /// Application registry
    #[must_use]
    pub fn registry(&self) -> &ApplicationRegistry {
        &self.registry
    }

    /// Whether a text generation backend is configured
    #[must_use]
    pub const fn has_generator(&self) -> bool {
        self.generator.is_some()
    }
}

/// Builder for [`Assistant`]
pub struct AssistantBuilder {
    registry: ApplicationRegistry,
    spawner: Arc<dyn Spawner>,
    search: Arc<dyn VideoSearch>,
    browser: Arc<dyn BrowserOpener>,
    generator: Option<Arc<dyn TextGenerator>>,
    video_mode: VideoMode,
}

impl AssistantBuilder {
    /// Create a builder with host defaults for everything but search
    #[must_use]
    pub fn new(search: Arc<dyn VideoSearch>) -> Self {
        Self {
            registry: ApplicationRegistry::default(),
            spawner: Arc::new(SystemSpawner),
            search,
            browser: Arc::new(SystemBrowser),
            generator: None,
            video_mode: VideoMode::default(),
        }
    }

    /// Set the application registry
    #[must_use]
    pub fn registry(mut self, registry: ApplicationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the process spawner
    #[must_use]
    pub fn spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Set the browser opener
    #[must_use]
    pub fn browser(mut self, browser: Arc<dyn BrowserOpener>) -> Self {
        self.browser = browser;
        self
    }

    /// Set the text generation backend
    #[must_use]
    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the video mode
    #[must_use]
    pub const fn video_mode(mut self, mode: VideoMode) -> Self {
        self.video_mode = mode;
        self
    }

    /// Build the assistant
    #[must_use]
    pub fn build(self) -> Assistant {
        Assistant {
            registry: Arc::new(self.registry),
            spawner: self.spawner,
            search: self.search,
            browser: self.browser,
            generator: self.generator,
            video_mode: self.video_mode,
        }
    }
}
