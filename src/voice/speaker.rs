//! Spoken output
//!
//! The speech engine is created on first use and then shared. Each
//! utterance holds the engine lock from synthesis until playback drains,
//! so overlapping callers speak one after another.

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use crate::config::{ApiKeys, VoiceConfig};
use crate::Result;

/// Something that can say a line out loud
#[async_trait]
pub trait SpeechSink: Send {
    /// Speak `text`, resolving once it has finished playing
    async fn say(&mut self, text: &str) -> Result<()>;
}

/// Cloud TTS piped into the default output device
pub struct SynthesizedSpeech {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl SynthesizedSpeech {
    #[must_use]
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self { tts, playback }
    }

    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the TTS key is missing or no output device exists
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        Ok(Self::new(
            TextToSpeech::from_config(voice, keys)?,
            AudioPlayback::new()?,
        ))
    }
}

#[async_trait]
impl SpeechSink for SynthesizedSpeech {
    async fn say(&mut self, text: &str) -> Result<()> {
        let audio = self.tts.synthesize(text).await?;
        self.playback.play_mp3(&audio).await
    }
}

type SinkFactory = Box<dyn Fn() -> Result<Box<dyn SpeechSink>> + Send + Sync>;

/// Lazily-initialized, serialized access to a [`SpeechSink`]
pub struct Speaker {
    engine: OnceCell<Mutex<Box<dyn SpeechSink>>>,
    factory: SinkFactory,
}

impl Speaker {
    /// Create a speaker whose engine is built by `factory` on first use
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn SpeechSink>> + Send + Sync + 'static,
    {
        Self {
            engine: OnceCell::new(),
            factory: Box::new(factory),
        }
    }

    /// Speaker backed by the configured TTS provider
    #[must_use]
    pub fn from_config(voice: VoiceConfig, keys: ApiKeys) -> Self {
        Self::new(move || {
            let speech = SynthesizedSpeech::from_config(&voice, &keys)?;
            Ok(Box::new(speech) as Box<dyn SpeechSink>)
        })
    }

    /// Speak one line
    ///
    /// A failed initialization is not cached; the next call retries.
    ///
    /// # Errors
    ///
    /// Returns error if the engine cannot be created or speaking fails
    pub async fn speak(&self, text: &str) -> Result<()> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                tracing::debug!("initializing speech engine");
                (self.factory)().map(Mutex::new)
            })
            .await?;

        let mut sink = engine.lock().await;
        sink.say(text).await
    }

    /// Whether the engine has been created
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.engine.initialized()
    }
}
