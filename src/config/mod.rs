//! Configuration management for VAVI
//!
//! Values resolve as environment variable, then config file, then default.

pub mod file;

use std::path::PathBuf;

use axum::http::HeaderValue;
use secrecy::SecretString;

use crate::llm::DEFAULT_MODEL;
use crate::registry::ApplicationRegistry;
use crate::video::VideoMode;
use crate::{Error, Result};

pub use file::VaviConfigFile;

/// Bind address used when none is configured
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Assistant configuration
#[derive(Debug)]
pub struct Config {
    /// Gemini model identifier
    pub llm_model: String,

    /// Gemini API root override (proxies, test servers)
    pub llm_base_url: Option<String>,

    /// Video search behavior; each front end picks its own default when unset
    pub video_mode: Option<VideoMode>,

    /// Launchable applications, in match order
    pub registry: ApplicationRegistry,

    /// API keys
    pub api_keys: ApiKeys,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// Voice configuration
    pub voice: VoiceConfig,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Interface to bind; loopback unless explicitly widened
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Browser origins allowed to call the API cross-origin; none by default
    pub cors_origins: Vec<String>,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,

    /// Global requests-per-minute budget; unlimited when unset
    pub rate_limit_per_minute: Option<u32>,

    /// Deadline for one dispatch; unbounded when unset
    pub request_timeout_secs: Option<u64>,
}

/// Speech-to-text backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SttProvider {
    #[default]
    Whisper,
    Deepgram,
}

/// Text-to-speech backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsProvider {
    #[default]
    OpenAI,
    ElevenLabs,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// Recognition language hint
    pub language: String,

    /// TTS backend
    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1", "eleven_monolingual_v1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Seconds to wait for speech to start before giving up
    pub listen_timeout_secs: f32,

    /// Maximum length of one phrase in seconds
    pub phrase_time_limit_secs: f32,

    /// Seconds of silence that end a phrase
    pub pause_threshold_secs: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_provider: SttProvider::Whisper,
            stt_model: "whisper-1".to_string(),
            language: "en".to_string(),
            tts_provider: TtsProvider::OpenAI,
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            listen_timeout_secs: 5.0,
            phrase_time_limit_secs: 10.0,
            pause_threshold_secs: 1.0,
        }
    }
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// Gemini API key (`GEMINI_API_KEY`, or legacy `GENAI_API_KEY`)
    pub gemini: Option<SecretString>,

    /// YouTube Data API key; the results page is scraped without one
    pub youtube: Option<SecretString>,

    /// `OpenAI` API key (Whisper STT, TTS)
    pub openai: Option<SecretString>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<SecretString>,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn from_sources(
        fc: VaviConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let secret = |value: Option<String>| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from)
        };

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            gemini: secret(
                env("GEMINI_API_KEY")
                    .or_else(|| env("GENAI_API_KEY"))
                    .or(fc.api_keys.gemini),
            ),
            youtube: secret(env("YOUTUBE_API_KEY").or(fc.api_keys.youtube)),
            openai: secret(env("OPENAI_API_KEY").or(fc.api_keys.openai)),
            elevenlabs: secret(env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs)),
            deepgram: secret(env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram)),
        };

        let llm_model = env("VAVI_LLM_MODEL")
            .or(fc.llm.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let llm_base_url = env("VAVI_LLM_BASE_URL").or(fc.llm.base_url);

        let video_mode = env("VAVI_VIDEO_MODE")
            .or(fc.video.mode)
            .map(|m| m.parse::<VideoMode>())
            .transpose()?;

        let registry = match fc.apps {
            Some(apps) => ApplicationRegistry::new(apps)?,
            None => ApplicationRegistry::default(),
        };

        // API server config (env > toml > default)
        let cors_origins = match env("VAVI_CORS_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(ToString::to_string)
                .collect(),
            None => fc.server.cors_origins.unwrap_or_default(),
        };
        for origin in &cors_origins {
            if HeaderValue::from_str(origin).is_err() {
                return Err(Error::Config(format!("invalid CORS origin: {origin}")));
            }
        }

        let api_server = ApiServerConfig {
            host: env("VAVI_HOST")
                .or(fc.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            cors_origins,
            port: parse_env(&env, "VAVI_PORT")?
                .or(fc.server.port)
                .unwrap_or(5000),
            static_dir: env("VAVI_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
            rate_limit_per_minute: parse_env(&env, "VAVI_RATE_LIMIT")?
                .or(fc.server.rate_limit_per_minute),
            request_timeout_secs: parse_env(&env, "VAVI_REQUEST_TIMEOUT")?
                .or(fc.server.request_timeout_secs),
        };

        let defaults = VoiceConfig::default();
        let fv = fc.voice;
        let stt_provider = match env("VAVI_STT_PROVIDER").or(fv.stt_provider) {
            Some(p) => parse_stt_provider(&p)?,
            None => defaults.stt_provider,
        };
        let tts_provider = match env("VAVI_TTS_PROVIDER").or(fv.tts_provider) {
            Some(p) => parse_tts_provider(&p)?,
            None => defaults.tts_provider,
        };

        let voice = VoiceConfig {
            stt_provider,
            stt_model: env("VAVI_STT_MODEL")
                .or(fv.stt_model)
                .unwrap_or(defaults.stt_model),
            language: env("VAVI_LANGUAGE")
                .or(fv.language)
                .unwrap_or(defaults.language),
            tts_provider,
            tts_model: env("VAVI_TTS_MODEL")
                .or(fv.tts_model)
                .unwrap_or(defaults.tts_model),
            tts_voice: env("VAVI_TTS_VOICE")
                .or(fv.tts_voice)
                .unwrap_or(defaults.tts_voice),
            tts_speed: fv.tts_speed.unwrap_or(defaults.tts_speed),
            listen_timeout_secs: fv
                .listen_timeout_secs
                .unwrap_or(defaults.listen_timeout_secs),
            phrase_time_limit_secs: fv
                .phrase_time_limit_secs
                .unwrap_or(defaults.phrase_time_limit_secs),
            pause_threshold_secs: fv
                .pause_threshold_secs
                .unwrap_or(defaults.pause_threshold_secs),
        };

        if api_keys.gemini.is_none() {
            tracing::warn!("GEMINI_API_KEY not set; conversation replies will be unavailable");
        }

        Ok(Self {
            llm_model,
            llm_base_url,
            video_mode,
            registry,
            api_keys,
            api_server,
            voice,
        })
    }
}

fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    env(key)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid value for {key}: {v}")))
        })
        .transpose()
}

fn parse_stt_provider(value: &str) -> Result<SttProvider> {
    match value.trim().to_lowercase().as_str() {
        "whisper" | "openai" => Ok(SttProvider::Whisper),
        "deepgram" => Ok(SttProvider::Deepgram),
        other => Err(Error::Config(format!("unknown STT provider: {other}"))),
    }
}

fn parse_tts_provider(value: &str) -> Result<TtsProvider> {
    match value.trim().to_lowercase().as_str() {
        "openai" => Ok(TtsProvider::OpenAI),
        "elevenlabs" => Ok(TtsProvider::ElevenLabs),
        other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
    }
}
