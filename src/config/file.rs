//! TOML configuration file loading
//!
//! Supports `~/.config/vavi/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::registry::AppEntry;
use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct VaviConfigFile {
    /// Text generation settings
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Video search settings
    #[serde(default)]
    pub video: VideoFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Replacement application registry, in match order
    #[serde(default)]
    pub apps: Option<Vec<AppEntry>>,
}

/// Text generation configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Gemini model identifier (e.g. "gemini-2.0-flash")
    pub model: Option<String>,

    /// API root override
    pub base_url: Option<String>,
}

/// Video search configuration
#[derive(Debug, Default, Deserialize)]
pub struct VideoFileConfig {
    /// "interactive" or "api"
    pub mode: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT provider ("whisper" or "deepgram")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Recognition language hint (e.g. "en")
    pub language: Option<String>,

    /// TTS provider ("openai" or "elevenlabs")
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// Seconds to wait for speech to start
    pub listen_timeout_secs: Option<f32>,

    /// Maximum seconds of a single phrase
    pub phrase_time_limit_secs: Option<f32>,

    /// Seconds of silence that end a phrase
    pub pause_threshold_secs: Option<f32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub gemini: Option<String>,
    pub youtube: Option<String>,
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
    pub deepgram: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Interface to bind (e.g. "127.0.0.1", "0.0.0.0")
    pub host: Option<String>,

    /// API server port
    pub port: Option<u16>,

    /// Origins allowed to call the API from a browser
    pub cors_origins: Option<Vec<String>>,

    /// Directory holding `index.html` and other web assets
    pub static_dir: Option<String>,

    /// Global request budget per minute
    pub rate_limit_per_minute: Option<u32>,

    /// Deadline for a single dispatch
    pub request_timeout_secs: Option<u64>,
}

impl VaviConfigFile {
    /// Parse a config file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid TOML
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Load the TOML config file from the standard path
///
/// Returns `VaviConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> VaviConfigFile {
    let Some(path) = config_file_path() else {
        return VaviConfigFile::default();
    };

    if !path.exists() {
        return VaviConfigFile::default();
    }

    match VaviConfigFile::from_path(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            VaviConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/vavi/config.toml`
///
/// `VAVI_CONFIG` overrides the location.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("VAVI_CONFIG") {
        return Some(PathBuf::from(path));
    }
    directories::BaseDirs::new().map(|d| d.config_dir().join("vavi").join("config.toml"))
}
