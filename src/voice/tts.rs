//! Text-to-speech (TTS) processing

use secrecy::{ExposeSecret, SecretString};

use crate::config::{ApiKeys, TtsProvider, VoiceConfig};
use crate::{Error, Result};

/// ElevenLabs output format that decodes straight to playback rate
const ELEVENLABS_FORMAT: &str = "mp3_22050_32";

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(
        api_key: SecretString,
        voice: String,
        speed: f32,
        model: String,
    ) -> Result<Self> {
        Self::new(TtsProvider::OpenAI, api_key, voice, speed, model)
    }

    /// Create a new TTS instance using `ElevenLabs`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs(api_key: SecretString, voice_id: String, model: String) -> Result<Self> {
        Self::new(TtsProvider::ElevenLabs, api_key, voice_id, 1.0, model)
    }

    /// Build the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if the selected provider has no API key
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        let (key, name) = match voice.tts_provider {
            TtsProvider::OpenAI => (keys.openai.as_ref(), "OPENAI_API_KEY"),
            TtsProvider::ElevenLabs => (keys.elevenlabs.as_ref(), "ELEVENLABS_API_KEY"),
        };
        let key = key.ok_or_else(|| Error::Config(format!("{name} required for speech output")))?;

        let key = SecretString::from(key.expose_secret().to_owned());
        let model = voice.tts_model.clone();

        match voice.tts_provider {
            TtsProvider::OpenAI => {
                Self::new_openai(key, voice.tts_voice.clone(), voice.tts_speed, model)
            }
            TtsProvider::ElevenLabs => Self::new_elevenlabs(key, voice.tts_voice.clone(), model),
        }
    }

    fn new(
        provider: TtsProvider,
        api_key: SecretString,
        voice: String,
        speed: f32,
        model: String,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(format!("{provider:?} API key required for TTS")));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speed: speed.clamp(0.25, 4.0),
            model,
            provider,
        })
    }

    /// Active provider
    #[must_use]
    pub const fn provider(&self) -> TtsProvider {
        self.provider
    }

    /// Synthesize text to speech
    ///
    /// Returns MP3 audio bytes.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        tracing::debug!(chars = text.len(), provider = ?self.provider, "synthesizing speech");
        match self.provider {
            TtsProvider::OpenAI => self.synthesize_openai(text).await,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text).await,
        }
    }

    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
            response_format: &'a str,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
            response_format: "mp3",
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "OpenAI TTS error");
            return Err(Error::Tts(format!("OpenAI TTS error {status}")));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}",
            urlencoding::encode(&self.voice)
        );

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", ELEVENLABS_FORMAT)])
            .header("xi-api-key", self.api_key.expose_secret())
            .json(&ElevenLabsRequest {
                text,
                model_id: &self.model,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "ElevenLabs TTS error");
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}")));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
