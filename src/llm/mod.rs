//! Conversation fallback through a text-generation model

mod gemini;

use async_trait::async_trait;
use serde::Serialize;

pub use gemini::{DEFAULT_MODEL, GeminiClient};

use crate::normalize::normalize;
use crate::Result;

/// Persona and behavior instructions prepended to every prompt
///
/// Guideline lines carry no leading indentation.
pub const PERSONA_PREAMBLE: &str = "You are VAVI, a helpful and thoughtful AI assistant. Follow these guidelines:
1. Think carefully before responding
2. Consider the user's specific requirements and context
3. Provide detailed and accurate information
4. Be conversational but professional
5. If unsure about something, acknowledge it
6. Focus on being helpful and practical
7. Avoid unnecessary technical jargon unless specifically requested
8. Consider the user's perspective and needs";

/// Sampling parameters sent with each generation request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub candidate_count: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 300,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            candidate_count: 1,
            stop_sequences: Vec::new(),
        }
    }
}

/// Text-generation backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`, returning the first candidate's text
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails or returns no candidate
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}

/// Wrap an utterance in the persona preamble
#[must_use]
pub fn build_prompt(utterance: &str) -> String {
    format!("{PERSONA_PREAMBLE}\n\nUser Query: {utterance}")
}

/// Ask the model about `utterance` and clean the reply for display and speech
///
/// # Errors
///
/// Returns error if the generator fails
pub async fn converse(utterance: &str, generator: &dyn TextGenerator) -> Result<String> {
    let prompt = build_prompt(utterance);
    let config = GenerationConfig::default();

    let text = generator.generate(&prompt, &config).await?;
    tracing::debug!(response_len = text.len(), "model responded");

    Ok(normalize(&text))
}
