//! VAVI - voice and text command assistant
//!
//! This library provides the core of the assistant:
//! - Intent classification over a fixed keyword grammar
//! - Application launching, video search, and a conversational fallback
//! - HTTP API for the web UI
//! - Voice conversation loop (capture, STT, TTS, playback)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Front ends                        │
//! │     HTTP API   │   Voice loop   │   Text chat / CLI  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Assistant                         │
//! │      normalize  →  classify  →  one handler          │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Collaborators                       │
//! │   Process spawn  │  YouTube  │  Browser  │  Gemini   │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod launcher;
pub mod llm;
pub mod normalize;
pub mod registry;
pub mod video;
pub mod voice;

pub use config::Config;
pub use dispatch::{Assistant, AssistantBuilder, Response};
pub use error::{Error, ErrorKind, Result};
pub use intent::{Intent, classify};
pub use normalize::normalize;
pub use registry::{AppEntry, ApplicationRegistry};
