//! Voice processing module
//!
//! Handles microphone capture and endpointing, cloud speech recognition
//! and synthesis, and playback.

mod capture;
mod listener;
mod playback;
mod speaker;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, rms, samples_to_wav};
pub use listener::{
    DEFAULT_ENERGY_THRESHOLD, DetectorEvent, DetectorSettings, ListenState, Microphone,
    UtteranceDetector, calibrated_threshold,
};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_mp3};
pub use speaker::{Speaker, SpeechSink, SynthesizedSpeech};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
