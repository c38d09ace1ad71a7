//! Utterance endpointing
//!
//! Energy-based voice activity detection: calibrate a threshold against
//! ambient noise, wait for speech to start, then capture until a pause or
//! the phrase limit.

use std::time::Duration;

use super::capture::{AudioCapture, SAMPLE_RATE, rms};
use crate::config::VoiceConfig;
use crate::Result;

/// Threshold used before any calibration has run
pub const DEFAULT_ENERGY_THRESHOLD: f32 = 0.03;

/// Floor for a calibrated threshold so a silent room still needs real speech
const MIN_ENERGY_THRESHOLD: f32 = 0.01;

/// Ambient level multiplier when calibrating
const CALIBRATION_FACTOR: f32 = 1.5;

/// Analysis frame, 100ms at 16kHz
const FRAME_SAMPLES: usize = 1600;

/// How long to sample ambient noise before each listen
const CALIBRATION_WINDOW: Duration = Duration::from_millis(500);

/// Capture buffer poll interval
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Endpointing limits, in samples at [`SAMPLE_RATE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorSettings {
    /// Silence allowed before speech starts
    pub listen_timeout: usize,
    /// Longest phrase captured
    pub phrase_limit: usize,
    /// Trailing silence that ends a phrase
    pub pause: usize,
}

impl DetectorSettings {
    /// Convert second-based limits to sample counts
    #[must_use]
    pub fn from_secs(listen_timeout: f32, phrase_limit: f32, pause: f32) -> Self {
        Self {
            listen_timeout: secs_to_samples(listen_timeout),
            phrase_limit: secs_to_samples(phrase_limit),
            pause: secs_to_samples(pause),
        }
    }
}

impl From<&VoiceConfig> for DetectorSettings {
    fn from(voice: &VoiceConfig) -> Self {
        Self::from_secs(
            voice.listen_timeout_secs,
            voice.phrase_time_limit_secs,
            voice.pause_threshold_secs,
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn secs_to_samples(secs: f32) -> usize {
    (secs.max(0.0) * SAMPLE_RATE as f32) as usize
}

/// Detector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenState {
    /// No speech yet
    Waiting,
    /// Inside a phrase
    Speaking,
}

/// Result of feeding audio to the detector
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorEvent {
    /// Need more audio
    Pending,
    /// A phrase ended; carries its samples
    Complete(Vec<f32>),
    /// Nobody started speaking within the listen timeout
    TimedOut,
}

/// Splits a sample stream into one utterance
pub struct UtteranceDetector {
    settings: DetectorSettings,
    threshold: f32,
    state: ListenState,
    phrase: Vec<f32>,
    waited: usize,
    silence: usize,
}

impl UtteranceDetector {
    #[must_use]
    pub const fn new(settings: DetectorSettings, threshold: f32) -> Self {
        Self {
            settings,
            threshold,
            state: ListenState::Waiting,
            phrase: Vec::new(),
            waited: 0,
            silence: 0,
        }
    }

    /// Feed captured samples
    ///
    /// Audio after a terminal event in the same call is discarded and the
    /// detector starts over.
    pub fn push(&mut self, samples: &[f32]) -> DetectorEvent {
        for frame in samples.chunks(FRAME_SAMPLES) {
            let event = self.push_frame(frame);
            if event != DetectorEvent::Pending {
                self.reset();
                return event;
            }
        }
        DetectorEvent::Pending
    }

    fn push_frame(&mut self, frame: &[f32]) -> DetectorEvent {
        let energy = rms(frame);
        let is_speech = energy > self.threshold;

        match self.state {
            ListenState::Waiting => {
                if is_speech {
                    tracing::trace!(energy, "speech started");
                    self.state = ListenState::Speaking;
                    self.phrase.extend_from_slice(frame);
                    self.silence = 0;
                } else {
                    self.waited += frame.len();
                    if self.waited >= self.settings.listen_timeout {
                        return DetectorEvent::TimedOut;
                    }
                }
            }
            ListenState::Speaking => {
                self.phrase.extend_from_slice(frame);
                if is_speech {
                    self.silence = 0;
                } else {
                    self.silence += frame.len();
                }

                if self.silence >= self.settings.pause
                    || self.phrase.len() >= self.settings.phrase_limit
                {
                    tracing::debug!(
                        samples = self.phrase.len(),
                        trailing_silence = self.silence,
                        "phrase complete"
                    );
                    return DetectorEvent::Complete(std::mem::take(&mut self.phrase));
                }
            }
        }

        DetectorEvent::Pending
    }

    /// Back to waiting with an empty buffer
    pub fn reset(&mut self) {
        self.state = ListenState::Waiting;
        self.phrase.clear();
        self.waited = 0;
        self.silence = 0;
    }

    #[must_use]
    pub const fn state(&self) -> ListenState {
        self.state
    }
}

/// Speech threshold for a sample of ambient noise
#[must_use]
pub fn calibrated_threshold(ambient: &[f32]) -> f32 {
    if ambient.is_empty() {
        return DEFAULT_ENERGY_THRESHOLD;
    }
    (rms(ambient) * CALIBRATION_FACTOR).max(MIN_ENERGY_THRESHOLD)
}

/// Default microphone with endpointing
pub struct Microphone {
    capture: AudioCapture,
    settings: DetectorSettings,
    threshold: f32,
}

impl Microphone {
    /// Open the default input device
    ///
    /// # Errors
    ///
    /// Returns error if no usable input device exists
    pub fn new(settings: DetectorSettings) -> Result<Self> {
        Ok(Self {
            capture: AudioCapture::new()?,
            settings,
            threshold: DEFAULT_ENERGY_THRESHOLD,
        })
    }

    /// Re-measure ambient noise and update the speech threshold
    ///
    /// # Errors
    ///
    /// Returns error if capture fails
    #[allow(clippy::future_not_send)]
    pub async fn calibrate(&mut self) -> Result<f32> {
        self.capture.start()?;
        self.capture.clear_buffer();
        tokio::time::sleep(CALIBRATION_WINDOW).await;
        let ambient = self.capture.take_buffer();

        self.threshold = calibrated_threshold(&ambient);
        tracing::debug!(threshold = self.threshold, "calibrated for ambient noise");
        Ok(self.threshold)
    }

    /// Capture one utterance
    ///
    /// Returns `None` when nobody spoke within the listen timeout. The
    /// input stream is closed again before returning so playback is not
    /// picked up.
    ///
    /// # Errors
    ///
    /// Returns error if capture fails
    #[allow(clippy::future_not_send)]
    pub async fn listen(&mut self) -> Result<Option<Vec<f32>>> {
        let result = self.listen_inner().await;
        self.capture.stop();
        result
    }

    #[allow(clippy::future_not_send)]
    async fn listen_inner(&mut self) -> Result<Option<Vec<f32>>> {
        self.calibrate().await?;
        let mut detector = UtteranceDetector::new(self.settings, self.threshold);

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            match detector.push(&self.capture.take_buffer()) {
                DetectorEvent::Pending => {}
                DetectorEvent::Complete(samples) => return Ok(Some(samples)),
                DetectorEvent::TimedOut => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEECH: f32 = 0.2;

    fn settings() -> DetectorSettings {
        DetectorSettings::from_secs(1.0, 2.0, 0.5)
    }

    fn tone(secs: f32, amplitude: f32) -> Vec<f32> {
        vec![amplitude; secs_to_samples(secs)]
    }

    #[test]
    fn test_settings_from_secs() {
        let settings = DetectorSettings::from_secs(5.0, 10.0, 1.0);
        assert_eq!(settings.listen_timeout, 80_000);
        assert_eq!(settings.phrase_limit, 160_000);
        assert_eq!(settings.pause, 16_000);
    }

    #[test]
    fn test_silence_times_out() {
        let mut detector = UtteranceDetector::new(settings(), DEFAULT_ENERGY_THRESHOLD);
        assert_eq!(detector.push(&tone(0.5, 0.0)), DetectorEvent::Pending);
        assert_eq!(detector.push(&tone(0.5, 0.0)), DetectorEvent::TimedOut);
        assert_eq!(detector.state(), ListenState::Waiting);
    }

    #[test]
    fn test_phrase_ends_on_pause() {
        let mut detector = UtteranceDetector::new(settings(), DEFAULT_ENERGY_THRESHOLD);
        assert_eq!(detector.push(&tone(0.3, 0.0)), DetectorEvent::Pending);
        assert_eq!(detector.push(&tone(0.8, SPEECH)), DetectorEvent::Pending);
        assert_eq!(detector.state(), ListenState::Speaking);

        let DetectorEvent::Complete(samples) = detector.push(&tone(0.5, 0.0)) else {
            panic!("expected complete phrase");
        };
        assert_eq!(samples.len(), 12_800 + 8_000);
        assert_eq!(detector.state(), ListenState::Waiting);
    }

    #[test]
    fn test_phrase_limit_cuts_long_speech() {
        let mut detector = UtteranceDetector::new(settings(), DEFAULT_ENERGY_THRESHOLD);
        let DetectorEvent::Complete(samples) = detector.push(&tone(3.0, SPEECH)) else {
            panic!("expected phrase limit");
        };
        assert_eq!(samples.len(), secs_to_samples(2.0));
    }

    #[test]
    fn test_short_gap_does_not_end_phrase() {
        let mut detector = UtteranceDetector::new(settings(), DEFAULT_ENERGY_THRESHOLD);
        detector.push(&tone(0.2, SPEECH));
        assert_eq!(detector.push(&tone(0.3, 0.0)), DetectorEvent::Pending);
        assert_eq!(detector.push(&tone(0.2, SPEECH)), DetectorEvent::Pending);
        assert_eq!(detector.state(), ListenState::Speaking);
    }

    #[test]
    fn test_calibration() {
        assert!((calibrated_threshold(&[]) - DEFAULT_ENERGY_THRESHOLD).abs() < f32::EPSILON);
        assert!((calibrated_threshold(&[0.0; 100]) - MIN_ENERGY_THRESHOLD).abs() < f32::EPSILON);
        assert!((calibrated_threshold(&[0.1; 100]) - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_noisy_room_raises_threshold() {
        let threshold = calibrated_threshold(&[0.1; 1600]);
        let mut detector = UtteranceDetector::new(settings(), threshold);
        assert_eq!(detector.push(&tone(1.0, 0.12)), DetectorEvent::TimedOut);
    }
}
