//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;

use vavi::voice::{
    DetectorEvent, DetectorSettings, ListenState, SAMPLE_RATE, UtteranceDetector,
    calibrated_threshold, decode_mp3, rms, samples_to_wav,
};

/// Generate `count` samples of a sine wave
#[allow(clippy::cast_precision_loss)]
fn generate_sine_samples(frequency: f32, count: usize, amplitude: f32) -> Vec<f32> {
    (0..count)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate `count` samples of silence
fn generate_silence(count: usize) -> Vec<f32> {
    vec![0.0; count]
}

fn settings() -> DetectorSettings {
    DetectorSettings {
        listen_timeout: 16_000,
        phrase_limit: 80_000,
        pause: 8_000,
    }
}

#[test]
fn test_spoken_phrase_is_captured() {
    let threshold = calibrated_threshold(&generate_silence(8_000));
    let mut detector = UtteranceDetector::new(settings(), threshold);

    assert_eq!(detector.push(&generate_silence(4_800)), DetectorEvent::Pending);
    assert_eq!(detector.state(), ListenState::Waiting);

    let speech = generate_sine_samples(440.0, 8_000, 0.3);
    assert_eq!(detector.push(&speech), DetectorEvent::Pending);
    assert_eq!(detector.state(), ListenState::Speaking);

    let DetectorEvent::Complete(phrase) = detector.push(&generate_silence(9_600)) else {
        panic!("expected the pause to end the phrase");
    };
    assert_eq!(phrase.len(), 16_000);
    assert!(rms(&phrase[..8_000]) > 0.2);
    assert!(phrase[8_000..].iter().all(|s| *s == 0.0));
}

#[test]
fn test_quiet_room_times_out() {
    let mut detector = UtteranceDetector::new(settings(), calibrated_threshold(&[]));

    let murmur = generate_sine_samples(220.0, 16_000, 0.01);
    assert_eq!(detector.push(&murmur), DetectorEvent::TimedOut);

    // The detector starts over for the next listen
    let speech = generate_sine_samples(440.0, 1_600, 0.3);
    assert_eq!(detector.push(&speech), DetectorEvent::Pending);
    assert_eq!(detector.state(), ListenState::Speaking);
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 1_600, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    // 44-byte header plus two bytes per sample
    assert_eq!(wav_data.len(), 44 + samples.len() * 2);
}

#[test]
fn test_wav_roundtrip() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples, [0, 16383, -16383, 32767, -32767, 8191]);
}

#[test]
fn test_decode_garbage_mp3() {
    let samples = decode_mp3(b"definitely not an mp3 stream").unwrap_or_default();
    assert!(samples.is_empty());
}
