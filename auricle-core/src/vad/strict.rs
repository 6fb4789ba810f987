//! Strict frame-exact detector backed by the WebRTC VAD engine.
//!
//! The engine only accepts mono PCM16 at 8/16/32/48 kHz in frames of exactly
//! 10, 20 or 30 ms. Anything else must be routed to the fallback by the
//! caller; `accepts` is the cheap pre-flight check for that.

use webrtc_vad::{SampleRate, Vad, VadMode};

use crate::error::{AuricleError, Result};

/// Sample rates the engine supports.
pub const STRICT_SAMPLE_RATES: [u32; 4] = [8_000, 16_000, 32_000, 48_000];

/// Frame durations (ms) the engine supports.
pub const STRICT_FRAME_DURATIONS_MS: [u32; 3] = [10, 20, 30];

/// Wrapper around one WebRTC VAD instance bound to a single sample rate.
pub struct StrictVad {
    engine: Vad,
    sample_rate: u32,
}

impl StrictVad {
    /// Construct the engine for `sample_rate` at the given aggressiveness
    /// (0 = most permissive, 3 = most aggressive filtering).
    ///
    /// # Errors
    /// `UnsupportedSampleRate` / `UnsupportedAggressiveness` when the engine
    /// cannot serve the requested configuration. Callers treat either as a
    /// permanent capability failure and degrade to the fallback detector.
    pub fn new(sample_rate: u32, aggressiveness: u8) -> Result<Self> {
        let rate = match sample_rate {
            8_000 => SampleRate::Rate8kHz,
            16_000 => SampleRate::Rate16kHz,
            32_000 => SampleRate::Rate32kHz,
            48_000 => SampleRate::Rate48kHz,
            rate => return Err(AuricleError::UnsupportedSampleRate { rate }),
        };
        let mode = match aggressiveness {
            0 => VadMode::Quality,
            1 => VadMode::LowBitrate,
            2 => VadMode::Aggressive,
            3 => VadMode::VeryAggressive,
            out_of_range => return Err(AuricleError::UnsupportedAggressiveness(out_of_range)),
        };
        Ok(Self {
            engine: Vad::new_with_rate_and_mode(rate, mode),
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Exact sample count the engine expects for `frame_duration_ms`, or
    /// `None` when the duration itself is off-grid.
    pub fn expected_samples(&self, frame_duration_ms: u32) -> Option<usize> {
        if !STRICT_FRAME_DURATIONS_MS.contains(&frame_duration_ms) {
            return None;
        }
        Some(self.sample_rate as usize * frame_duration_ms as usize / 1000)
    }

    /// Whether a frame of `frame_len` samples at `frame_duration_ms` can be
    /// handed to the engine as-is.
    pub fn accepts(&self, frame_len: usize, frame_duration_ms: u32) -> bool {
        self.expected_samples(frame_duration_ms) == Some(frame_len)
    }

    /// Run the engine on an exactly-sized frame.
    ///
    /// # Errors
    /// `VadEngine` when the engine rejects the call; callers fall back to the
    /// RMS detector for that frame.
    pub fn is_speech(&mut self, samples: &[i16]) -> Result<bool> {
        self.engine
            .is_voice_segment(samples)
            .map_err(|_| AuricleError::VadEngine("engine rejected frame".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_for_every_supported_rate_and_mode() {
        for rate in STRICT_SAMPLE_RATES {
            for aggressiveness in 0..=3u8 {
                assert!(
                    StrictVad::new(rate, aggressiveness).is_ok(),
                    "rate={rate} aggressiveness={aggressiveness}"
                );
            }
        }
    }

    #[test]
    fn rejects_unsupported_sample_rate() {
        assert!(matches!(
            StrictVad::new(44_100, 2),
            Err(AuricleError::UnsupportedSampleRate { rate: 44_100 })
        ));
    }

    #[test]
    fn rejects_out_of_range_aggressiveness() {
        assert!(matches!(
            StrictVad::new(16_000, 4),
            Err(AuricleError::UnsupportedAggressiveness(4))
        ));
    }

    #[test]
    fn expected_samples_covers_the_duration_grid() {
        let vad = StrictVad::new(16_000, 2).expect("construct engine");
        assert_eq!(vad.expected_samples(10), Some(160));
        assert_eq!(vad.expected_samples(20), Some(320));
        assert_eq!(vad.expected_samples(30), Some(480));
        assert_eq!(vad.expected_samples(25), None);
        assert!(vad.accepts(320, 20));
        assert!(!vad.accepts(321, 20));
        assert!(!vad.accepts(320, 25));
    }

    #[test]
    fn silence_frame_is_not_speech() {
        let mut vad = StrictVad::new(16_000, 2).expect("construct engine");
        let frame = vec![0i16; 320];
        assert_eq!(vad.is_speech(&frame).expect("engine call"), false);
    }

    #[test]
    fn wrong_length_frame_is_an_engine_error() {
        let mut vad = StrictVad::new(16_000, 2).expect("construct engine");
        let frame = vec![0i16; 100];
        assert!(vad.is_speech(&frame).is_err());
    }
}
