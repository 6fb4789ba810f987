//! RMS fallback detector on the raw int16 scale.
//!
//! Always available: no engine, no frame-shape requirements. Used whenever
//! the strict detector is absent or a frame does not match its exact size.

use crate::frame::AudioFrame;
use crate::vad::DetectionResult;

/// Energy-based speech detector.
///
/// `is_speech` is a plain RMS threshold test; confidence grades linearly
/// with RMS and saturates at twice the threshold. Non-speech frames always
/// report zero confidence.
#[derive(Debug, Clone)]
pub struct EnergyFallback {
    /// RMS threshold on the int16 scale (not normalized).
    rms_threshold: f32,
}

impl EnergyFallback {
    /// Default threshold on the int16 scale. Frames quieter than this are
    /// treated as background.
    pub const DEFAULT_RMS_THRESHOLD: f32 = 800.0;

    pub fn new(rms_threshold: f32) -> Self {
        Self { rms_threshold }
    }

    /// Classify one frame. Empty frames have RMS 0 and are never speech.
    pub fn detect(&self, frame: &AudioFrame) -> DetectionResult {
        let rms = frame.rms_i16();
        let is_speech = rms > self.rms_threshold;
        let confidence = if is_speech {
            (rms / (2.0 * self.rms_threshold)).min(1.0)
        } else {
            0.0
        };
        DetectionResult {
            is_speech,
            confidence,
        }
    }
}

impl Default for EnergyFallback {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RMS_THRESHOLD)
    }
}
