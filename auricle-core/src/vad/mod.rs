//! Voice activity detection.
//!
//! Two strategies, chosen once at construction (capability) and once per call
//! (frame shape):
//!
//! - `StrictVad` (feature `strict-vad`): authoritative frame-exact engine,
//!   used only when it constructed successfully and the frame matches its
//!   exact expected size for the requested duration.
//! - `EnergyFallback`: RMS threshold on the int16 scale, always available,
//!   any frame length.
//!
//! Every internal strict-path failure is invisible to the caller: the call
//! transparently degrades to the fallback result for that frame.

pub mod energy;

#[cfg(feature = "strict-vad")]
pub mod strict;

pub use energy::EnergyFallback;

#[cfg(feature = "strict-vad")]
pub use strict::StrictVad;

use serde::Serialize;

#[cfg(feature = "strict-vad")]
use tracing::{info, warn};

use crate::frame::AudioFrame;

/// Per-frame speech decision plus confidence.
///
/// The strict engine reports 1.0 for speech and 0.0 otherwise (it exposes no
/// graded score); the fallback grades confidence by RMS and reports 0.0 for
/// every non-speech frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub is_speech: bool,
    /// In [0.0, 1.0].
    pub confidence: f32,
}

/// Configuration for `VoiceActivityDetector`.
#[derive(Debug, Clone)]
pub struct VadConfig {
    /// Stream sample rate in Hz. The strict engine requires 8/16/32/48 kHz;
    /// other rates degrade the detector to fallback-only. Default: 16000.
    pub sample_rate: u32,
    /// Strict engine filtering strength, 0-3. Default: 2.
    pub aggressiveness: u8,
    /// Fallback RMS threshold on the int16 scale. Default: 800.
    pub fallback_rms_threshold: f32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            aggressiveness: 2,
            fallback_rms_threshold: EnergyFallback::DEFAULT_RMS_THRESHOLD,
        }
    }
}

/// Speech detector with a strict primary path and an RMS fallback.
///
/// Owns the session's detection counters; they reset only when the instance
/// is recreated.
pub struct VoiceActivityDetector {
    sample_rate: u32,
    #[cfg(feature = "strict-vad")]
    strict: Option<StrictVad>,
    fallback: EnergyFallback,
    total_frames: u64,
    speech_frames: u64,
}

impl VoiceActivityDetector {
    /// Build a detector. Never fails: when the strict engine cannot be
    /// constructed (unsupported rate, bad aggressiveness, feature compiled
    /// out) the detector permanently uses the fallback, logged once here.
    pub fn new(config: VadConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            #[cfg(feature = "strict-vad")]
            strict: Self::init_strict(&config),
            fallback: EnergyFallback::new(config.fallback_rms_threshold),
            total_frames: 0,
            speech_frames: 0,
        }
    }

    #[cfg(feature = "strict-vad")]
    fn init_strict(config: &VadConfig) -> Option<StrictVad> {
        match StrictVad::new(config.sample_rate, config.aggressiveness) {
            Ok(engine) => {
                info!(
                    sample_rate = config.sample_rate,
                    aggressiveness = config.aggressiveness,
                    "strict VAD engine initialized"
                );
                Some(engine)
            }
            Err(e) => {
                warn!(error = %e, "strict VAD unavailable, degrading to RMS fallback");
                None
            }
        }
    }

    /// Classify one frame and update the counters.
    ///
    /// `frame_duration_ms` is the nominal duration of `frame`; the strict
    /// path is taken only for 10/20/30 ms frames whose length matches
    /// `sample_rate * duration / 1000` exactly.
    pub fn detect_speech(&mut self, frame: &AudioFrame, frame_duration_ms: u32) -> DetectionResult {
        let result = self.classify(frame, frame_duration_ms);
        self.total_frames += 1;
        if result.is_speech {
            self.speech_frames += 1;
        }
        result
    }

    fn classify(&mut self, frame: &AudioFrame, frame_duration_ms: u32) -> DetectionResult {
        if let Some(result) = self.try_strict(frame, frame_duration_ms) {
            return result;
        }
        self.fallback.detect(frame)
    }

    #[cfg(feature = "strict-vad")]
    fn try_strict(&mut self, frame: &AudioFrame, frame_duration_ms: u32) -> Option<DetectionResult> {
        let strict = self.strict.as_mut()?;
        if !strict.accepts(frame.len(), frame_duration_ms) {
            return None;
        }
        match strict.is_speech(&frame.samples) {
            Ok(is_speech) => Some(DetectionResult {
                is_speech,
                confidence: if is_speech { 1.0 } else { 0.0 },
            }),
            Err(e) => {
                warn!(error = %e, "strict VAD call failed, using RMS fallback for this frame");
                None
            }
        }
    }

    #[cfg(not(feature = "strict-vad"))]
    fn try_strict(&mut self, _frame: &AudioFrame, _frame_duration_ms: u32) -> Option<DetectionResult> {
        None
    }

    /// Whether the strict engine was successfully constructed. Static for the
    /// lifetime of the instance.
    pub fn strict_active(&self) -> bool {
        #[cfg(feature = "strict-vad")]
        {
            self.strict.is_some()
        }
        #[cfg(not(feature = "strict-vad"))]
        {
            false
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames classified so far (monotonic).
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Frames classified as speech so far (monotonic).
    pub fn speech_frames(&self) -> u64 {
        self.speech_frames
    }

    /// `speech_frames / total_frames`, or 0.0 before the first detection.
    pub fn speech_ratio(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.speech_frames as f64 / self.total_frames as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square_frame(amplitude: i16, len: usize) -> AudioFrame {
        let samples = (0..len)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect();
        AudioFrame::new(samples)
    }

    #[test]
    fn counters_track_every_detection() {
        let mut vad = VoiceActivityDetector::new(VadConfig::default());
        assert_eq!(vad.total_frames(), 0);
        assert_eq!(vad.speech_ratio(), 0.0);

        // Off-grid 100-sample frames always take the fallback path.
        vad.detect_speech(&square_frame(0, 100), 20);
        vad.detect_speech(&square_frame(4_000, 100), 20);
        vad.detect_speech(&square_frame(4_000, 100), 20);
        vad.detect_speech(&square_frame(0, 100), 20);

        assert_eq!(vad.total_frames(), 4);
        assert_eq!(vad.speech_frames(), 2);
        assert_abs_diff_eq!(vad.speech_ratio(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn shape_mismatch_uses_graded_fallback_confidence() {
        let mut vad = VoiceActivityDetector::new(VadConfig::default());
        // 100 samples cannot match any 16 kHz strict frame size, so the
        // result must carry the fallback's graded confidence, never the
        // strict engine's binary 1.0.
        let result = vad.detect_speech(&square_frame(1_000, 100), 20);
        assert!(result.is_speech);
        assert!(result.confidence > 0.0 && result.confidence < 1.0);
    }

    #[test]
    fn unsupported_rate_degrades_to_fallback_only() {
        let mut vad = VoiceActivityDetector::new(VadConfig {
            sample_rate: 44_100,
            ..VadConfig::default()
        });
        assert!(!vad.strict_active());

        // Even an exactly-sized 20 ms frame (882 samples at 44.1 kHz) is
        // classified by RMS.
        let result = vad.detect_speech(&square_frame(1_000, 882), 20);
        assert!(result.is_speech);
        assert!(result.confidence < 1.0);
        assert_eq!(vad.total_frames(), 1);
    }

    #[test]
    fn empty_frame_is_silence() {
        let mut vad = VoiceActivityDetector::new(VadConfig::default());
        let result = vad.detect_speech(&AudioFrame::default(), 20);
        assert!(!result.is_speech);
        assert_eq!(result.confidence, 0.0);
    }

    #[cfg(feature = "strict-vad")]
    #[test]
    fn quiet_exact_frame_through_strict_engine_reports_silence() {
        // 16 kHz, 20 ms -> exactly 320 samples: the strict engine is
        // authoritative and a silent frame yields (false, 0.0) while only
        // total_frames advances.
        let mut vad = VoiceActivityDetector::new(VadConfig::default());
        assert!(vad.strict_active());

        let result = vad.detect_speech(&square_frame(0, 320), 20);
        assert!(!result.is_speech);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(vad.total_frames(), 1);
        assert_eq!(vad.speech_frames(), 0);
    }

    #[cfg(feature = "strict-vad")]
    #[test]
    fn strict_confidence_is_binary() {
        let mut vad = VoiceActivityDetector::new(VadConfig::default());
        let result = vad.detect_speech(&square_frame(6_000, 320), 20);
        // Whatever the engine decides for a synthetic square wave, the
        // reported confidence must be exactly 0.0 or 1.0 on the strict path.
        assert!(result.confidence == 0.0 || result.confidence == 1.0);
        assert_eq!(result.is_speech, result.confidence == 1.0);
    }
}
