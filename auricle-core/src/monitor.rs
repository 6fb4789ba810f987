//! Per-frame quality metrics and session statistics.

use std::time::Instant;

use serde::Serialize;

use crate::frame::AudioFrame;
use crate::vad::{DetectionResult, VoiceActivityDetector};

/// Normalized peak above which a frame counts as clipped.
pub const CLIPPING_PEAK_THRESHOLD: f32 = 0.99;

/// Quality metrics for a single frame. Created fresh per call.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetrics {
    /// RMS level normalized to [0.0, 1.0].
    pub rms_level: f32,
    /// Largest absolute sample, normalized to [0.0, 1.0].
    pub peak_level: f32,
    /// Milliseconds since the previous `calculate_metrics` call on this
    /// monitor (since construction for the first call).
    ///
    /// This measures the caller's processing cadence between metric reads,
    /// NOT capture-to-ear hardware latency. Downstream consumers rely on
    /// the cadence semantics; do not redefine it.
    pub latency_ms: f64,
    /// Confidence from the detector's classification of this frame, [0.0, 1.0].
    pub vad_confidence: f32,
    /// True when `peak_level` exceeds [`CLIPPING_PEAK_THRESHOLD`].
    pub clipping_detected: bool,
}

/// Aggregated session statistics surfaced to observability/UI layers.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendStats {
    pub total_frames: u64,
    pub speech_frames: u64,
    /// `speech_frames / total_frames`, 0.0 before the first detection.
    pub speech_ratio: f64,
    /// Whether the strict VAD engine constructed successfully.
    pub vad_enabled: bool,
    /// Whether a noise gate was constructed for this session.
    pub noise_gate_enabled: bool,
}

/// Derives per-frame metrics and aggregates session statistics.
///
/// Owns the session's `VoiceActivityDetector` so the detection counters and
/// the metrics stay on one instance (recreate the monitor to reset them).
pub struct AudioQualityMonitor {
    vad: VoiceActivityDetector,
    noise_gate_enabled: bool,
    default_frame_duration_ms: u32,
    last_call: Instant,
}

impl AudioQualityMonitor {
    /// `noise_gate_enabled` records whether the session's gate was
    /// constructed; it is static for the monitor's lifetime.
    pub fn new(
        vad: VoiceActivityDetector,
        noise_gate_enabled: bool,
        default_frame_duration_ms: u32,
    ) -> Self {
        Self {
            vad,
            noise_gate_enabled,
            default_frame_duration_ms,
            last_call: Instant::now(),
        }
    }

    /// Classify one frame, delegating to the owned detector.
    pub fn detect_speech(&mut self, frame: &AudioFrame, frame_duration_ms: u32) -> DetectionResult {
        self.vad.detect_speech(frame, frame_duration_ms)
    }

    /// Compute quality metrics for one frame.
    ///
    /// Invokes the detector with the monitor's default frame duration, so
    /// every call also advances the detection counters.
    pub fn calculate_metrics(&mut self, frame: &AudioFrame) -> AudioMetrics {
        let rms_level = frame.rms_normalized();
        let peak_level = frame.peak_normalized();
        let clipping_detected = peak_level > CLIPPING_PEAK_THRESHOLD;

        let detection = self.vad.detect_speech(frame, self.default_frame_duration_ms);

        let now = Instant::now();
        let latency_ms = now.duration_since(self.last_call).as_secs_f64() * 1000.0;
        self.last_call = now;

        AudioMetrics {
            rms_level,
            peak_level,
            latency_ms,
            vad_confidence: detection.confidence,
            clipping_detected,
        }
    }

    /// Snapshot of the session statistics.
    pub fn statistics(&self) -> FrontendStats {
        FrontendStats {
            total_frames: self.vad.total_frames(),
            speech_frames: self.vad.speech_frames(),
            speech_ratio: self.vad.speech_ratio(),
            vad_enabled: self.vad.strict_active(),
            noise_gate_enabled: self.noise_gate_enabled,
        }
    }

    pub fn vad_enabled(&self) -> bool {
        self.vad.strict_active()
    }

    pub fn noise_gate_enabled(&self) -> bool {
        self.noise_gate_enabled
    }
}
