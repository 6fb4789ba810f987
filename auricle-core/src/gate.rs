//! Noise gate driven by a per-frame envelope follower.
//!
//! ## Algorithm
//!
//! 1. Compute the normalized RMS of the incoming frame.
//! 2. Above threshold: step the envelope toward 1.0 by `(1 - env) / attack_samples`
//!    and open the gate.
//! 3. Below threshold: step toward 0.0 by `(0 - env) / release_samples`; once the
//!    envelope drops under 0.01 the gate reports closed.
//! 4. Scale every sample by the envelope and re-quantize to i16.
//!
//! The envelope moves a bounded amount per frame, so the gate fades rather
//! than chops. There is no lookahead and no click removal beyond the
//! smoothing itself.

use tracing::debug;

use crate::frame::{AudioFrame, PCM_SCALE};

/// Envelope level below which the gate reports closed.
const CLOSE_LEVEL: f32 = 0.01;

/// A stateful gate that attenuates low-level frames.
///
/// `process` never fails; its only side effect is the envelope update.
#[derive(Debug, Clone)]
pub struct NoiseGate {
    /// Linear amplitude threshold derived from the configured dB value.
    threshold: f32,
    /// Attack time expressed in samples, clamped to >= 1.
    attack_samples: usize,
    /// Release time expressed in samples, clamped to >= 1.
    release_samples: usize,
    /// Smoothed gain in [0.0, 1.0].
    envelope: f32,
    is_open: bool,
}

impl NoiseGate {
    pub const DEFAULT_THRESHOLD_DB: f32 = -45.0;
    pub const DEFAULT_ATTACK_MS: f32 = 5.0;
    pub const DEFAULT_RELEASE_MS: f32 = 150.0;

    /// Create a gate for a stream at `sample_rate`.
    ///
    /// `threshold_db` is converted to linear gain via `10^(db/20)`. Attack and
    /// release are converted to sample counts; both are clamped to a minimum
    /// of one sample so the envelope step is always defined.
    pub fn new(threshold_db: f32, attack_ms: f32, release_ms: f32, sample_rate: u32) -> Self {
        let threshold = 10f32.powf(threshold_db / 20.0);
        let to_samples = |ms: f32| ((sample_rate as f32 * ms / 1000.0) as usize).max(1);
        debug!(
            threshold_db,
            threshold,
            attack_samples = to_samples(attack_ms),
            release_samples = to_samples(release_ms),
            "noise gate configured"
        );
        Self {
            threshold,
            attack_samples: to_samples(attack_ms),
            release_samples: to_samples(release_ms),
            envelope: 0.0,
            is_open: false,
        }
    }

    /// Gate with the default threshold and timing for a stream at `sample_rate`.
    pub fn with_defaults(sample_rate: u32) -> Self {
        Self::new(
            Self::DEFAULT_THRESHOLD_DB,
            Self::DEFAULT_ATTACK_MS,
            Self::DEFAULT_RELEASE_MS,
            sample_rate,
        )
    }

    /// Apply the gate to one frame, returning a frame of identical length.
    pub fn process(&mut self, frame: &AudioFrame) -> AudioFrame {
        let rms = frame.rms_normalized();

        if rms > self.threshold {
            self.envelope += (1.0 - self.envelope) / self.attack_samples as f32;
            self.is_open = true;
        } else {
            self.envelope += (0.0 - self.envelope) / self.release_samples as f32;
            if self.envelope < CLOSE_LEVEL {
                self.is_open = false;
            }
        }

        let samples = frame
            .samples
            .iter()
            .map(|&s| {
                // Normalize, scale by the envelope, re-quantize with clipping
                // to the i16 range.
                let scaled = f32::from(s) / PCM_SCALE * self.envelope * PCM_SCALE;
                scaled.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
            })
            .collect();

        AudioFrame::new(samples)
    }

    /// Current envelope level in [0.0, 1.0].
    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    /// Whether the gate currently passes signal.
    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_frame(len: usize) -> AudioFrame {
        AudioFrame::new(vec![0i16; len])
    }

    fn loud_frame(amplitude: i16, len: usize) -> AudioFrame {
        let samples = (0..len)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect();
        AudioFrame::new(samples)
    }

    #[test]
    fn output_length_matches_input() {
        let mut gate = NoiseGate::with_defaults(16_000);
        for len in [0usize, 1, 160, 480] {
            assert_eq!(gate.process(&quiet_frame(len)).len(), len);
        }
    }

    #[test]
    fn starts_closed_and_stays_closed_on_silence() {
        let mut gate = NoiseGate::with_defaults(16_000);
        for _ in 0..100 {
            gate.process(&quiet_frame(160));
            assert!(!gate.is_open());
            assert!(gate.envelope() < CLOSE_LEVEL);
        }
    }

    #[test]
    fn loud_input_opens_gate_and_raises_envelope() {
        let mut gate = NoiseGate::with_defaults(16_000);
        let frame = loud_frame(8_000, 160);
        let mut previous = gate.envelope();
        for _ in 0..500 {
            gate.process(&frame);
            assert!(gate.is_open());
            assert!(gate.envelope() >= previous);
            assert!(gate.envelope() <= 1.0);
            previous = gate.envelope();
        }
        assert!(gate.envelope() > 0.9, "envelope={}", gate.envelope());
    }

    #[test]
    fn envelope_converges_below_close_level_on_sustained_silence() {
        let mut gate = NoiseGate::with_defaults(16_000);
        let loud = loud_frame(8_000, 16);
        for _ in 0..2_000 {
            gate.process(&loud);
        }
        assert!(gate.is_open());

        // Release: the envelope must only decay while input stays below
        // threshold, and eventually report closed.
        let quiet = quiet_frame(16);
        let mut previous = gate.envelope();
        let mut closed = false;
        for _ in 0..20_000 {
            gate.process(&quiet);
            assert!(gate.envelope() <= previous);
            previous = gate.envelope();
            if !gate.is_open() {
                closed = true;
                break;
            }
        }
        assert!(closed, "gate never closed, envelope={}", gate.envelope());
        assert!(gate.envelope() < CLOSE_LEVEL);
    }

    #[test]
    fn closed_gate_attenuates_signal() {
        let mut gate = NoiseGate::with_defaults(16_000);
        // First loud frame: the envelope has taken a single attack step
        // (1/80 at 16 kHz / 5 ms), so the output is strongly attenuated.
        let out = gate.process(&loud_frame(8_000, 160));
        let out_peak = out.peak_normalized();
        let in_peak = loud_frame(8_000, 160).peak_normalized();
        assert!(out_peak < in_peak * 0.05, "out_peak={out_peak}");
    }

    #[test]
    fn zero_length_timing_clamps_to_one_sample() {
        // attack_ms of 0 must not divide by zero; a single step reaches 1.0.
        let mut gate = NoiseGate::new(-45.0, 0.0, 0.0, 16_000);
        let frame = loud_frame(8_000, 160);
        let out = gate.process(&frame);
        assert_eq!(gate.envelope(), 1.0);
        assert_eq!(out, frame);
    }

    #[test]
    fn envelope_stays_within_unit_interval() {
        let mut gate = NoiseGate::new(-60.0, 1.0, 1.0, 8_000);
        for i in 0..200 {
            let frame = if i % 3 == 0 {
                quiet_frame(80)
            } else {
                loud_frame(12_000, 80)
            };
            gate.process(&frame);
            assert!((0.0..=1.0).contains(&gate.envelope()));
        }
    }
}
