//! Typed PCM16 audio frame passed between front-end components.

/// Divisor used when normalizing i16 PCM to the [-1.0, 1.0] float scale.
pub const PCM_SCALE: f32 = 32768.0;

/// A fixed-duration block of mono 16-bit signed PCM samples.
///
/// Frames are value data: components borrow them for the duration of a call
/// and never retain them (the recorder clones what it buffers). The sample
/// rate is a property of the stream, configured on each component, not
/// carried per frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioFrame {
    /// Mono i16 PCM samples.
    pub samples: Vec<i16>,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// Build a frame from a raw little-endian PCM16 byte stream (the capture
    /// boundary format). A trailing odd byte is ignored.
    pub fn from_pcm_bytes(bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self { samples }
    }

    /// Serialize back to little-endian PCM16 bytes.
    pub fn to_pcm_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of this frame at the given stream sample rate.
    pub fn duration_ms(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 * 1000.0 / sample_rate as f64
    }

    /// Root-mean-square amplitude on the raw int16 scale (0..32768).
    ///
    /// Empty frames report 0.
    pub fn rms_i16(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self
            .samples
            .iter()
            .map(|&s| {
                let s = f64::from(s);
                s * s
            })
            .sum();
        (sum_sq / self.samples.len() as f64).sqrt() as f32
    }

    /// Root-mean-square amplitude on the normalized [0, 1] scale.
    pub fn rms_normalized(&self) -> f32 {
        self.rms_i16() / PCM_SCALE
    }

    /// Largest absolute sample on the normalized [0, 1] scale.
    ///
    /// `i16::MIN` normalizes to exactly 1.0.
    pub fn peak_normalized(&self) -> f32 {
        self.samples
            .iter()
            .map(|&s| (f32::from(s) / PCM_SCALE).abs())
            .fold(0.0, f32::max)
    }
}

impl From<Vec<i16>> for AudioFrame {
    fn from(samples: Vec<i16>) -> Self {
        Self::new(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn pcm_bytes_round_trip() {
        let frame = AudioFrame::new(vec![0, 1, -1, i16::MAX, i16::MIN, 12345]);
        let bytes = frame.to_pcm_bytes();
        assert_eq!(bytes.len(), 12);
        assert_eq!(AudioFrame::from_pcm_bytes(&bytes), frame);
    }

    #[test]
    fn trailing_odd_byte_is_ignored() {
        let frame = AudioFrame::from_pcm_bytes(&[0x34, 0x12, 0xff]);
        assert_eq!(frame.samples, vec![0x1234]);
    }

    #[test]
    fn empty_frame_has_zero_rms_and_peak() {
        let frame = AudioFrame::default();
        assert_eq!(frame.rms_i16(), 0.0);
        assert_eq!(frame.rms_normalized(), 0.0);
        assert_eq!(frame.peak_normalized(), 0.0);
    }

    #[test]
    fn rms_of_square_wave() {
        // A ±1000 square wave has RMS exactly 1000 on the int16 scale.
        let samples: Vec<i16> = (0..256).map(|i| if i % 2 == 0 { 1000 } else { -1000 }).collect();
        let frame = AudioFrame::new(samples);
        assert_abs_diff_eq!(frame.rms_i16(), 1000.0, epsilon = 1e-3);
        assert_abs_diff_eq!(frame.rms_normalized(), 1000.0 / PCM_SCALE, epsilon = 1e-6);
    }

    #[test]
    fn peak_of_full_scale_negative_sample_is_one() {
        let frame = AudioFrame::new(vec![0, -300, i16::MIN]);
        assert_eq!(frame.peak_normalized(), 1.0);
    }

    #[test]
    fn duration_follows_sample_rate() {
        let frame = AudioFrame::new(vec![0; 320]);
        assert_abs_diff_eq!(frame.duration_ms(16_000), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(frame.duration_ms(8_000), 40.0, epsilon = 1e-9);
        assert_eq!(frame.duration_ms(0), 0.0);
    }
}
