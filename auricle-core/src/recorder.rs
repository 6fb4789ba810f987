//! Session recording to a mono 16-bit PCM WAV file.
//!
//! `stop()` performs blocking file I/O; call it off the real-time frame path
//! (the engine finalizes recordings on the pipeline thread after the frame
//! loop exits).

use std::mem;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, error, info};

use crate::error::{AuricleError, Result};
use crate::frame::AudioFrame;

/// Configuration for `SessionRecorder`.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Sample rate written into the WAV header. Default: 16000.
    pub sample_rate: u32,
    /// Directory recordings are saved under (created on demand).
    /// Default: `recordings`.
    pub output_dir: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            output_dir: PathBuf::from("recordings"),
        }
    }
}

/// Buffers frames while active and persists them on `stop()`.
///
/// State machine: `Idle -> Recording -> Idle`. Restarting while recording
/// discards the previous buffer; stopping with nothing buffered is a no-op.
/// Persistence failures are logged and reported as `None`, identical to
/// "nothing to save".
pub struct SessionRecorder {
    config: RecorderConfig,
    frames: Vec<AudioFrame>,
    start_time: Option<DateTime<Local>>,
    active: bool,
}

impl SessionRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            frames: Vec::new(),
            start_time: None,
            active: false,
        }
    }

    /// Begin a recording session, discarding any buffered frames from a
    /// session that was never stopped.
    pub fn start(&mut self) {
        if self.active {
            debug!(
                discarded_frames = self.frames.len(),
                "restarting recording, previous buffer discarded"
            );
        }
        self.active = true;
        self.frames.clear();
        self.start_time = Some(Local::now());
        info!("recording started");
    }

    /// Append one frame. A no-op unless a session is active.
    pub fn add_frame(&mut self, frame: AudioFrame) {
        if self.active {
            self.frames.push(frame);
        }
    }

    /// End the session and persist the buffer.
    ///
    /// Returns the written file path, or `None` when the buffer was empty or
    /// the write failed (logged). The buffer is cleared either way.
    pub fn stop(&mut self) -> Option<PathBuf> {
        self.active = false;
        let frames = mem::take(&mut self.frames);
        let started = self.start_time.take();

        if frames.is_empty() {
            debug!("stop with empty buffer, nothing to save");
            return None;
        }

        let started = started.unwrap_or_else(Local::now);
        let filename = format!("recording_{}.wav", started.format("%Y%m%d_%H%M%S"));
        let path = self.config.output_dir.join(filename);

        match write_wav(&path, &frames, self.config.sample_rate) {
            Ok(samples) => {
                let elapsed = Local::now().signed_duration_since(started);
                info!(
                    path = %path.display(),
                    frames = frames.len(),
                    samples,
                    duration_secs = elapsed.num_milliseconds() as f64 / 1000.0,
                    "recording saved"
                );
                Some(path)
            }
            Err(e) => {
                error!(error = %e, path = %path.display(), "failed to save recording");
                None
            }
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active
    }
}

/// Concatenate `frames` in arrival order into one mono PCM16 WAV file.
/// Returns the number of samples written.
fn write_wav(path: &Path, frames: &[AudioFrame], sample_rate: u32) -> Result<usize> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| AuricleError::Persistence(e.to_string()))?;

    let mut written = 0usize;
    for frame in frames {
        for &sample in &frame.samples {
            writer
                .write_sample(sample)
                .map_err(|e| AuricleError::Persistence(e.to_string()))?;
            written += 1;
        }
    }
    writer
        .finalize()
        .map_err(|e| AuricleError::Persistence(e.to_string()))?;
    Ok(written)
}
