//! `FrontendEngine` — top-level lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! FrontendEngine::new()
//!     └─► start()   → ring created, pipeline spawned, status = Listening,
//!         │           returns the producer half to the capture layer
//!         └─► stop() → running=false, pipeline drains + flushes recording,
//!                      status = Stopped
//! ```
//!
//! `start()`/`stop()` are the only operations in this crate that return an
//! error to the caller, and only for lifecycle misuse (`AlreadyRunning` /
//! `NotRunning`). Everything per-frame degrades to neutral values instead.
//!
//! ## Threading
//!
//! The strict VAD engine handle is not `Send`, so every component is
//! constructed *inside* the `spawn_blocking` closure and lives on the
//! pipeline thread. That single thread serializes all component calls; the
//! engine handle itself is `Send + Sync` and can be shared freely.

pub mod pipeline;

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::info;

use crate::{
    buffering::{create_sample_ring, SampleProducer},
    error::{AuricleError, Result},
    events::{EngineStatus, EngineStatusEvent, FrameActivityEvent, WakeWordEvent},
    gate::NoiseGate,
    monitor::AudioQualityMonitor,
    recorder::{RecorderConfig, SessionRecorder},
    vad::{VadConfig, VoiceActivityDetector},
    wake::{WakeWordConfig, WakeWordDetector},
};

/// Broadcast channel capacity: events buffered for slow consumers.
const BROADCAST_CAP: usize = 256;

/// Configuration for `FrontendEngine`.
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    /// Stream sample rate in Hz. Default: 16000.
    pub sample_rate: u32,
    /// Nominal frame duration the pipeline assembles from the ring.
    /// 10/20/30 ms keep the strict VAD engaged; other values run the
    /// detection on the RMS fallback. Default: 30.
    pub frame_duration_ms: u32,
    /// Strict VAD filtering strength, 0-3. Default: 2.
    pub vad_aggressiveness: u8,
    /// Fallback detector RMS threshold on the int16 scale. Default: 800.
    pub fallback_rms_threshold: f32,
    /// Whether to condition frames with a noise gate. Default: true.
    pub enable_noise_gate: bool,
    /// Gate threshold in dBFS. Default: -40.
    pub noise_gate_threshold_db: f32,
    /// Gate attack time in ms. Default: 5.
    pub attack_ms: f32,
    /// Gate release time in ms. Default: 150.
    pub release_ms: f32,
    /// Wake word engine credential. `None` disables wake word detection.
    pub wake_access_key: Option<String>,
    /// Built-in wake phrases. Default: `["porcupine"]`.
    pub wake_keywords: Vec<String>,
    /// Whether the pipeline records the raw session to a WAV file.
    /// Default: false.
    pub record_session: bool,
    /// Directory recordings are saved under. Default: `recordings`.
    pub recordings_dir: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            frame_duration_ms: 30,
            vad_aggressiveness: 2,
            fallback_rms_threshold: 800.0,
            enable_noise_gate: true,
            noise_gate_threshold_db: -40.0,
            attack_ms: NoiseGate::DEFAULT_ATTACK_MS,
            release_ms: NoiseGate::DEFAULT_RELEASE_MS,
            wake_access_key: None,
            wake_keywords: vec!["porcupine".into()],
            record_session: false,
            recordings_dir: PathBuf::from("recordings"),
        }
    }
}

impl FrontendConfig {
    /// Samples per assembled frame, clamped to >= 1.
    pub fn frame_samples(&self) -> usize {
        (self.sample_rate as usize * self.frame_duration_ms as usize / 1000).max(1)
    }
}

/// The top-level engine handle.
///
/// `FrontendEngine` is `Send + Sync` — all fields use interior mutability.
/// Wrap in `Arc<FrontendEngine>` to share between the orchestration layer
/// and event-forwarding tasks.
pub struct FrontendEngine {
    config: FrontendConfig,
    /// `true` while the pipeline is active.
    running: Arc<AtomicBool>,
    /// Canonical status (read from commands, written on transitions).
    status: Arc<Mutex<EngineStatus>>,
    activity_tx: broadcast::Sender<FrameActivityEvent>,
    wake_tx: broadcast::Sender<WakeWordEvent>,
    status_tx: broadcast::Sender<EngineStatusEvent>,
    /// Monotonically increasing event sequence counter.
    seq: Arc<AtomicU64>,
    /// Shared pipeline diagnostics counters.
    diagnostics: Arc<pipeline::PipelineDiagnostics>,
}

impl FrontendEngine {
    /// Create a new engine. Does not consume frames until `start()`.
    pub fn new(config: FrontendConfig) -> Self {
        let (activity_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (wake_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (status_tx, _) = broadcast::channel(BROADCAST_CAP);

        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(EngineStatus::Idle)),
            activity_tx,
            wake_tx,
            status_tx,
            seq: Arc::new(AtomicU64::new(0)),
            diagnostics: Arc::new(pipeline::PipelineDiagnostics::default()),
        }
    }

    /// Start the pipeline and hand the ring's producer half to the caller.
    ///
    /// The capture layer pushes raw mono PCM16 samples into the returned
    /// producer; the pipeline assembles them into fixed-duration frames on a
    /// background blocking thread. Must be called within a Tokio runtime.
    ///
    /// # Errors
    /// `AuricleError::AlreadyRunning` if already started.
    pub fn start(&self) -> Result<SampleProducer> {
        if self.running.load(Ordering::SeqCst) {
            return Err(AuricleError::AlreadyRunning);
        }

        self.diagnostics.reset();
        self.running.store(true, Ordering::SeqCst);

        let (producer, consumer) = create_sample_ring();

        let config = self.config.clone();
        let running = Arc::clone(&self.running);
        let activity_tx = self.activity_tx.clone();
        let wake_tx = self.wake_tx.clone();
        let status_tx = self.status_tx.clone();
        let seq = Arc::clone(&self.seq);
        let diagnostics = Arc::clone(&self.diagnostics);

        tokio::task::spawn_blocking(move || {
            // Components are built here so non-Send engine handles never
            // cross a thread boundary.
            let gate = config.enable_noise_gate.then(|| {
                NoiseGate::new(
                    config.noise_gate_threshold_db,
                    config.attack_ms,
                    config.release_ms,
                    config.sample_rate,
                )
            });
            let vad = VoiceActivityDetector::new(VadConfig {
                sample_rate: config.sample_rate,
                aggressiveness: config.vad_aggressiveness,
                fallback_rms_threshold: config.fallback_rms_threshold,
            });
            let monitor = AudioQualityMonitor::new(vad, gate.is_some(), config.frame_duration_ms);
            let wake = WakeWordDetector::new(WakeWordConfig {
                access_key: config.wake_access_key.clone(),
                keywords: config.wake_keywords.clone(),
            });
            let recorder = config.record_session.then(|| {
                SessionRecorder::new(RecorderConfig {
                    sample_rate: config.sample_rate,
                    output_dir: config.recordings_dir.clone(),
                })
            });

            pipeline::run(pipeline::PipelineContext {
                config,
                gate,
                monitor,
                wake,
                recorder,
                consumer,
                running,
                activity_tx,
                wake_tx,
                status_tx,
                seq,
                diagnostics,
            });
        });

        self.set_status(EngineStatus::Listening, None);
        info!("frontend engine started");
        Ok(producer)
    }

    /// Stop the pipeline.
    ///
    /// Returns as soon as the flag is flipped; the pipeline thread finishes
    /// its current frame, flushes any active recording and exits.
    ///
    /// # Errors
    /// `AuricleError::NotRunning` if not currently running.
    pub fn stop(&self) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(AuricleError::NotRunning);
        }

        self.running.store(false, Ordering::SeqCst);
        self.set_status(EngineStatus::Stopped, None);
        info!("frontend engine stop requested");
        Ok(())
    }

    /// Current engine status (snapshot).
    pub fn status(&self) -> EngineStatus {
        *self.status.lock()
    }

    /// Subscribe to per-frame activity events.
    pub fn subscribe_activity(&self) -> broadcast::Receiver<FrameActivityEvent> {
        self.activity_tx.subscribe()
    }

    /// Subscribe to wake word detections.
    pub fn subscribe_wake(&self) -> broadcast::Receiver<WakeWordEvent> {
        self.wake_tx.subscribe()
    }

    /// Subscribe to status change events.
    pub fn subscribe_status(&self) -> broadcast::Receiver<EngineStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Snapshot of pipeline counters for observability.
    pub fn diagnostics_snapshot(&self) -> pipeline::DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn set_status(&self, new_status: EngineStatus, detail: Option<String>) {
        *self.status.lock() = new_status;
        let _ = self.status_tx.send(EngineStatusEvent {
            status: new_status,
            detail,
        });
    }
}
