//! Blocking frame loop.
//!
//! ## Pipeline stages (per assembled frame)
//!
//! ```text
//! 1. Drain ring buffer until one fixed-duration frame is complete
//! 2. Recorder buffers the raw frame (when session recording is on)
//! 3. Wake word detector sees the raw frame
//! 4. Noise gate conditions the frame (when constructed)
//! 5. Quality monitor computes metrics, invoking the VAD
//! 6. Broadcast FrameActivityEvent / WakeWordEvent
//! ```
//!
//! The entire loop runs on one blocking thread, which serializes every
//! component call — no component here has internal synchronization. On exit
//! the active recording (if any) is flushed on this thread, keeping the
//! blocking file write off the frame-delivery path.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{
    buffering::{Consumer, SampleConsumer},
    engine::FrontendConfig,
    events::{EngineStatus, EngineStatusEvent, FrameActivityEvent, WakeWordEvent},
    frame::AudioFrame,
    gate::NoiseGate,
    monitor::AudioQualityMonitor,
    recorder::SessionRecorder,
    wake::WakeWordDetector,
};

/// Sleep when the ring is empty (avoids busy-wait burning a core).
const SLEEP_EMPTY_MS: u64 = 5;

/// Shared counters updated by the pipeline thread, read from anywhere.
pub struct PipelineDiagnostics {
    pub frames_in: AtomicUsize,
    pub speech_frames: AtomicUsize,
    pub clipped_frames: AtomicUsize,
    pub wake_detections: AtomicUsize,
    pub recorded_frames: AtomicUsize,
    /// Capability flags, set once when the pipeline starts.
    pub strict_vad_active: AtomicBool,
    pub noise_gate_active: AtomicBool,
}

impl Default for PipelineDiagnostics {
    fn default() -> Self {
        Self {
            frames_in: AtomicUsize::new(0),
            speech_frames: AtomicUsize::new(0),
            clipped_frames: AtomicUsize::new(0),
            wake_detections: AtomicUsize::new(0),
            recorded_frames: AtomicUsize::new(0),
            strict_vad_active: AtomicBool::new(false),
            noise_gate_active: AtomicBool::new(false),
        }
    }
}

impl PipelineDiagnostics {
    pub fn reset(&self) {
        self.frames_in.store(0, Ordering::Relaxed);
        self.speech_frames.store(0, Ordering::Relaxed);
        self.clipped_frames.store(0, Ordering::Relaxed);
        self.wake_detections.store(0, Ordering::Relaxed);
        self.recorded_frames.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            frames_in: self.frames_in.load(Ordering::Relaxed),
            speech_frames: self.speech_frames.load(Ordering::Relaxed),
            clipped_frames: self.clipped_frames.load(Ordering::Relaxed),
            wake_detections: self.wake_detections.load(Ordering::Relaxed),
            recorded_frames: self.recorded_frames.load(Ordering::Relaxed),
            strict_vad_active: self.strict_vad_active.load(Ordering::Relaxed),
            noise_gate_active: self.noise_gate_active.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsSnapshot {
    pub frames_in: usize,
    pub speech_frames: usize,
    pub clipped_frames: usize,
    pub wake_detections: usize,
    pub recorded_frames: usize,
    pub strict_vad_active: bool,
    pub noise_gate_active: bool,
}

impl DiagnosticsSnapshot {
    /// `speech_frames / frames_in`, 0.0 before the first frame.
    pub fn speech_ratio(&self) -> f64 {
        if self.frames_in == 0 {
            return 0.0;
        }
        self.speech_frames as f64 / self.frames_in as f64
    }
}

/// All context the pipeline needs, passed as one struct so the closure in
/// `FrontendEngine::start` stays tidy and tests can drive `run` directly.
pub struct PipelineContext {
    pub config: FrontendConfig,
    pub gate: Option<NoiseGate>,
    pub monitor: AudioQualityMonitor,
    pub wake: WakeWordDetector,
    pub recorder: Option<SessionRecorder>,
    pub consumer: SampleConsumer,
    pub running: Arc<AtomicBool>,
    pub activity_tx: broadcast::Sender<FrameActivityEvent>,
    pub wake_tx: broadcast::Sender<WakeWordEvent>,
    pub status_tx: broadcast::Sender<EngineStatusEvent>,
    pub seq: Arc<AtomicU64>,
    pub diagnostics: Arc<PipelineDiagnostics>,
}

/// Run the blocking frame loop until `ctx.running` becomes false.
pub fn run(mut ctx: PipelineContext) {
    info!("frontend pipeline started");

    ctx.diagnostics
        .strict_vad_active
        .store(ctx.monitor.vad_enabled(), Ordering::Relaxed);
    ctx.diagnostics
        .noise_gate_active
        .store(ctx.gate.is_some(), Ordering::Relaxed);

    if let Some(recorder) = ctx.recorder.as_mut() {
        recorder.start();
    }

    let frame_samples = ctx.config.frame_samples();
    // Scratch buffer reused every iteration; `pending` holds samples that do
    // not yet fill a whole frame.
    let mut scratch = vec![0i16; frame_samples];
    let mut pending: Vec<i16> = Vec::with_capacity(frame_samples * 4);

    loop {
        if !ctx.running.load(Ordering::Relaxed) {
            break;
        }

        let n = ctx.consumer.pop_slice(&mut scratch);
        if n == 0 && pending.len() < frame_samples {
            std::thread::sleep(Duration::from_millis(SLEEP_EMPTY_MS));
            continue;
        }
        pending.extend_from_slice(&scratch[..n]);

        while pending.len() >= frame_samples {
            let frame = AudioFrame::new(pending.drain(..frame_samples).collect());
            process_frame(&mut ctx, frame);
        }
    }

    // Blocking file I/O stays off the frame path: an active recording is
    // flushed here, after the loop, on this thread.
    if let Some(recorder) = ctx.recorder.as_mut() {
        if let Some(path) = recorder.stop() {
            let _ = ctx.status_tx.send(EngineStatusEvent {
                status: EngineStatus::Stopped,
                detail: Some(format!("recording saved to {}", path.display())),
            });
        }
    }

    // The detector is not used past this point; release the engine handle.
    ctx.wake.cleanup();

    let stats = ctx.monitor.statistics();
    let snapshot = ctx.diagnostics.snapshot();
    info!(
        frames_in = snapshot.frames_in,
        speech_frames = snapshot.speech_frames,
        speech_ratio = stats.speech_ratio,
        clipped_frames = snapshot.clipped_frames,
        wake_detections = snapshot.wake_detections,
        recorded_frames = snapshot.recorded_frames,
        "frontend pipeline stopped"
    );
}

fn process_frame(ctx: &mut PipelineContext, frame: AudioFrame) {
    ctx.diagnostics.frames_in.fetch_add(1, Ordering::Relaxed);

    // Recorder and wake word detector consume the raw frame, independent of
    // the gate/VAD chain.
    if let Some(recorder) = ctx.recorder.as_mut() {
        recorder.add_frame(frame.clone());
        ctx.diagnostics
            .recorded_frames
            .fetch_add(1, Ordering::Relaxed);
    }

    if ctx.wake.process(&frame) {
        ctx.diagnostics
            .wake_detections
            .fetch_add(1, Ordering::Relaxed);
        let seq = ctx.seq.fetch_add(1, Ordering::Relaxed);
        let _ = ctx.wake_tx.send(WakeWordEvent { seq });
    }

    let conditioned = match ctx.gate.as_mut() {
        Some(gate) => gate.process(&frame),
        None => frame,
    };

    let metrics = ctx.monitor.calculate_metrics(&conditioned);
    // Both detection paths report zero confidence for non-speech frames, so
    // the boolean can be recovered from the metric.
    let is_speech = metrics.vad_confidence > 0.0;

    if is_speech {
        ctx.diagnostics.speech_frames.fetch_add(1, Ordering::Relaxed);
    }
    if metrics.clipping_detected {
        ctx.diagnostics.clipped_frames.fetch_add(1, Ordering::Relaxed);
    }

    let seq = ctx.seq.fetch_add(1, Ordering::Relaxed);
    let event = FrameActivityEvent {
        seq,
        rms: metrics.rms_level,
        peak: metrics.peak_level,
        is_speech,
        confidence: metrics.vad_confidence,
        clipping: metrics.clipping_detected,
    };
    let _ = ctx.activity_tx.send(event);

    if seq % 50 == 0 {
        debug!(
            rms = format_args!("{:.4}", metrics.rms_level),
            is_speech,
            latency_ms = format_args!("{:.2}", metrics.latency_ms),
            "frame level check"
        );
    }
}
