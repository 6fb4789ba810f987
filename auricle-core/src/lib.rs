//! # auricle-core
//!
//! Audio front-end for a voice-assistant pipeline: gates background noise,
//! decides per-frame whether speech is present, tracks streaming audio
//! quality, optionally spots a wake phrase and records sessions to WAV.
//!
//! ## Architecture
//!
//! ```text
//! Capture layer → SPSC RingBuffer → Pipeline(spawn_blocking)
//!                                        │
//!                        ┌───────────────┼───────────────┐
//!                  SessionRecorder  WakeWordDetector  NoiseGate
//!                                                        │
//!                                              AudioQualityMonitor
//!                                               (VoiceActivityDetector)
//!                                                        │
//!                                        broadcast::Sender<FrameActivityEvent>
//! ```
//!
//! Device capture, transport and the conversational backend live outside
//! this crate; it consumes raw mono PCM16 frames and produces booleans,
//! confidences and metrics.
//!
//! Every component degrades rather than fails: a missing strict VAD engine
//! falls back to RMS detection, a missing wake word credential disables
//! spotting, and a failed recording write reports "nothing saved". The only
//! caller-visible errors are engine lifecycle misuse.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod buffering;
pub mod engine;
pub mod error;
pub mod events;
pub mod frame;
pub mod gate;
pub mod monitor;
pub mod recorder;
pub mod vad;
pub mod wake;

// Convenience re-exports for downstream crates
pub use engine::{FrontendConfig, FrontendEngine};
pub use error::AuricleError;
pub use events::{EngineStatus, EngineStatusEvent, FrameActivityEvent, WakeWordEvent};
pub use frame::AudioFrame;
pub use gate::NoiseGate;
pub use monitor::{AudioMetrics, AudioQualityMonitor, FrontendStats};
pub use recorder::{RecorderConfig, SessionRecorder};
pub use vad::{DetectionResult, VadConfig, VoiceActivityDetector};
pub use wake::{WakeWordConfig, WakeWordDetector};

#[cfg(feature = "strict-vad")]
pub use vad::StrictVad;
