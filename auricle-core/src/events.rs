//! Event types broadcast by the frontend engine.
//!
//! Field names serialize in camelCase so orchestration/UI consumers can take
//! the payloads as-is.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Frame activity events
// ---------------------------------------------------------------------------

/// Emitted once per processed frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameActivityEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Normalized RMS level of the conditioned frame, [0.0, 1.0].
    pub rms: f32,
    /// Normalized peak level, [0.0, 1.0].
    pub peak: f32,
    /// Speech decision for this frame.
    pub is_speech: bool,
    /// Detection confidence, [0.0, 1.0].
    pub confidence: f32,
    /// Whether the frame contained a near-full-scale sample.
    pub clipping: bool,
}

// ---------------------------------------------------------------------------
// Wake word events
// ---------------------------------------------------------------------------

/// Emitted when the wake word detector reports a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WakeWordEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
}

// ---------------------------------------------------------------------------
// Engine status events
// ---------------------------------------------------------------------------

/// Emitted when the engine state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatusEvent {
    pub status: EngineStatus,
    /// Optional human-readable detail (e.g. the path of a saved recording).
    pub detail: Option<String>,
}

/// Current state of the frontend engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    /// Engine created but `start()` not yet called.
    Idle,
    /// Actively consuming frames.
    Listening,
    /// Frame loop stopped; the engine may be restarted.
    Stopped,
    /// Unrecoverable error.
    Error,
}
