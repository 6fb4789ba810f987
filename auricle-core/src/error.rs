use thiserror::Error;

/// All errors produced by auricle-core.
///
/// Most of these never reach a caller of the public component API: the
/// front-end collapses per-call failures to a documented neutral result
/// (see the component docs). They exist so the degradation paths carry a
/// typed reason to the log rather than a bare string.
#[derive(Debug, Error)]
pub enum AuricleError {
    #[error("sample rate {rate} Hz is not supported by the strict detector (need 8/16/32/48 kHz)")]
    UnsupportedSampleRate { rate: u32 },

    #[error("VAD aggressiveness {0} is out of range (0-3)")]
    UnsupportedAggressiveness(u8),

    #[error("VAD engine error: {0}")]
    VadEngine(String),

    #[error("wake word engine error: {0}")]
    WakeEngine(String),

    #[error("recording persistence error: {0}")]
    Persistence(String),

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AuricleError>;
