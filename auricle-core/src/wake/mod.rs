//! Wake phrase spotting behind an optional Porcupine engine.
//!
//! The detector never surfaces an engine fault: construction problems leave
//! it permanently disabled (logged once), and per-call faults are logged and
//! reported as "not detected". Compiling without the `wake-word` feature is
//! equivalent to the engine being unavailable at runtime.

use tracing::info;

#[cfg(feature = "wake-word")]
use tracing::{debug, error, warn};

use crate::frame::AudioFrame;

#[cfg(feature = "wake-word")]
use crate::error::{AuricleError, Result};

#[cfg(feature = "wake-word")]
use porcupine::{BuiltinKeywords, Porcupine, PorcupineBuilder};

/// Configuration for `WakeWordDetector`.
#[derive(Debug, Clone)]
pub struct WakeWordConfig {
    /// Engine activation credential. Without one the detector stays disabled.
    pub access_key: Option<String>,
    /// Built-in phrases to spot. Default: `["porcupine"]`.
    pub keywords: Vec<String>,
}

impl Default for WakeWordConfig {
    fn default() -> Self {
        Self {
            access_key: None,
            keywords: vec!["porcupine".into()],
        }
    }
}

/// Keyword spotter for a fixed set of trigger phrases.
///
/// `cleanup()` releases the engine explicitly and is idempotent; dropping the
/// detector releases it as well.
pub struct WakeWordDetector {
    #[cfg(feature = "wake-word")]
    engine: Option<Porcupine>,
}

impl WakeWordDetector {
    /// Build a detector. Never fails; every construction problem (missing
    /// credential, unknown phrases, engine init failure) yields a disabled
    /// instance whose `process` always returns `false`.
    #[cfg(feature = "wake-word")]
    pub fn new(config: WakeWordConfig) -> Self {
        Self {
            engine: Self::init_engine(config),
        }
    }

    #[cfg(not(feature = "wake-word"))]
    pub fn new(config: WakeWordConfig) -> Self {
        if config.access_key.is_some() {
            info!("compiled without the wake-word feature; detection disabled");
        } else {
            info!("no wake word access key configured; detection disabled");
        }
        Self {}
    }

    #[cfg(feature = "wake-word")]
    fn init_engine(config: WakeWordConfig) -> Option<Porcupine> {
        let Some(access_key) = config.access_key else {
            info!("no wake word access key configured; detection disabled");
            return None;
        };

        let mut keywords = Vec::new();
        for phrase in &config.keywords {
            match builtin_keyword(phrase) {
                Some(keyword) => keywords.push(keyword),
                None => warn!(phrase = %phrase, "not a built-in wake phrase, skipping"),
            }
        }
        if keywords.is_empty() {
            warn!("no usable wake phrases configured; detection disabled");
            return None;
        }

        match build_engine(&access_key, &keywords) {
            Ok(engine) => {
                info!(
                    phrases = ?config.keywords,
                    frame_length = engine.frame_length(),
                    "wake word engine initialized"
                );
                Some(engine)
            }
            Err(e) => {
                warn!(error = %e, "wake word engine failed to initialize; detection disabled");
                None
            }
        }
    }

    /// Whether an engine is currently held. Disabled instances stay disabled.
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "wake-word")]
        {
            self.engine.is_some()
        }
        #[cfg(not(feature = "wake-word"))]
        {
            false
        }
    }

    /// Feed one frame. Returns `true` only when the engine reports a matched
    /// phrase; disabled instances and faulting calls return `false`.
    pub fn process(&mut self, frame: &AudioFrame) -> bool {
        #[cfg(feature = "wake-word")]
        {
            let Some(engine) = self.engine.as_ref() else {
                return false;
            };
            match engine.process(&frame.samples) {
                Ok(index) if index >= 0 => {
                    info!(keyword_index = index, "wake word detected");
                    true
                }
                Ok(_) => false,
                Err(e) => {
                    error!(error = ?e, "wake word engine call failed");
                    false
                }
            }
        }
        #[cfg(not(feature = "wake-word"))]
        {
            let _ = frame;
            false
        }
    }

    /// Release the engine handle. Idempotent; afterwards the detector behaves
    /// as if constructed without a credential.
    pub fn cleanup(&mut self) {
        #[cfg(feature = "wake-word")]
        {
            if self.engine.take().is_some() {
                debug!("wake word engine released");
            }
        }
    }
}

#[cfg(feature = "wake-word")]
fn build_engine(access_key: &str, keywords: &[BuiltinKeywords]) -> Result<Porcupine> {
    PorcupineBuilder::new_with_keywords(access_key, keywords)
        .init()
        .map_err(|e| AuricleError::WakeEngine(format!("{e:?}")))
}

/// Map a configured phrase onto the engine's built-in keyword set.
/// Comparison is case-insensitive and tolerant of hyphens.
#[cfg(feature = "wake-word")]
fn builtin_keyword(phrase: &str) -> Option<BuiltinKeywords> {
    match phrase.to_ascii_lowercase().replace('-', " ").trim() {
        "alexa" => Some(BuiltinKeywords::Alexa),
        "americano" => Some(BuiltinKeywords::Americano),
        "blueberry" => Some(BuiltinKeywords::Blueberry),
        "bumblebee" => Some(BuiltinKeywords::Bumblebee),
        "computer" => Some(BuiltinKeywords::Computer),
        "grapefruit" => Some(BuiltinKeywords::Grapefruit),
        "grasshopper" => Some(BuiltinKeywords::Grasshopper),
        "hey google" => Some(BuiltinKeywords::HeyGoogle),
        "hey siri" => Some(BuiltinKeywords::HeySiri),
        "jarvis" => Some(BuiltinKeywords::Jarvis),
        "ok google" => Some(BuiltinKeywords::OkGoogle),
        "picovoice" => Some(BuiltinKeywords::Picovoice),
        "porcupine" => Some(BuiltinKeywords::Porcupine),
        "terminator" => Some(BuiltinKeywords::Terminator),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_credential_every_frame_is_rejected() {
        let mut detector = WakeWordDetector::new(WakeWordConfig::default());
        assert!(!detector.is_enabled());

        assert!(!detector.process(&AudioFrame::default()));
        assert!(!detector.process(&AudioFrame::new(vec![0; 512])));
        assert!(!detector.process(&AudioFrame::new(vec![i16::MAX; 3])));
    }

    #[test]
    fn cleanup_is_idempotent() {
        let mut detector = WakeWordDetector::new(WakeWordConfig::default());
        detector.cleanup();
        detector.cleanup();
        assert!(!detector.is_enabled());
        assert!(!detector.process(&AudioFrame::new(vec![100; 512])));
    }

    #[cfg(feature = "wake-word")]
    #[test]
    fn bogus_credential_disables_detection() {
        let mut detector = WakeWordDetector::new(WakeWordConfig {
            access_key: Some("not-a-real-access-key".into()),
            keywords: vec!["porcupine".into()],
        });
        assert!(!detector.is_enabled());
        assert!(!detector.process(&AudioFrame::new(vec![0; 512])));
    }

    #[cfg(feature = "wake-word")]
    #[test]
    fn unknown_phrases_leave_detector_disabled() {
        let detector = WakeWordDetector::new(WakeWordConfig {
            access_key: Some("key".into()),
            keywords: vec!["open sesame".into()],
        });
        assert!(!detector.is_enabled());
    }

    #[cfg(feature = "wake-word")]
    #[test]
    fn builtin_phrase_lookup_is_case_and_hyphen_tolerant() {
        assert!(matches!(
            builtin_keyword("Porcupine"),
            Some(BuiltinKeywords::Porcupine)
        ));
        assert!(matches!(
            builtin_keyword("hey-google"),
            Some(BuiltinKeywords::HeyGoogle)
        ));
        assert!(matches!(
            builtin_keyword("OK GOOGLE"),
            Some(BuiltinKeywords::OkGoogle)
        ));
        assert!(builtin_keyword("open sesame").is_none());
    }
}
