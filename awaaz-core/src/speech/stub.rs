//! `StubSynthesizer` — deterministic backend that records utterances
//! instead of producing audio.
//!
//! Used by the daemon until a platform voice backend lands, and by every
//! test that needs to observe what would have been spoken. Failure modes
//! (init failure, speak rejection) and a synthetic init delay are
//! injectable so the pipeline's buffered path can be exercised end-to-end.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{AwaazError, Result};
use crate::speech::{SpeechSynthesizer, UtteranceListener};

/// One utterance as the stub would have spoken it.
#[derive(Debug, Clone)]
pub struct SpokenUtterance {
    pub utterance_id: String,
    pub text: String,
    pub locale_tag: String,
    /// Output gain at speak time (0.0 for the warm-up).
    pub volume: f32,
}

/// Recording stub backend.
pub struct StubSynthesizer {
    initialized: bool,
    fail_init: bool,
    fail_speak: bool,
    init_delay: Duration,
    speech_rate: f32,
    pitch: f32,
    volume: f32,
    locale_tag: String,
    listener: Option<Arc<dyn UtteranceListener>>,
    log: Arc<Mutex<Vec<SpokenUtterance>>>,
}

impl StubSynthesizer {
    pub fn new() -> Self {
        Self {
            initialized: false,
            fail_init: false,
            fail_speak: false,
            init_delay: Duration::ZERO,
            speech_rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            locale_tag: "en".to_string(),
            listener: None,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Stub whose `initialize` sleeps for `delay` first, simulating a slow
    /// engine startup.
    pub fn with_init_delay(delay: Duration) -> Self {
        Self {
            init_delay: delay,
            ..Self::new()
        }
    }

    /// Stub whose `initialize` always fails.
    pub fn failing_init() -> Self {
        Self {
            fail_init: true,
            ..Self::new()
        }
    }

    /// Stub whose `speak_flush` always errors (after firing `on_error`).
    pub fn failing_speak() -> Self {
        Self {
            fail_speak: true,
            ..Self::new()
        }
    }

    /// Shared utterance log. Clone before handing the stub to a
    /// [`crate::speech::SynthHandle`].
    pub fn utterance_log(&self) -> Arc<Mutex<Vec<SpokenUtterance>>> {
        Arc::clone(&self.log)
    }
}

impl Default for StubSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSynthesizer for StubSynthesizer {
    fn initialize(&mut self) -> Result<()> {
        if !self.init_delay.is_zero() {
            std::thread::sleep(self.init_delay);
        }
        if self.fail_init {
            return Err(AwaazError::EngineInit("stub configured to fail".into()));
        }
        self.initialized = true;
        debug!("StubSynthesizer initialized");
        Ok(())
    }

    fn set_speech_rate(&mut self, rate: f32) {
        self.speech_rate = rate;
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    fn set_language(&mut self, locale_tag: &str) -> Result<()> {
        if !self.initialized {
            return Err(AwaazError::EngineNotReady);
        }
        self.locale_tag = locale_tag.to_string();
        Ok(())
    }

    fn set_utterance_listener(&mut self, listener: Arc<dyn UtteranceListener>) {
        self.listener = Some(listener);
    }

    fn output_volume(&self) -> f32 {
        self.volume
    }

    fn set_output_volume(&mut self, gain: f32) {
        self.volume = gain;
    }

    fn speak_flush(&mut self, text: &str, utterance_id: &str) -> Result<()> {
        if !self.initialized {
            return Err(AwaazError::EngineNotReady);
        }

        if self.fail_speak {
            if let Some(listener) = &self.listener {
                listener.on_error(utterance_id);
            }
            return Err(AwaazError::SpeakRejected(
                "stub configured to reject speak".into(),
            ));
        }

        self.log.lock().push(SpokenUtterance {
            utterance_id: utterance_id.to_string(),
            text: text.to_string(),
            locale_tag: self.locale_tag.clone(),
            volume: self.volume,
        });

        // The stub "finishes" instantly.
        if let Some(listener) = &self.listener {
            listener.on_done(utterance_id);
        }
        Ok(())
    }

    fn stop(&mut self) {
        debug!("StubSynthesizer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speak_before_initialize_is_rejected() {
        let mut stub = StubSynthesizer::new();
        assert!(matches!(
            stub.speak_flush("hello", "u1"),
            Err(AwaazError::EngineNotReady)
        ));
    }

    #[test]
    fn failing_init_reports_engine_init_error() {
        let mut stub = StubSynthesizer::failing_init();
        assert!(matches!(stub.initialize(), Err(AwaazError::EngineInit(_))));
    }

    #[test]
    fn utterances_record_locale_and_volume() {
        let mut stub = StubSynthesizer::new();
        stub.initialize().expect("init");
        let log = stub.utterance_log();

        stub.set_language("hi-IN").expect("set language");
        stub.set_output_volume(0.5);
        stub.speak_flush("नमस्ते", "u1").expect("speak");

        let spoken = log.lock();
        assert_eq!(spoken[0].utterance_id, "u1");
        assert_eq!(spoken[0].locale_tag, "hi-IN");
        assert!((spoken[0].volume - 0.5).abs() < f32::EPSILON);
    }
}
