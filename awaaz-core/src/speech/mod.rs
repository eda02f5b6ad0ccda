//! Speech-engine controller.
//!
//! One long-lived synthesizer instance serves the whole process. The
//! [`SpeechSynthesizer`] trait decouples the controller from any specific
//! backend (platform TTS, neural vocoder, the in-tree stub); `&mut self` on
//! its methods expresses that engines are stateful, so all access is
//! serialized through [`SynthHandle`]'s `parking_lot::Mutex` and, above
//! that, the single announcement-pipeline actor.
//!
//! ## Lifecycle
//!
//! ```text
//! initialize() (slow, async)  →  configure_after_init()  →  warm_up()  →  speak()…
//! ```
//!
//! The warm-up speaks a single silent utterance at zero output volume to
//! prime the engine's audio path, then restores the volume before any real
//! announcement is dispatched. Without it the first spoken announcement
//! pays a noticeable first-utterance latency penalty.

pub mod stub;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::announce::AnnouncementRequest;
use crate::error::Result;
use crate::focus::AudioFocusCoordinator;

/// Announcement language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "hi")]
    Hi,
}

impl Language {
    /// BCP-47 tag handed to the synthesizer's voice selection.
    pub fn locale_tag(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi-IN",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "hi" => Ok(Language::Hi),
            other => Err(format!("unknown language {other:?} (expected \"en\" or \"hi\")")),
        }
    }
}

/// Completion callbacks registered with the synthesizer.
///
/// Backends must invoke exactly one of these per utterance, on whatever
/// thread finishes the audio.
pub trait UtteranceListener: Send + Sync + 'static {
    fn on_done(&self, utterance_id: &str);
    fn on_error(&self, utterance_id: &str);
}

/// Contract for speech-synthesis backends.
pub trait SpeechSynthesizer: Send + 'static {
    /// One-time engine startup. May take arbitrarily long; the pipeline
    /// buffers announcements until it completes.
    ///
    /// # Errors
    /// A failure here is terminal for the process lifetime.
    fn initialize(&mut self) -> Result<()>;

    /// Speaking rate multiplier (1.0 = engine default).
    fn set_speech_rate(&mut self, rate: f32);

    /// Voice pitch multiplier (1.0 = engine default).
    fn set_pitch(&mut self, pitch: f32);

    /// Select the voice for a BCP-47 locale tag. Cached by backends, cheap
    /// to call per utterance.
    fn set_language(&mut self, locale_tag: &str) -> Result<()>;

    /// Register completion/error callbacks. Replaces any previous listener.
    fn set_utterance_listener(&mut self, listener: Arc<dyn UtteranceListener>);

    /// Current output gain in [0.0, 1.0].
    fn output_volume(&self) -> f32;

    /// Set output gain. Used to mute the warm-up utterance.
    fn set_output_volume(&mut self, gain: f32);

    /// Speak `text`, discarding any utterance currently in progress
    /// (flush-queue semantics — announcements pre-empt each other, they are
    /// never queued inside the engine).
    ///
    /// # Errors
    /// Returns an error if the engine rejects the invocation; the listener's
    /// `on_error` fires as well so audio focus is released either way.
    fn speak_flush(&mut self, text: &str, utterance_id: &str) -> Result<()>;

    /// Stop speaking and release engine resources. Called at shutdown.
    fn stop(&mut self);
}

/// Thread-safe reference-counted handle to any `SpeechSynthesizer`.
#[derive(Clone)]
pub struct SynthHandle(pub Arc<Mutex<dyn SpeechSynthesizer>>);

impl SynthHandle {
    pub fn new<S: SpeechSynthesizer>(synth: S) -> Self {
        Self(Arc::new(Mutex::new(synth)))
    }
}

impl std::fmt::Debug for SynthHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthHandle").finish_non_exhaustive()
    }
}

/// Configuration for [`SpeechController`].
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Speaking rate. Slightly slowed so amounts stay intelligible.
    pub speech_rate: f32,
    /// Voice pitch.
    pub pitch: f32,
    /// How long the muted warm-up window lasts before output volume is
    /// restored. Covers engine pipeline priming on real backends.
    pub warmup_prime_window: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            speech_rate: 0.8,
            pitch: 1.1,
            warmup_prime_window: Duration::from_millis(500),
        }
    }
}

/// Releases audio focus when an utterance finishes, successfully or not,
/// so the transient grant never leaks.
struct FocusReleasingListener {
    focus: Arc<AudioFocusCoordinator>,
}

impl UtteranceListener for FocusReleasingListener {
    fn on_done(&self, utterance_id: &str) {
        debug!(utterance_id, "utterance finished");
        self.focus.release();
    }

    fn on_error(&self, utterance_id: &str) {
        warn!(utterance_id, "utterance errored");
        self.focus.release();
    }
}

/// Stateful wrapper around the shared synthesizer.
///
/// Owned by the announcement-pipeline actor; every method runs on that one
/// thread, which is what makes the `&mut self` backend contract safe.
pub struct SpeechController {
    synth: SynthHandle,
    focus: Arc<AudioFocusCoordinator>,
    config: SpeechConfig,
    warmed_up: Arc<AtomicBool>,
    utterance_counter: AtomicU64,
}

impl SpeechController {
    pub fn new(synth: SynthHandle, focus: Arc<AudioFocusCoordinator>, config: SpeechConfig) -> Self {
        Self {
            synth,
            focus,
            config,
            warmed_up: Arc::new(AtomicBool::new(false)),
            utterance_counter: AtomicU64::new(0),
        }
    }

    /// Shared warm-up flag, for engine-state snapshots.
    pub fn warmed_up_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.warmed_up)
    }

    /// Apply fixed voice parameters and register the focus-releasing
    /// utterance listener. Called once, right after the engine reports a
    /// successful initialization.
    pub fn configure_after_init(&self) {
        let mut synth = self.synth.0.lock();
        synth.set_speech_rate(self.config.speech_rate);
        synth.set_pitch(self.config.pitch);
        synth.set_utterance_listener(Arc::new(FocusReleasingListener {
            focus: Arc::clone(&self.focus),
        }));
        info!(
            rate = self.config.speech_rate,
            pitch = self.config.pitch,
            "speech engine configured"
        );
    }

    /// One-time silent warm-up. A no-op on every call after the first.
    ///
    /// Output volume is restored only after the prime window elapses, and
    /// before this returns — so the backlog drained right afterwards is
    /// never muted.
    pub fn warm_up(&self) {
        if self.warmed_up.swap(true, Ordering::SeqCst) {
            debug!("already warmed up, skipping");
            return;
        }

        info!("performing silent engine warm-up");
        let original_volume = {
            let mut synth = self.synth.0.lock();
            let original = synth.output_volume();
            synth.set_output_volume(0.0);
            if let Err(e) = synth.speak_flush(" ", "warmup") {
                warn!("warm-up utterance rejected: {e}");
            }
            original
        };

        // Keep the engine muted long enough to cover pipeline priming.
        std::thread::sleep(self.config.warmup_prime_window);

        self.synth.0.lock().set_output_volume(original_volume);
        debug!("warm-up complete, volume restored");
    }

    /// Speak one announcement, pre-empting any utterance in progress.
    ///
    /// Acquires transient audio focus first; the registered listener
    /// releases it when the utterance finishes or errors. Returns the exact
    /// message handed to the engine.
    ///
    /// # Errors
    /// Propagates a rejected speak invocation after releasing focus. There
    /// is no retry — the next payment event gets an independent attempt.
    pub fn speak(&self, request: &AnnouncementRequest) -> Result<String> {
        if !self.focus.acquire() {
            // Announce anyway; a denied duck just means we may talk over
            // other audio at full volume.
            debug!("audio focus denied, announcing without it");
        }

        let message = format_message(
            &request.amount,
            request.sender_name.as_deref(),
            request.language,
        );
        let id = format!(
            "payment-{}",
            self.utterance_counter.fetch_add(1, Ordering::Relaxed)
        );

        let outcome = {
            let mut synth = self.synth.0.lock();
            match synth.set_language(request.language.locale_tag()) {
                Ok(()) => synth.speak_flush(&message, &id),
                Err(e) => Err(e),
            }
        };

        match outcome {
            Ok(()) => {
                info!(utterance_id = %id, %message, "announcement dispatched");
                Ok(message)
            }
            Err(e) => {
                self.focus.release();
                Err(e)
            }
        }
    }

    /// Stop the engine. Focus is released in case an utterance was cut off.
    pub fn shutdown(&self) {
        self.synth.0.lock().stop();
        self.focus.release();
    }
}

/// Format the spoken message for an announcement.
///
/// Only the first token of the sender name is spoken; full names read
/// awkwardly at announcement pace.
pub fn format_message(amount: &str, sender_name: Option<&str>, language: Language) -> String {
    let first_name = sender_name.and_then(|s| s.split_whitespace().next());

    match (language, first_name) {
        (Language::Hi, Some(name)) => format!("₹{amount} {name} से प्राप्त हुए"),
        (Language::Hi, None) => format!("₹{amount} प्राप्त हुए"),
        (Language::En, Some(name)) => format!("Payment received of ₹{amount} from {name}"),
        (Language::En, None) => format!("Payment received of ₹{amount}"),
    }
}

#[cfg(test)]
mod tests {
    use super::stub::StubSynthesizer;
    use super::*;

    fn controller_with_stub(stub: StubSynthesizer) -> SpeechController {
        let mut config = SpeechConfig::default();
        config.warmup_prime_window = Duration::ZERO;
        SpeechController::new(
            SynthHandle::new(stub),
            Arc::new(AudioFocusCoordinator::default()),
            config,
        )
    }

    fn ready_stub() -> StubSynthesizer {
        let mut stub = StubSynthesizer::new();
        stub.initialize().expect("stub init");
        stub
    }

    #[test]
    fn english_message_with_sender_uses_first_name_only() {
        assert_eq!(
            format_message("2500.00", Some("Ramesh Kumar"), Language::En),
            "Payment received of ₹2500.00 from Ramesh"
        );
    }

    #[test]
    fn english_message_without_sender() {
        assert_eq!(
            format_message("150.00", None, Language::En),
            "Payment received of ₹150.00"
        );
    }

    #[test]
    fn hindi_messages() {
        assert_eq!(
            format_message("99.00", Some("Asha Devi"), Language::Hi),
            "₹99.00 Asha से प्राप्त हुए"
        );
        assert_eq!(format_message("99.00", None, Language::Hi), "₹99.00 प्राप्त हुए");
    }

    #[test]
    fn speak_selects_locale_and_flush_speaks() {
        let stub = ready_stub();
        let log = stub.utterance_log();
        let controller = controller_with_stub(stub);
        controller.configure_after_init();

        let message = controller
            .speak(&AnnouncementRequest {
                amount: "40.00".into(),
                sender_name: Some("Priya Sharma".into()),
                language: Language::Hi,
            })
            .expect("speak should succeed");

        assert_eq!(message, "₹40.00 Priya से प्राप्त हुए");
        let spoken = log.lock();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, message);
        assert_eq!(spoken[0].locale_tag, "hi-IN");
        assert!((spoken[0].volume - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn warm_up_is_silent_once_and_restores_volume() {
        let stub = ready_stub();
        let log = stub.utterance_log();
        let controller = controller_with_stub(stub);
        controller.configure_after_init();

        controller.warm_up();
        controller.warm_up();

        let spoken = log.lock();
        assert_eq!(spoken.len(), 1, "warm-up runs exactly once");
        assert_eq!(spoken[0].text, " ");
        assert_eq!(spoken[0].volume, 0.0, "warm-up is inaudible");
        drop(spoken);

        // Volume restored: a real announcement plays at full volume.
        controller
            .speak(&AnnouncementRequest {
                amount: "10.00".into(),
                sender_name: None,
                language: Language::En,
            })
            .expect("speak after warm-up");
        assert!((log.lock()[1].volume - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn failed_speak_releases_focus() {
        let mut stub = StubSynthesizer::failing_speak();
        stub.initialize().expect("stub init");
        let focus = Arc::new(AudioFocusCoordinator::default());
        let mut config = SpeechConfig::default();
        config.warmup_prime_window = Duration::ZERO;
        let controller = SpeechController::new(SynthHandle::new(stub), Arc::clone(&focus), config);
        controller.configure_after_init();

        let result = controller.speak(&AnnouncementRequest {
            amount: "5.00".into(),
            sender_name: None,
            language: Language::En,
        });

        assert!(result.is_err());
        assert!(!focus.is_held(), "focus must not leak on speak failure");
    }

    #[test]
    fn language_parses_from_settings_strings() {
        assert_eq!("en".parse::<Language>(), Ok(Language::En));
        assert_eq!("hi".parse::<Language>(), Ok(Language::Hi));
        assert!("fr".parse::<Language>().is_err());
    }
}
