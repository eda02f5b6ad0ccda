//! Audio-focus coordination.
//!
//! Announcements are brief, so the coordinator asks for a *transient,
//! duckable* grant: other audio keeps playing at reduced volume instead of
//! being stopped outright. Focus is requested immediately before each speak
//! call and released when the utterance completes or errors — it is never
//! held persistently.
//!
//! `acquire` and `release` are both idempotent; the utterance listener may
//! release after an utterance that never acquired focus (the warm-up) and
//! nothing happens.

use parking_lot::Mutex;
use tracing::debug;

/// Seam to whatever actually arbitrates audio output.
///
/// The default [`SoftwareMixerFocus`] always grants; a host embedding this
/// crate next to a real mixer supplies its own backend.
pub trait FocusBackend: Send + 'static {
    /// Request a transient, duckable grant. Returns whether it was granted.
    fn request_transient_duck(&mut self) -> bool;

    /// Abandon the current grant.
    fn abandon(&mut self);
}

/// In-process backend for hosts without an external audio arbiter.
#[derive(Debug, Default)]
pub struct SoftwareMixerFocus;

impl FocusBackend for SoftwareMixerFocus {
    fn request_transient_duck(&mut self) -> bool {
        true
    }

    fn abandon(&mut self) {}
}

struct FocusState {
    backend: Box<dyn FocusBackend>,
    held: bool,
}

/// Tracks whether the announcement path currently holds audio focus.
pub struct AudioFocusCoordinator {
    state: Mutex<FocusState>,
}

impl AudioFocusCoordinator {
    pub fn new(backend: Box<dyn FocusBackend>) -> Self {
        Self {
            state: Mutex::new(FocusState {
                backend,
                held: false,
            }),
        }
    }

    /// Acquire focus if not already held. Returns whether focus is held
    /// after the call; a second acquire while held is a no-op.
    pub fn acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.held {
            return true;
        }
        state.held = state.backend.request_transient_duck();
        if !state.held {
            debug!("audio focus request denied");
        }
        state.held
    }

    /// Release focus if held. A release without a prior acquire is a no-op.
    pub fn release(&self) {
        let mut state = self.state.lock();
        if !state.held {
            return;
        }
        state.backend.abandon();
        state.held = false;
    }

    /// Current snapshot, for diagnostics.
    pub fn is_held(&self) -> bool {
        self.state.lock().held
    }
}

impl Default for AudioFocusCoordinator {
    fn default() -> Self {
        Self::new(Box::new(SoftwareMixerFocus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend that counts calls and can be told to deny requests.
    struct CountingBackend {
        grant: bool,
        requests: usize,
        abandons: usize,
    }

    impl FocusBackend for &'static Mutex<CountingBackend> {
        fn request_transient_duck(&mut self) -> bool {
            let mut inner = self.lock();
            inner.requests += 1;
            inner.grant
        }

        fn abandon(&mut self) {
            self.lock().abandons += 1;
        }
    }

    fn counting(grant: bool) -> &'static Mutex<CountingBackend> {
        Box::leak(Box::new(Mutex::new(CountingBackend {
            grant,
            requests: 0,
            abandons: 0,
        })))
    }

    #[test]
    fn acquire_then_release_round_trip() {
        let backend = counting(true);
        let focus = AudioFocusCoordinator::new(Box::new(backend));

        assert!(focus.acquire());
        assert!(focus.is_held());
        focus.release();
        assert!(!focus.is_held());
        assert_eq!(backend.lock().requests, 1);
        assert_eq!(backend.lock().abandons, 1);
    }

    #[test]
    fn second_acquire_while_held_is_a_no_op() {
        let backend = counting(true);
        let focus = AudioFocusCoordinator::new(Box::new(backend));

        assert!(focus.acquire());
        assert!(focus.acquire());
        assert_eq!(backend.lock().requests, 1, "backend asked only once");
    }

    #[test]
    fn release_is_idempotent_and_safe_without_acquire() {
        let backend = counting(true);
        let focus = AudioFocusCoordinator::new(Box::new(backend));

        // Release with nothing held.
        focus.release();
        assert!(!focus.is_held());

        focus.acquire();
        focus.release();
        focus.release();
        assert!(!focus.is_held());
        assert_eq!(backend.lock().abandons, 1, "backend abandoned only once");
    }

    #[test]
    fn denied_request_leaves_focus_unheld() {
        let backend = counting(false);
        let focus = AudioFocusCoordinator::new(Box::new(backend));

        assert!(!focus.acquire());
        assert!(!focus.is_held());
        focus.release();
        assert_eq!(backend.lock().abandons, 0);
    }
}
