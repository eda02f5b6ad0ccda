//! The single-consumer actor behind [`super::AnnouncePipeline`].
//!
//! ## Loop invariants
//!
//! - Only this thread touches the speech controller, so engine access is
//!   serialized without further locking discipline.
//! - The backlog holds submissions made before the engine became ready;
//!   it drains FIFO, and nothing submitted afterwards can overtake it
//!   because every submission flows through the same channel.
//! - `EngineReady` and `EngineFailed` each arrive at most once, from the
//!   init thread. After `EngineFailed` the backlog is kept but never
//!   drained — terminal for the process lifetime.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::announce::AnnouncementRequest;
use crate::events::{AnnouncementEvent, EngineStatus, EngineStatusEvent};
use crate::speech::SpeechController;

/// Commands consumed by the actor. Submissions and engine lifecycle events
/// share one channel so their relative order is the order of effects.
#[derive(Debug)]
pub enum Command {
    /// A payment announcement from the notification path.
    Announce(AnnouncementRequest),
    /// Engine initialization succeeded (sent exactly once).
    EngineReady,
    /// Engine initialization failed (sent exactly once, terminal).
    EngineFailed(String),
    /// Stop the actor after the commands already queued.
    Shutdown,
}

/// Shared pipeline counters.
#[derive(Default)]
pub struct PipelineDiagnostics {
    /// Announcements handed to `submit()`.
    pub submissions: AtomicUsize,
    /// Announcements buffered while the engine was not ready.
    pub buffered: AtomicUsize,
    /// Buffered announcements later drained to the engine.
    pub drained: AtomicUsize,
    /// Announcements dispatched directly (engine already ready).
    pub fast_path: AtomicUsize,
    /// Speak invocations that succeeded.
    pub spoken: AtomicUsize,
    /// Speak invocations the engine rejected.
    pub speak_errors: AtomicUsize,
}

impl PipelineDiagnostics {
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            submissions: self.submissions.load(Ordering::Relaxed),
            buffered: self.buffered.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            fast_path: self.fast_path.load(Ordering::Relaxed),
            spoken: self.spoken.load(Ordering::Relaxed),
            speak_errors: self.speak_errors.load(Ordering::Relaxed),
        }
    }
}

/// Record a status transition and fan it out to subscribers. Shared by the
/// pipeline handle and the actor so both publish identically.
pub(crate) fn publish_status(
    status: &Mutex<EngineStatus>,
    status_tx: &broadcast::Sender<EngineStatusEvent>,
    new_status: EngineStatus,
    detail: Option<String>,
) {
    *status.lock() = new_status;
    let _ = status_tx.send(EngineStatusEvent {
        status: new_status,
        detail,
    });
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsSnapshot {
    pub submissions: usize,
    pub buffered: usize,
    pub drained: usize,
    pub fast_path: usize,
    pub spoken: usize,
    pub speak_errors: usize,
}

/// All context the actor needs, passed as one struct so tests can build it
/// by hand and drive the loop on their own thread.
pub struct PipelineContext {
    pub controller: SpeechController,
    pub commands: Receiver<Command>,
    pub status: Arc<Mutex<EngineStatus>>,
    pub status_tx: broadcast::Sender<EngineStatusEvent>,
    pub announce_tx: broadcast::Sender<AnnouncementEvent>,
    pub seq: Arc<AtomicU64>,
    pub diagnostics: Arc<PipelineDiagnostics>,
}

impl PipelineContext {
    fn set_status(&self, new_status: EngineStatus, detail: Option<String>) {
        publish_status(&self.status, &self.status_tx, new_status, detail);
    }

    fn dispatch(&self, request: AnnouncementRequest) {
        match self.controller.speak(&request) {
            Ok(message) => {
                self.diagnostics.spoken.fetch_add(1, Ordering::Relaxed);
                let _ = self.announce_tx.send(AnnouncementEvent {
                    seq: self.seq.fetch_add(1, Ordering::Relaxed),
                    amount: request.amount,
                    sender_name: request.sender_name,
                    language: request.language,
                    message,
                });
            }
            Err(e) => {
                // No retry; the next payment event gets a fresh attempt.
                self.diagnostics.speak_errors.fetch_add(1, Ordering::Relaxed);
                warn!("speak invocation failed: {e}");
            }
        }
    }
}

/// Run the actor until `Shutdown` arrives or every sender is dropped.
pub fn run(ctx: PipelineContext) {
    info!("announcement pipeline started");

    let mut backlog: VecDeque<AnnouncementRequest> = VecDeque::new();

    while let Ok(command) = ctx.commands.recv() {
        match command {
            Command::Announce(request) => {
                let status = *ctx.status.lock();
                if status == EngineStatus::Ready {
                    ctx.diagnostics.fast_path.fetch_add(1, Ordering::Relaxed);
                    ctx.dispatch(request);
                } else {
                    // Buffered path. After a terminal failure this backlog
                    // will never drain; items are kept only so a host can
                    // inspect what was missed.
                    ctx.diagnostics.buffered.fetch_add(1, Ordering::Relaxed);
                    debug!(?status, backlog = backlog.len() + 1, "engine not ready, buffering");
                    backlog.push_back(request);
                }
            }
            Command::EngineReady => {
                if *ctx.status.lock() == EngineStatus::Ready {
                    warn!("duplicate EngineReady ignored");
                    continue;
                }
                ctx.controller.configure_after_init();
                ctx.controller.warm_up();
                ctx.set_status(EngineStatus::Ready, None);
                info!(backlog = backlog.len(), "engine ready, draining backlog");
                while let Some(request) = backlog.pop_front() {
                    ctx.diagnostics.drained.fetch_add(1, Ordering::Relaxed);
                    ctx.dispatch(request);
                }
            }
            Command::EngineFailed(detail) => {
                error!("speech engine initialization failed: {detail}");
                ctx.set_status(EngineStatus::Failed, Some(detail));
            }
            Command::Shutdown => {
                info!("announcement pipeline shutting down");
                break;
            }
        }
    }

    ctx.controller.shutdown();
    info!("announcement pipeline stopped");
}
