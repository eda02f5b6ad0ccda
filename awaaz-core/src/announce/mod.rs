//! `AnnouncePipeline` — orchestrator between classified payments and the
//! speech engine.
//!
//! ## Two-path design
//!
//! ```text
//! submit(request)
//!     │                        engine Ready?
//!     ├── yes ─► speak immediately (fast path)
//!     └── no ──► FIFO backlog (buffered path)
//!
//! engine init succeeds (once)
//!     └─► configure → silent warm-up → drain backlog in arrival order
//! ```
//!
//! The engine may take multi-second time to initialize on process start,
//! but a payment notification must never be dropped and must announce with
//! minimal added latency once the engine is ready — hence the backlog.
//!
//! ## Threading
//!
//! `submit()` is callable from any number of notification-producer threads;
//! it is a non-blocking channel send. Everything that touches the engine
//! (configuration, warm-up, speak) happens on the single actor thread that
//! consumes the channel, which also makes the ordering guarantee trivial:
//! post-ready submissions are totally ordered after the drained backlog.

pub mod pipeline;

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::{AwaazError, Result};
use crate::events::{AnnouncementEvent, EngineStatus, EngineStatusEvent};
use crate::focus::AudioFocusCoordinator;
use crate::speech::{Language, SpeechConfig, SpeechController, SynthHandle};

pub use pipeline::{Command, DiagnosticsSnapshot, PipelineContext, PipelineDiagnostics};

/// Broadcast channel capacity for status/announcement fanout.
const BROADCAST_CAP: usize = 256;

/// One queued announcement. Created at classification time, consumed exactly
/// once by the speech engine, never mutated in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRequest {
    /// Amount string, already formatted to two decimal places.
    pub amount: String,
    pub sender_name: Option<String>,
    pub language: Language,
}

/// Snapshot of the process-wide engine state.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    /// True once initialization succeeded. Never reset — the engine is not
    /// reinitialized while the process lives.
    pub initialized: bool,
    /// True once the one-time silent warm-up ran.
    pub warmed_up: bool,
    /// Whether the announcement path currently holds audio focus.
    pub has_audio_focus: bool,
}

/// Handle to the running pipeline.
///
/// Cheap to clone-share via `Arc`; the actor thread it spawned runs until
/// `shutdown()` or until every handle is dropped.
pub struct AnnouncePipeline {
    command_tx: Sender<Command>,
    status: Arc<Mutex<EngineStatus>>,
    status_tx: broadcast::Sender<EngineStatusEvent>,
    announce_tx: broadcast::Sender<AnnouncementEvent>,
    focus: Arc<AudioFocusCoordinator>,
    warmed_up: Arc<AtomicBool>,
    diagnostics: Arc<PipelineDiagnostics>,
    /// Actor thread handle, joined on `shutdown()` so queued announcements
    /// finish before the process is allowed to exit.
    actor: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl AnnouncePipeline {
    /// Spawn the pipeline actor and kick off asynchronous engine
    /// initialization. Returns immediately; submissions made before the
    /// engine is ready are buffered.
    pub fn start(synth: SynthHandle, focus: Arc<AudioFocusCoordinator>, config: SpeechConfig) -> Self {
        let (command_tx, command_rx) = unbounded();
        let status = Arc::new(Mutex::new(EngineStatus::Uninitialized));
        let (status_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (announce_tx, _) = broadcast::channel(BROADCAST_CAP);
        let diagnostics = Arc::new(PipelineDiagnostics::default());

        let controller = SpeechController::new(synth.clone(), Arc::clone(&focus), config);
        let warmed_up = controller.warmed_up_flag();

        let ctx = PipelineContext {
            controller,
            commands: command_rx,
            status: Arc::clone(&status),
            status_tx: status_tx.clone(),
            announce_tx: announce_tx.clone(),
            seq: Arc::new(AtomicU64::new(0)),
            diagnostics: Arc::clone(&diagnostics),
        };

        let actor = std::thread::Builder::new()
            .name("awaaz-announce".into())
            .spawn(move || pipeline::run(ctx))
            .expect("spawn announcement actor thread");

        let handle = Self {
            command_tx,
            status,
            status_tx,
            announce_tx,
            focus,
            warmed_up,
            diagnostics,
            actor: Mutex::new(Some(actor)),
        };

        handle.set_status(EngineStatus::Initializing, None);
        handle.spawn_engine_init(synth);
        handle
    }

    /// Begin asynchronous engine startup on its own thread; the outcome is
    /// delivered to the actor through the same command channel as
    /// submissions.
    fn spawn_engine_init(&self, synth: SynthHandle) {
        let command_tx = self.command_tx.clone();
        std::thread::Builder::new()
            .name("awaaz-engine-init".into())
            .spawn(move || {
                info!("speech engine initializing");
                let outcome = synth.0.lock().initialize();
                let command = match outcome {
                    Ok(()) => Command::EngineReady,
                    Err(e) => Command::EngineFailed(e.to_string()),
                };
                // Actor gone means we are shutting down; nothing to report.
                let _ = command_tx.send(command);
            })
            .expect("spawn engine init thread");
    }

    /// Submit one announcement. Fire-and-forget: never blocks beyond the
    /// channel send, never returns an error to the notification path.
    pub fn submit(&self, request: AnnouncementRequest) {
        self.diagnostics.submissions.fetch_add(1, Ordering::Relaxed);
        if self.command_tx.send(Command::Announce(request)).is_err() {
            debug!("announcement dropped: pipeline is shut down");
        }
    }

    /// Current engine status (snapshot).
    pub fn status(&self) -> EngineStatus {
        *self.status.lock()
    }

    /// Combined engine-state snapshot.
    pub fn engine_state(&self) -> EngineState {
        EngineState {
            initialized: self.status() == EngineStatus::Ready,
            warmed_up: self.warmed_up.load(Ordering::SeqCst),
            has_audio_focus: self.focus.is_held(),
        }
    }

    /// Subscribe to engine status transitions.
    pub fn subscribe_status(&self) -> broadcast::Receiver<EngineStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Subscribe to dispatched announcements.
    pub fn subscribe_announcements(&self) -> broadcast::Receiver<AnnouncementEvent> {
        self.announce_tx.subscribe()
    }

    /// Snapshot of pipeline counters for observability.
    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Stop the actor after the commands already queued, and wait for it.
    ///
    /// Joining matters: without it the process can exit while the actor is
    /// still dispatching announcements submitted just before shutdown.
    /// Idempotent — a second call finds no thread left to join.
    ///
    /// # Errors
    /// `AwaazError::PipelineClosed` if the actor is already gone.
    pub fn shutdown(&self) -> Result<()> {
        let sent = self
            .command_tx
            .send(Command::Shutdown)
            .map_err(|_| AwaazError::PipelineClosed);
        if let Some(actor) = self.actor.lock().take() {
            let _ = actor.join();
        }
        sent
    }

    fn set_status(&self, new_status: EngineStatus, detail: Option<String>) {
        pipeline::publish_status(&self.status, &self.status_tx, new_status, detail);
    }
}
