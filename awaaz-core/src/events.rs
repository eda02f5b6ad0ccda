//! Event types broadcast to host applications.
//!
//! A host (daemon, desktop shell, test harness) subscribes via
//! [`crate::announce::AnnouncePipeline::subscribe_status`] and
//! [`crate::announce::AnnouncePipeline::subscribe_announcements`].
//! All types serialize with camelCase field names so they can be forwarded
//! over any JSON surface unchanged.

use serde::{Deserialize, Serialize};

use crate::speech::Language;

// ---------------------------------------------------------------------------
// Engine status events
// ---------------------------------------------------------------------------

/// Emitted whenever the speech engine changes state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatusEvent {
    pub status: EngineStatus,
    /// Optional human-readable detail (e.g. init failure message).
    pub detail: Option<String>,
}

/// Lifecycle state of the shared speech engine.
///
/// `Ready` and `Failed` are terminal for the process lifetime — the engine
/// is never reinitialized while the process lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    /// Pipeline created, engine startup not yet begun.
    Uninitialized,
    /// Asynchronous engine startup in flight; submissions are buffered.
    Initializing,
    /// Engine configured and warmed up; submissions dispatch immediately.
    Ready,
    /// Engine startup failed — announcements are silently queued forever.
    Failed,
}

// ---------------------------------------------------------------------------
// Announcement events
// ---------------------------------------------------------------------------

/// Emitted after each announcement is handed to the speech engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Amount string, always formatted to two decimal places.
    pub amount: String,
    /// Sender name as parsed from the notification, if any.
    pub sender_name: Option<String>,
    /// Language the announcement was spoken in.
    pub language: Language,
    /// The exact message handed to the synthesizer.
    pub message: String,
}
