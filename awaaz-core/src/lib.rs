//! # awaaz-core
//!
//! UPI payment-announcement engine: classifies free-form payment
//! notifications and speaks them with sub-second added latency.
//!
//! ## Architecture
//!
//! ```text
//! RawNotification → parser::classify → ParsedPayment
//!                                          │
//!                               AnnouncePipeline::submit (MPSC channel)
//!                                          │
//!                         single actor ── engine Ready? ──┐
//!                              │ no                       │ yes
//!                        FIFO backlog            SpeechController::speak
//!                   (drained on EngineReady)      + AudioFocusCoordinator
//! ```
//!
//! `submit()` never blocks the notification path. All engine interaction is
//! serialized on the actor thread; the engine itself is behind the
//! [`speech::SpeechSynthesizer`] trait.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod announce;
pub mod error;
pub mod events;
pub mod focus;
pub mod parser;
pub mod sink;
pub mod speech;

// Convenience re-exports for downstream crates
pub use announce::{AnnouncePipeline, AnnouncementRequest, EngineState};
pub use error::AwaazError;
pub use events::{AnnouncementEvent, EngineStatus, EngineStatusEvent};
pub use focus::AudioFocusCoordinator;
pub use parser::{ParsedPayment, RawNotification};
pub use sink::PaymentSink;
pub use speech::{Language, SpeechConfig, SpeechController, SpeechSynthesizer, SynthHandle};
