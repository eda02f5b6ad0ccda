//! Payment-text classification.
//!
//! Turns free-form UPI notification text into a structured [`ParsedPayment`],
//! or `None` when the text is not a payment-received event. The pipeline is a
//! strict short-circuit chain:
//!
//! ```text
//! blank check → ignore vocabulary → payment vocabulary
//!             → amount extraction → sender extraction → app display name
//! ```
//!
//! The ignore vocabulary (OTPs, failures, promotions) always wins over the
//! payment vocabulary, and a missing sender is tolerated — a valid amount
//! alone makes a payment. Everything here is deterministic and
//! side-effect-free: fixed vocabularies, fixed pattern lists, no locale
//! detection. This is not an NLP system.

pub mod amount;
pub mod apps;
pub mod sender;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A notification as delivered by the OS-level source, before classification.
///
/// Consumed once; the allow-list filter in [`apps::is_monitored_app`] should
/// run before classification, though `classify` behaves correctly (returns
/// `None` or falls back to the raw identifier) for unknown sources too.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    /// Package identifier of the posting app (e.g. `com.phonepe.app`).
    pub source_app_id: String,
    /// Notification title, if present.
    #[serde(default)]
    pub title: Option<String>,
    /// Notification body text.
    pub text: String,
}

impl RawNotification {
    /// Title and body joined the way the notification source presents them.
    ///
    /// Many UPI apps put the amount in the title and the sender in the body
    /// (or vice versa), so classification always runs over both.
    pub fn combined_text(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => format!("{title} {}", self.text),
            _ => self.text.clone(),
        }
    }
}

/// A successfully classified payment-received event.
///
/// Invariant: `amount` is always a positive number formatted to exactly two
/// decimal places — classification fails (returns `None`) rather than
/// producing an instance without a valid amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPayment {
    /// Amount in rupees, e.g. `"2500.00"`.
    pub amount: String,
    /// Sender name (2–50 chars, letters and spaces), if one was found.
    pub sender_name: Option<String>,
    /// User-friendly source app name, e.g. `"PhonePe"`.
    pub app_name: String,
}

/// Phrases that mark a notification as a payment-received event.
///
/// Matched case-insensitively as substrings.
const PAYMENT_KEYWORDS: &[&str] = &[
    "received",
    "credited",
    "paid",
    "payment successful",
    "payment received",
    "money received",
    "transaction successful",
    "deposited",
    "credit",
    "sent you",
    "transferred",
    "received from",
    "credited to",
    "account credited",
    "payment of",
    "rs.",
    "inr",
    "₹",
];

/// Phrases that disqualify a notification outright, even when payment
/// keywords are present: verification codes, failures, promotions.
const IGNORE_KEYWORDS: &[&str] = &[
    "otp",
    "one time password",
    "verification code",
    "failed",
    "decline",
    "unsuccessful",
    "rejected",
    "offer",
    "cashback",
    "scratch",
    "promocode",
];

/// Classify a notification text from `source_app_id`.
///
/// Returns `None` for anything that is not a payment-received event. A miss
/// is a normal negative result, logged at debug level only.
pub fn classify(text: &str, source_app_id: &str) -> Option<ParsedPayment> {
    if text.trim().is_empty() {
        debug!("classification miss: empty text");
        return None;
    }

    let lower = text.to_lowercase();

    if let Some(term) = IGNORE_KEYWORDS.iter().find(|k| lower.contains(*k)) {
        debug!(term, "classification miss: ignore vocabulary");
        return None;
    }

    if !PAYMENT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        debug!("classification miss: no payment keyword");
        return None;
    }

    let Some(amount) = amount::extract(text) else {
        debug!("classification miss: no parseable amount");
        return None;
    };

    let sender_name = sender::extract(text);
    let app_name = apps::display_name(source_app_id).to_string();

    debug!(
        amount,
        sender = sender_name.as_deref().unwrap_or("<none>"),
        app = %app_name,
        "payment classified"
    );

    Some(ParsedPayment {
        amount,
        sender_name,
        app_name,
    })
}
