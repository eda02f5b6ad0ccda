//! Persistence seam.
//!
//! Storage is an external collaborator: it runs off the announcement fast
//! path, is best-effort, and its failures are logged locally by the caller
//! side — they never reach the pipeline.

use chrono::{DateTime, Utc};

use crate::parser::ParsedPayment;

/// Downstream sink for classified payments.
pub trait PaymentSink: Send + 'static {
    /// Record one payment together with the raw notification text it was
    /// parsed from.
    ///
    /// # Errors
    /// Implementations report storage failures; callers log and drop them.
    fn record(
        &self,
        payment: &ParsedPayment,
        raw_text: &str,
        received_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
}
