//! Local payment history (SQLite).
//!
//! Writes run on a dedicated recorder thread so slow disk I/O can never
//! delay the announcement path. Failures are logged and dropped — storage
//! is best-effort by design.

use std::path::Path;

use anyhow::Context;
use awaaz_core::{ParsedPayment, PaymentSink};
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tracing::{debug, error, info};

/// One stored payment row.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub id: i64,
    pub amount: String,
    pub sender_name: Option<String>,
    pub app_name: String,
    pub raw_text: String,
    pub received_at: DateTime<Utc>,
}

/// SQLite-backed payment history.
pub struct PaymentStore {
    conn: Mutex<Connection>,
}

impl PaymentStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {parent:?}"))?;
            }
        }
        let conn = Connection::open(path).with_context(|| format!("opening {path:?}"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init_schema(&conn)?;
        info!(db = %path.display(), "payment store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> anyhow::Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS payments (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                amount       TEXT NOT NULL,
                sender_name  TEXT,
                app_name     TEXT NOT NULL,
                raw_text     TEXT NOT NULL,
                received_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_payments_received_at
                ON payments(received_at DESC);",
        )?;
        Ok(())
    }

    pub fn insert(
        &self,
        payment: &ParsedPayment,
        raw_text: &str,
        received_at: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO payments (amount, sender_name, app_name, raw_text, received_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                payment.amount,
                payment.sender_name,
                payment.app_name,
                raw_text,
                received_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent payments, newest first.
    pub fn recent(&self, limit: usize) -> anyhow::Result<Vec<PaymentRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, amount, sender_name, app_name, raw_text, received_at
             FROM payments ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, amount, sender_name, app_name, raw_text, received_at) = row?;
            let received_at = DateTime::parse_from_rfc3339(&received_at)
                .with_context(|| format!("bad timestamp on payment row {id}"))?
                .with_timezone(&Utc);
            records.push(PaymentRecord {
                id,
                amount,
                sender_name,
                app_name,
                raw_text,
                received_at,
            });
        }
        Ok(records)
    }
}

impl PaymentSink for PaymentStore {
    fn record(
        &self,
        payment: &ParsedPayment,
        raw_text: &str,
        received_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let id = self.insert(payment, raw_text, received_at)?;
        debug!(id, amount = %payment.amount, "payment saved");
        Ok(())
    }
}

struct RecordJob {
    payment: ParsedPayment,
    raw_text: String,
    received_at: DateTime<Utc>,
}

/// Handle to the recorder thread. Dropping it (or calling `shutdown`)
/// closes the channel and lets the thread finish its queue and exit.
pub struct RecorderHandle {
    tx: Sender<RecordJob>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl RecorderHandle {
    /// Queue a payment for storage. Fire-and-forget: returns immediately,
    /// storage failures are logged on the recorder thread.
    pub fn record(&self, payment: ParsedPayment, raw_text: String) {
        let job = RecordJob {
            payment,
            raw_text,
            received_at: Utc::now(),
        };
        if self.tx.send(job).is_err() {
            error!("payment dropped: recorder thread is gone");
        }
    }

    /// Flush the queue and stop the recorder thread.
    pub fn shutdown(mut self) {
        let join = self.join.take();
        // Dropping the sender closes the channel; the thread drains what is
        // left and exits.
        drop(self);
        if let Some(join) = join {
            let _ = join.join();
        }
    }
}

/// Spawn the recorder thread around any [`PaymentSink`].
pub fn spawn_recorder<S: PaymentSink>(sink: S) -> RecorderHandle {
    let (tx, rx) = unbounded::<RecordJob>();
    let join = std::thread::Builder::new()
        .name("awaaz-recorder".into())
        .spawn(move || {
            while let Ok(job) = rx.recv() {
                if let Err(e) = sink.record(&job.payment, &job.raw_text, job.received_at) {
                    // Never retried, never surfaced to the announcement path.
                    error!("payment insert failed: {e}");
                }
            }
            debug!("recorder thread exiting");
        })
        .expect("spawn recorder thread");
    RecorderHandle {
        tx,
        join: Some(join),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payment() -> ParsedPayment {
        ParsedPayment {
            amount: "2500.00".into(),
            sender_name: Some("Ramesh Kumar".into()),
            app_name: "PhonePe".into(),
        }
    }

    #[test]
    fn insert_and_read_back() {
        let store = PaymentStore::open_in_memory().expect("open");
        let now = Utc::now();
        store
            .insert(&sample_payment(), "Payment of ₹2,500.00 received", now)
            .expect("insert");

        let records = store.recent(10).expect("recent");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, "2500.00");
        assert_eq!(records[0].sender_name.as_deref(), Some("Ramesh Kumar"));
        assert_eq!(records[0].app_name, "PhonePe");
        assert_eq!(records[0].received_at.timestamp(), now.timestamp());
    }

    #[test]
    fn recent_returns_newest_first_and_respects_limit() {
        let store = PaymentStore::open_in_memory().expect("open");
        for i in 0..5 {
            let payment = ParsedPayment {
                amount: format!("{i}.00"),
                sender_name: None,
                app_name: "Paytm".into(),
            };
            store.insert(&payment, "raw", Utc::now()).expect("insert");
        }

        let records = store.recent(2).expect("recent");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, "4.00");
        assert_eq!(records[1].amount, "3.00");
    }

    #[test]
    fn recorder_thread_persists_jobs() {
        let store = PaymentStore::open_in_memory().expect("open");
        // The recorder owns the store, so verify through a second handle:
        // use an Arc-backed sink wrapper instead.
        struct SharedSink(std::sync::Arc<PaymentStore>);
        impl PaymentSink for SharedSink {
            fn record(
                &self,
                payment: &ParsedPayment,
                raw_text: &str,
                received_at: DateTime<Utc>,
            ) -> anyhow::Result<()> {
                self.0.record(payment, raw_text, received_at)
            }
        }

        let store = std::sync::Arc::new(store);
        let recorder = spawn_recorder(SharedSink(std::sync::Arc::clone(&store)));
        recorder.record(sample_payment(), "raw text".into());
        recorder.shutdown();

        let records = store.recent(10).expect("recent");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw_text, "raw text");
    }
}
