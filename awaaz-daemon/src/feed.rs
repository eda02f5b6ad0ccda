//! Notification feed loop.
//!
//! The daemon consumes a JSON-lines stream of [`RawNotification`] values, as
//! pushed by a notification bridge (one object per line). Per event, in
//! order: allow-list filter, classification, persistence (always), and
//! announcement submission (only when enabled). Malformed lines are logged
//! and skipped — one bad event must never stall the feed.

use std::io::BufRead;

use awaaz_core::{parser, AnnouncePipeline, AnnouncementRequest, RawNotification};
use tracing::{debug, info, warn};

use crate::settings::AppSettings;
use crate::storage::RecorderHandle;

/// Counters for one feed run.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedStats {
    pub lines: usize,
    pub malformed: usize,
    pub filtered: usize,
    pub classified: usize,
    pub announced: usize,
}

/// Consume `reader` until EOF.
///
/// # Errors
/// Only transport-level read errors abort the loop; per-event problems are
/// logged and counted.
pub fn run_feed<R: BufRead>(
    reader: R,
    pipeline: &AnnouncePipeline,
    recorder: &RecorderHandle,
    settings: &AppSettings,
) -> anyhow::Result<FeedStats> {
    let mut stats = FeedStats::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        let notification: RawNotification = match serde_json::from_str(&line) {
            Ok(n) => n,
            Err(e) => {
                stats.malformed += 1;
                warn!("malformed feed line skipped: {e}");
                continue;
            }
        };

        // Quick filter before any parsing work.
        if !settings.is_monitored(&notification.source_app_id) {
            stats.filtered += 1;
            debug!(app = %notification.source_app_id, "not a monitored app, ignoring");
            continue;
        }

        let text = notification.combined_text();
        let Some(parsed) = parser::classify(&text, &notification.source_app_id) else {
            continue;
        };
        stats.classified += 1;
        info!(
            amount = %parsed.amount,
            sender = parsed.sender_name.as_deref().unwrap_or("Unknown"),
            app = %parsed.app_name,
            "payment detected"
        );

        // Announce first (critical path), then persist; both are
        // fire-and-forget so neither waits on the other.
        if settings.announcements_enabled {
            pipeline.submit(AnnouncementRequest {
                amount: parsed.amount.clone(),
                sender_name: parsed.sender_name.clone(),
                language: settings.language,
            });
            stats.announced += 1;
        } else {
            debug!("announcements disabled, skipping speech");
        }

        recorder.record(parsed, text);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    use awaaz_core::speech::stub::StubSynthesizer;
    use awaaz_core::{
        AudioFocusCoordinator, Language, ParsedPayment, PaymentSink, SpeechConfig, SynthHandle,
    };
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;

    use super::*;
    use crate::storage::spawn_recorder;

    struct MemorySink(Arc<Mutex<Vec<ParsedPayment>>>);

    impl PaymentSink for MemorySink {
        fn record(
            &self,
            payment: &ParsedPayment,
            _raw_text: &str,
            _received_at: DateTime<Utc>,
        ) -> anyhow::Result<()> {
            self.0.lock().push(payment.clone());
            Ok(())
        }
    }

    fn test_pipeline() -> (AnnouncePipeline, Arc<Mutex<Vec<awaaz_core::speech::stub::SpokenUtterance>>>) {
        let stub = StubSynthesizer::new();
        let log = stub.utterance_log();
        let config = SpeechConfig {
            warmup_prime_window: Duration::ZERO,
            ..SpeechConfig::default()
        };
        let pipeline = AnnouncePipeline::start(
            SynthHandle::new(stub),
            Arc::new(AudioFocusCoordinator::default()),
            config,
        );
        (pipeline, log)
    }

    const FEED: &str = concat!(
        r#"{"sourceAppId":"com.phonepe.app","title":"Payment received","text":"Payment of ₹2,500.00 received from Ramesh Kumar on 12-05"}"#,
        "\n",
        r#"{"sourceAppId":"com.phonepe.app","text":"OTP for your payment is 445566, do not share"}"#,
        "\n",
        "not json at all\n",
        r#"{"sourceAppId":"com.random.social","text":"₹999 received from Scammer"}"#,
        "\n",
        r#"{"sourceAppId":"net.one97.paytm","text":"Rs. 150 credited to your account"}"#,
        "\n",
    );

    #[test]
    fn feed_filters_classifies_persists_and_announces() {
        let (pipeline, _log) = test_pipeline();
        let stored = Arc::new(Mutex::new(Vec::new()));
        let recorder = spawn_recorder(MemorySink(Arc::clone(&stored)));
        let settings = AppSettings::default();

        let stats = run_feed(Cursor::new(FEED), &pipeline, &recorder, &settings)
            .expect("feed should not error");

        assert_eq!(stats.lines, 5);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.filtered, 1, "unknown app filtered before parsing");
        assert_eq!(stats.classified, 2, "OTP line rejected by classifier");
        assert_eq!(stats.announced, 2);

        recorder.shutdown();
        let stored = stored.lock();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].amount, "2500.00");
        assert_eq!(stored[0].app_name, "PhonePe");
        assert_eq!(stored[1].amount, "150.00");
        assert_eq!(stored[1].app_name, "Paytm");

        pipeline.shutdown().expect("pipeline shutdown");
    }

    #[test]
    fn disabled_announcements_still_persist() {
        let (pipeline, log) = test_pipeline();
        let stored = Arc::new(Mutex::new(Vec::new()));
        let recorder = spawn_recorder(MemorySink(Arc::clone(&stored)));
        let settings = AppSettings {
            announcements_enabled: false,
            ..AppSettings::default()
        };

        let line = r#"{"sourceAppId":"com.phonepe.app","text":"₹99 received from Asha"}"#;
        let stats = run_feed(Cursor::new(format!("{line}\n")), &pipeline, &recorder, &settings)
            .expect("feed should not error");

        assert_eq!(stats.classified, 1);
        assert_eq!(stats.announced, 0);

        recorder.shutdown();
        assert_eq!(stored.lock().len(), 1, "persistence proceeds regardless");

        pipeline.shutdown().expect("pipeline shutdown");
        // Only the warm-up may ever appear in the utterance log.
        std::thread::sleep(Duration::from_millis(50));
        assert!(log.lock().iter().all(|u| u.text == " "));
    }

    #[test]
    fn hindi_setting_flows_into_the_announcement() {
        let (pipeline, log) = test_pipeline();
        let stored = Arc::new(Mutex::new(Vec::new()));
        let recorder = spawn_recorder(MemorySink(stored));
        let settings = AppSettings {
            language: Language::Hi,
            ..AppSettings::default()
        };

        let line = r#"{"sourceAppId":"com.phonepe.app","text":"₹99 received from Asha Devi"}"#;
        run_feed(Cursor::new(format!("{line}\n")), &pipeline, &recorder, &settings)
            .expect("feed should not error");

        // Wait for the actor to drain (warm-up + one announcement).
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while log.lock().len() < 2 {
            assert!(std::time::Instant::now() < deadline, "announcement never spoken");
            std::thread::sleep(Duration::from_millis(5));
        }

        let spoken = log.lock();
        assert_eq!(spoken[1].text, "₹99.00 Asha से प्राप्त हुए");
        assert_eq!(spoken[1].locale_tag, "hi-IN");
        drop(spoken);

        recorder.shutdown();
        pipeline.shutdown().expect("pipeline shutdown");
    }
}
