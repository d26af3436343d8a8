//! Drains the unsent-message queue at process start.
//!
//! Entries are redelivered strictly sequentially through the shared send
//! gate. A send failure here is fatal: the entry stays in the queue and the
//! error is surfaced to the operator instead of being auto-recovered.

use crate::core::{AlertStore, NotificationSink, StoreError, UnsentMessage, CHANNEL, UNSENT_INDEX};
use crate::formatting::render_text;
use crate::rate_limit::SendGate;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub async fn drain_unsent(
    store: &dyn AlertStore,
    sink: &dyn NotificationSink,
    gate: &SendGate,
) -> Result<()> {
    let entries = store
        .fetch_pending(UNSENT_INDEX)
        .await
        .context("fetching unsent messages")?;
    if entries.is_empty() {
        debug!("unsent queue is empty");
        return Ok(());
    }

    info!(count = entries.len(), "draining unsent messages");
    for entry in entries {
        let message: UnsentMessage = serde_json::from_value(entry.source.clone())
            .with_context(|| format!("decoding unsent message {}", entry.id))?;

        gate.send(
            sink,
            CHANNEL,
            &render_text(&message.host, &message.subject, &message.message),
        )
        .await
        .with_context(|| format!("redelivering unsent message {}", entry.id))?;
        metrics::counter!("unsent_drained_total").increment(1);

        match store.remove(UNSENT_INDEX, &entry.id).await {
            Ok(()) => debug!(id = %entry.id, "unsent message redelivered and removed"),
            Err(StoreError::NotFound) => {
                warn!(id = %entry.id, "unsent message was already removed")
            }
            Err(e) => {
                return Err(e).with_context(|| format!("removing unsent message {}", entry.id))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SendError, GRACE_PERIOD};
    use crate::test_support::{MemoryStore, RecordingSink};
    use serde_json::json;

    fn gate() -> SendGate {
        SendGate::new(GRACE_PERIOD)
    }

    fn unsent_doc(host: &str, subject: &str, message: &str) -> serde_json::Value {
        json!({
            "host": host,
            "subject": subject,
            "message": message,
            "queued_at": "2026-08-29T00:00:00+00:00"
        })
    }

    #[tokio::test(start_paused = true)]
    async fn empty_queue_is_a_noop_with_zero_sink_calls() {
        let store = MemoryStore::new();
        let sink = RecordingSink::new();

        drain_unsent(&store, &sink, &gate()).await.unwrap();

        assert!(sink.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delivered_entry_is_removed() {
        let store = MemoryStore::new();
        store.seed(UNSENT_INDEX, unsent_doc("db-1", "High memory usage", "90%"));
        let sink = RecordingSink::new();

        drain_unsent(&store, &sink, &gate()).await.unwrap();

        let sent = sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, CHANNEL);
        assert!(sent[0].text.contains("*High memory usage*"));
        assert!(sent[0].text.contains("host: db-1"));
        assert!(store.records(UNSENT_INDEX).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn send_failure_is_fatal_and_preserves_every_entry() {
        let store = MemoryStore::new();
        store.seed(UNSENT_INDEX, unsent_doc("db-1", "s1", "m1"));
        store.seed(UNSENT_INDEX, unsent_doc("db-2", "s2", "m2"));
        let sink = RecordingSink::new();
        sink.push_outcome(Err(SendError::Transport("connection reset".into())));

        let result = drain_unsent(&store, &sink, &gate()).await;

        assert!(result.is_err());
        // Only one attempt; the drainer stopped on the first failure and
        // left both entries in place.
        assert_eq!(sink.sent().len(), 1);
        assert_eq!(store.records(UNSENT_INDEX).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_entry_is_fatal_before_any_send() {
        let store = MemoryStore::new();
        store.seed(UNSENT_INDEX, json!({"not": "an unsent message"}));
        let sink = RecordingSink::new();

        let result = drain_unsent(&store, &sink, &gate()).await;

        assert!(result.is_err());
        assert!(sink.sent().is_empty());
        assert_eq!(store.records(UNSENT_INDEX).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn already_removed_entry_does_not_stop_the_drain() {
        let store = MemoryStore::new();
        store.seed(UNSENT_INDEX, unsent_doc("db-1", "s1", "m1"));
        store.seed(UNSENT_INDEX, unsent_doc("db-2", "s2", "m2"));
        store.removes_report_not_found();
        let sink = RecordingSink::new();

        drain_unsent(&store, &sink, &gate()).await.unwrap();

        // A NotFound on remove means the entry was already gone; the drain
        // still redelivers every entry it fetched.
        assert_eq!(sink.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn grace_period_separates_consecutive_redeliveries() {
        let store = MemoryStore::new();
        store.seed(UNSENT_INDEX, unsent_doc("db-1", "s1", "m1"));
        store.seed(UNSENT_INDEX, unsent_doc("db-2", "s2", "m2"));
        let sink = RecordingSink::new();

        let started = tokio::time::Instant::now();
        drain_unsent(&store, &sink, &gate()).await.unwrap();

        assert_eq!(sink.sent().len(), 2);
        assert!(started.elapsed() >= GRACE_PERIOD);
        assert!(store.records(UNSENT_INDEX).is_empty());
    }
}
