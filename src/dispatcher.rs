//! Per-category dispatch of pending alert records.
//!
//! For each fetched record: expand it into its sub-alert documents, format
//! and deliver each one through the shared send gate, and park anything that
//! fails delivery in the unsent queue. Once every sub-alert has reached a
//! terminal state (delivered or parked), the record is removed. A failed
//! insert into the unsent queue aborts before the remove, so a message is
//! never lost silently.

use crate::core::{
    expand_record, AlertCategory, AlertStore, NotificationSink, StoreError, UnsentMessage,
    CHANNEL, UNSENT_INDEX,
};
use crate::formatting::{format_sub_alert, render_text};
use crate::rate_limit::SendGate;
use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, error, warn};

pub async fn dispatch_category(
    category: AlertCategory,
    store: &dyn AlertStore,
    sink: &dyn NotificationSink,
    gate: &SendGate,
) -> Result<()> {
    let records = store
        .fetch_pending(category.index())
        .await
        .with_context(|| format!("fetching pending {} records", category))?;
    debug!(category = %category, count = records.len(), "fetched pending records");

    for record in records {
        // A corrupt embedded list aborts the category task; the record stays
        // in its index for the operator to inspect.
        let docs = expand_record(category, &record)?;

        for doc in &docs {
            let undelivered = match format_sub_alert(category, doc) {
                Ok(formatted) => {
                    let text = render_text(&formatted.host, &formatted.subject, &formatted.body);
                    match gate.send(sink, CHANNEL, &text).await {
                        Ok(()) => {
                            metrics::counter!(
                                "alerts_delivered_total",
                                "category" => category.index()
                            )
                            .increment(1);
                            None
                        }
                        Err(e) => {
                            warn!(
                                category = %category,
                                record = %record.id,
                                error = %e,
                                "delivery failed, queueing for redelivery"
                            );
                            Some(UnsentMessage::new(
                                formatted.host,
                                formatted.subject,
                                formatted.body,
                            ))
                        }
                    }
                }
                Err(e) => {
                    // A sub-alert we cannot format is still never dropped: it
                    // goes to the unsent queue with the raw document as body.
                    error!(
                        category = %category,
                        record = %record.id,
                        error = %e,
                        "malformed sub-alert, queueing raw document"
                    );
                    let host = doc
                        .pointer("/host/name")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string();
                    Some(UnsentMessage::new(
                        host,
                        format!("Malformed {} alert", category),
                        doc.to_string(),
                    ))
                }
            };

            if let Some(unsent) = undelivered {
                let body = serde_json::to_value(&unsent).context("serializing unsent message")?;
                store
                    .insert(UNSENT_INDEX, &body)
                    .await
                    .with_context(|| {
                        format!("queueing unsent message for record {}", record.id)
                    })?;
                metrics::counter!("alerts_requeued_total", "category" => category.index())
                    .increment(1);
            }
        }

        match store.remove(category.index(), &record.id).await {
            Ok(()) => debug!(category = %category, id = %record.id, "record processed and removed"),
            Err(StoreError::NotFound) => {
                warn!(category = %category, id = %record.id, "record was already removed")
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("removing {} record {}", category, record.id))
            }
        }
    }
    Ok(())
}
