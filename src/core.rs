//! Core domain types and service traits for AlertRelay
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use crate::notification::SendError;
pub use crate::store::StoreError;

/// Channel every notification is posted to.
pub const CHANNEL: &str = "#alerts";

/// Index holding messages that failed delivery and await redelivery.
pub const UNSENT_INDEX: &str = "unsent-messages";

/// Delay between consecutive sends, to stay under the endpoint's rate limit.
pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// The fixed set of monitoring alert categories.
///
/// Each category maps to one index in the backing store. Adding a category
/// means adding a variant here; the formatter's exhaustive match will then
/// refuse to compile until the new category has formatting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    LogErrors,
    DiskSpace,
    MemoryUsage,
    Systemd,
    DockerUnhealthyContainer,
}

impl AlertCategory {
    pub const ALL: [AlertCategory; 5] = [
        AlertCategory::LogErrors,
        AlertCategory::DiskSpace,
        AlertCategory::MemoryUsage,
        AlertCategory::Systemd,
        AlertCategory::DockerUnhealthyContainer,
    ];

    /// Name of the index this category's pending records live in.
    pub fn index(&self) -> &'static str {
        match self {
            AlertCategory::LogErrors => "log-errors",
            AlertCategory::DiskSpace => "disk-space",
            AlertCategory::MemoryUsage => "memory-usage",
            AlertCategory::Systemd => "systemd",
            AlertCategory::DockerUnhealthyContainer => "docker-unhealthy-container",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.index())
    }
}

/// One raw hit from the backing store: the store-assigned identity plus the
/// unparsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub source: Value,
}

/// A flattened, already-formatted notification awaiting redelivery.
///
/// Created when delivery of a sub-alert fails, destroyed when redelivery
/// succeeds. Lives in [`UNSENT_INDEX`], independent of the originating
/// record's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnsentMessage {
    pub host: String,
    pub subject: String,
    pub message: String,
    /// When the message was parked, for operator visibility into queue age.
    #[serde(default)]
    pub queued_at: String,
}

impl UnsentMessage {
    pub fn new(host: String, subject: String, message: String) -> Self {
        Self {
            host,
            subject,
            message,
            queued_at: Utc::now().to_rfc3339(),
        }
    }
}

/// A record whose payload cannot be decoded or is missing a required field.
#[derive(Debug, Error)]
#[error("malformed {category} alert: {detail}")]
pub struct MalformedAlert {
    pub category: AlertCategory,
    pub detail: String,
}

/// Expands a fetched record into its deliverable sub-alert documents.
///
/// `log-errors` records are direct: the record itself is the one deliverable
/// unit. The four system categories carry their sub-alerts as a JSON-encoded
/// string in the record's `alerts` field; a corrupt or missing embedded list
/// is an error for the whole record, never a silent skip.
pub fn expand_record(
    category: AlertCategory,
    record: &StoredRecord,
) -> Result<Vec<Value>, MalformedAlert> {
    match category {
        AlertCategory::LogErrors => Ok(vec![record.source.clone()]),
        _ => {
            let encoded = record
                .source
                .get("alerts")
                .and_then(Value::as_str)
                .ok_or_else(|| MalformedAlert {
                    category,
                    detail: format!("record {} has no embedded alerts field", record.id),
                })?;
            serde_json::from_str::<Vec<Value>>(encoded).map_err(|e| MalformedAlert {
                category,
                detail: format!("record {}: {}", record.id, e),
            })
        }
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Client for the backing search/index store.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Fetches all pending records of an index with a match-all query.
    ///
    /// May return a partial result set (the store's default query window);
    /// callers tolerate this rather than paginate.
    async fn fetch_pending(&self, index: &str) -> Result<Vec<StoredRecord>, StoreError>;

    /// Removes a record by id. `NotFound` if it was already removed.
    async fn remove(&self, index: &str, id: &str) -> Result<(), StoreError>;

    /// Inserts a new document into an index.
    async fn insert(&self, index: &str, body: &Value) -> Result<(), StoreError>;
}

/// Client for the chat delivery endpoint.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Posts one message to a channel.
    ///
    /// An application-level non-OK acknowledgment surfaces as
    /// [`SendError::Rejected`]; network failures as [`SendError::Transport`].
    /// Callers treat both the same way: the delivery failed.
    async fn send(&self, channel: &str, text: &str) -> Result<(), SendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, source: Value) -> StoredRecord {
        StoredRecord {
            id: id.to_string(),
            source,
        }
    }

    #[test]
    fn log_errors_records_are_direct() {
        let source = json!({"host": {"name": "web-1"}, "message": "boom"});
        let docs = expand_record(AlertCategory::LogErrors, &record("1", source.clone())).unwrap();
        assert_eq!(docs, vec![source]);
    }

    #[test]
    fn container_records_decode_embedded_list() {
        let embedded = json!([
            {"host": {"name": "db-1"}},
            {"host": {"name": "db-2"}},
        ]);
        let source = json!({"alerts": embedded.to_string()});
        let docs = expand_record(AlertCategory::DiskSpace, &record("1", source)).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["host"]["name"], "db-1");
    }

    #[test]
    fn empty_embedded_list_decodes_to_no_sub_alerts() {
        let source = json!({"alerts": "[]"});
        let docs = expand_record(AlertCategory::MemoryUsage, &record("1", source)).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn missing_embedded_list_is_an_error() {
        let err = expand_record(AlertCategory::Systemd, &record("7", json!({}))).unwrap_err();
        assert_eq!(err.category, AlertCategory::Systemd);
        assert!(err.to_string().contains("record 7"));
    }

    #[test]
    fn corrupt_embedded_list_is_an_error() {
        let source = json!({"alerts": "not json"});
        let err = expand_record(AlertCategory::DiskSpace, &record("1", source)).unwrap_err();
        assert!(err.to_string().contains("malformed disk-space alert"));
    }

    #[test]
    fn unsent_message_records_queue_time() {
        let msg = UnsentMessage::new("h".into(), "s".into(), "m".into());
        assert!(!msg.queued_at.is_empty());
    }

    #[test]
    fn category_indices_are_stable() {
        let names: Vec<_> = AlertCategory::ALL.iter().map(|c| c.index()).collect();
        assert_eq!(
            names,
            vec![
                "log-errors",
                "disk-space",
                "memory-usage",
                "systemd",
                "docker-unhealthy-container"
            ]
        );
    }
}
