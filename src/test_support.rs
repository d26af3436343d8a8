//! In-memory fakes for the store and sink, shared by unit and integration
//! tests.

use crate::core::{AlertStore, NotificationSink, SendError, StoreError, StoredRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory `AlertStore` keyed by index name, with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    indices: Mutex<HashMap<String, Vec<StoredRecord>>>,
    next_id: AtomicUsize,
    fail_inserts: AtomicBool,
    fail_removes: AtomicBool,
    removes_report_not_found: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one document into an index and returns its assigned id.
    pub fn seed(&self, index: &str, source: Value) -> String {
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.indices
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default()
            .push(StoredRecord {
                id: id.clone(),
                source,
            });
        id
    }

    /// Snapshot of the documents currently in an index.
    pub fn records(&self, index: &str) -> Vec<StoredRecord> {
        self.indices
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every subsequent insert fail with `StoreError::Unavailable`.
    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    /// Makes every subsequent remove fail with `StoreError::Unavailable`.
    pub fn fail_removes(&self) {
        self.fail_removes.store(true, Ordering::SeqCst);
    }

    /// Makes every subsequent remove report `StoreError::NotFound`, as if
    /// the document had already been deleted.
    pub fn removes_report_not_found(&self) {
        self.removes_report_not_found.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn fetch_pending(&self, index: &str) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.records(index))
    }

    async fn remove(&self, index: &str, id: &str) -> Result<(), StoreError> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected remove failure".into()));
        }
        if self.removes_report_not_found.load(Ordering::SeqCst) {
            return Err(StoreError::NotFound);
        }
        let mut indices = self.indices.lock().unwrap();
        let records = indices.get_mut(index).ok_or(StoreError::NotFound)?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert(&self, index: &str, body: &Value) -> Result<(), StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected insert failure".into()));
        }
        self.seed(index, body.clone());
        Ok(())
    }
}

/// One message a [`RecordingSink`] accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub channel: String,
    pub text: String,
}

/// A `NotificationSink` that records every attempt and replays programmed
/// outcomes in order. When the outcome queue is empty, sends succeed.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<SentMessage>>,
    outcomes: Mutex<VecDeque<Result<(), SendError>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome for the next send attempt.
    pub fn push_outcome(&self, outcome: Result<(), SendError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Every attempt recorded so far, in order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, channel: &str, text: &str) -> Result<(), SendError> {
        self.sent.lock().unwrap().push(SentMessage {
            channel: channel.to_string(),
            text: text.to_string(),
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}
