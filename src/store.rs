//! HTTP client for the Elasticsearch-style alert store.
//!
//! The store exposes three operations: a match-all search per index, a
//! delete-by-id, and a document insert. No filtering, sorting, or pagination
//! parameters are used; the default search window is assumed sufficient.

use crate::core::{AlertStore, StoredRecord};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StoreError {
    /// The document was already removed. Benign on delete.
    #[error("document not found")]
    NotFound,
    /// The backing store failed or is unreachable. Aborts the enclosing task.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// A client for the search/index HTTP API.
pub struct ElasticStore {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: Value,
}

impl ElasticStore {
    /// Creates a new `ElasticStore` for the given base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl AlertStore for ElasticStore {
    #[instrument(skip(self))]
    async fn fetch_pending(&self, index: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let url = format!("{}/{}/_search", self.base_url, index);
        let response = self
            .client
            .post(&url)
            .json(&json!({"query": {"match_all": {}}}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "search on {} returned {}",
                index,
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await?;
        let records: Vec<StoredRecord> = body
            .hits
            .hits
            .into_iter()
            .map(|hit| StoredRecord {
                id: hit.id,
                source: hit.source,
            })
            .collect();
        debug!(index, count = records.len(), "fetched pending records");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn remove(&self, index: &str, id: &str) -> Result<(), StoreError> {
        let url = format!("{}/{}/_doc/{}", self.base_url, index, id);
        let response = self.client.delete(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound);
        }
        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "delete of {}/{} returned {}",
                index,
                id,
                response.status()
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, body))]
    async fn insert(&self, index: &str, body: &Value) -> Result<(), StoreError> {
        let url = format!("{}/{}/_doc", self.base_url, index);
        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(StoreError::Unavailable(format!(
                "insert into {} returned {}",
                index,
                response.status()
            )));
        }
        Ok(())
    }
}
