//! A client for posting messages to the Slack Web API.

use crate::core::NotificationSink;
use crate::notification::SendError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A client for the `chat.postMessage` endpoint.
pub struct SlackClient {
    api_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackClient {
    /// Creates a new `SlackClient`.
    pub fn new(api_url: &str, token: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }
}

#[async_trait]
impl NotificationSink for SlackClient {
    #[instrument(skip(self, text))]
    async fn send(&self, channel: &str, text: &str) -> Result<(), SendError> {
        let url = format!("{}/chat.postMessage", self.api_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({"channel": channel, "text": text}))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to Slack failed");
                SendError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            error!(status = %status, "Slack returned a non-success status");
            return Err(SendError::Transport(format!(
                "chat.postMessage returned {}",
                status
            )));
        }

        let ack: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        if ack.ok {
            info!(channel, "message delivered");
            Ok(())
        } else {
            let reason = ack.error.unwrap_or_else(|| "unknown error".to_string());
            error!(channel, reason, "Slack acknowledged the request but rejected the message");
            Err(SendError::Rejected(reason))
        }
    }
}
