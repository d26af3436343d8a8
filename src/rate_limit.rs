//! Global send throttle shared by every task that talks to the sink.
//!
//! The per-task grace sleeps of the original design did not serialize sends
//! across concurrently-running category tasks, so the documented rate-limit
//! guarantee only held per task. The gate replaces them: every sink call goes
//! through [`SendGate::send`], which holds the gate for the whole call and
//! first waits out whatever remains of the grace period since the previous
//! attempt. Every attempted send consumes budget, successful or not.

use crate::core::{NotificationSink, SendError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

pub struct SendGate {
    last_attempt: Mutex<Option<Instant>>,
    grace: Duration,
}

impl SendGate {
    pub fn new(grace: Duration) -> Self {
        Self {
            last_attempt: Mutex::new(None),
            grace,
        }
    }

    /// Sends one message through the sink under the global throttle.
    pub async fn send(
        &self,
        sink: &dyn NotificationSink,
        channel: &str,
        text: &str,
    ) -> Result<(), SendError> {
        let mut last = self.last_attempt.lock().await;
        if let Some(previous) = *last {
            trace!("waiting out send grace period");
            sleep_until(previous + self.grace).await;
        }
        let result = sink.send(channel, text).await;
        *last = Some(Instant::now());
        result
    }
}
