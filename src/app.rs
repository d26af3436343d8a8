//! The main application logic, decoupled from the entry point.

use crate::config::Config;
use crate::core::{AlertCategory, AlertStore, NotificationSink, GRACE_PERIOD};
use crate::dispatcher::dispatch_category;
use crate::drainer::drain_unsent;
use crate::notification::slack::SlackClient;
use crate::rate_limit::SendGate;
use crate::store::ElasticStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// The assembled application: shared clients plus the global send gate.
pub struct App {
    store: Arc<dyn AlertStore>,
    sink: Arc<dyn NotificationSink>,
    gate: Arc<SendGate>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// Runs one full pass: the unsent-queue drainer plus one dispatcher task
    /// per category, concurrently. Each task is strictly sequential inside.
    ///
    /// Task failures are logged individually; the pass as a whole fails if
    /// any task did, so the scheduler invocation exits non-zero.
    pub async fn run_once(&self) -> Result<()> {
        let drainer = {
            let store = self.store.clone();
            let sink = self.sink.clone();
            let gate = self.gate.clone();
            tokio::spawn(async move { drain_unsent(&*store, &*sink, &gate).await })
        };

        let mut dispatchers = Vec::new();
        for category in AlertCategory::ALL {
            let store = self.store.clone();
            let sink = self.sink.clone();
            let gate = self.gate.clone();
            dispatchers.push((
                category,
                tokio::spawn(
                    async move { dispatch_category(category, &*store, &*sink, &gate).await },
                ),
            ));
        }

        let mut failures = 0usize;
        match drainer.await {
            Ok(Ok(())) => info!("unsent-queue drainer finished"),
            Ok(Err(e)) => {
                error!("unsent-queue drainer failed: {:#}", e);
                failures += 1;
            }
            Err(e) => {
                error!("unsent-queue drainer panicked: {:?}", e);
                failures += 1;
            }
        }
        for (category, handle) in dispatchers {
            match handle.await {
                Ok(Ok(())) => info!(category = %category, "dispatcher finished"),
                Ok(Err(e)) => {
                    error!(category = %category, "dispatcher failed: {:#}", e);
                    failures += 1;
                }
                Err(e) => {
                    error!(category = %category, "dispatcher panicked: {:?}", e);
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{} task(s) failed, see log for details", failures);
        }
        Ok(())
    }
}

/// Builder for the main application.
///
/// This pattern separates constructing the application's components from
/// running it, and lets tests substitute in-memory collaborators for the
/// real HTTP clients.
pub struct AppBuilder {
    config: Config,
    store_override: Option<Arc<dyn AlertStore>>,
    sink_override: Option<Arc<dyn NotificationSink>>,
    grace_override: Option<Duration>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store_override: None,
            sink_override: None,
            grace_override: None,
        }
    }

    /// Overrides the alert store for testing.
    pub fn store_override(mut self, store: Arc<dyn AlertStore>) -> Self {
        self.store_override = Some(store);
        self
    }

    /// Overrides the notification sink for testing.
    pub fn sink_override(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink_override = Some(sink);
        self
    }

    /// Overrides the send grace period for testing.
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace_override = Some(grace);
        self
    }

    /// Builds all application components, returning a runnable `App`.
    pub fn build(self) -> Result<App> {
        let store: Arc<dyn AlertStore> = match self.store_override {
            Some(store) => store,
            None => Arc::new(ElasticStore::new(&self.config.elasticsearch.url)?),
        };
        let sink: Arc<dyn NotificationSink> = match self.sink_override {
            Some(sink) => sink,
            None => Arc::new(SlackClient::new(
                &self.config.slack.api_url,
                &self.config.slack.token,
            )?),
        };
        let gate = Arc::new(SendGate::new(self.grace_override.unwrap_or(GRACE_PERIOD)));
        Ok(App { store, sink, gate })
    }
}
