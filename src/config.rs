//! Configuration management for AlertRelay
//!
//! This module defines the main `Config` struct, responsible for holding all
//! application settings. It uses the `figment` crate to load configuration
//! from an `alertrelay.toml` file and merge it with environment variables.
//!
//! The notification channel, grace period, and unsent index are fixed
//! constants in [`crate::core`], not runtime settings.

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the backing search/index store.
    pub elasticsearch: ElasticsearchConfig,
    /// Configuration for the chat endpoint.
    pub slack: SlackConfig,
}

/// Configuration for the backing search/index store.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ElasticsearchConfig {
    /// Base URL of the store's HTTP API.
    pub url: String,
}

/// Configuration for the chat endpoint.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SlackConfig {
    /// The bot token used as a bearer credential.
    pub token: String,
    /// Base URL of the Web API. Overridable for tests.
    pub api_url: String,
}

impl Config {
    /// Loads the application configuration from the specified file, letting
    /// `ALERTRELAY_`-prefixed environment variables override it.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("ALERTRELAY_"))
            .extract()?;
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            elasticsearch: ElasticsearchConfig {
                url: "http://localhost:9200".to_string(),
            },
            slack: SlackConfig {
                token: String::new(),
                api_url: "https://slack.com/api".to_string(),
            },
        }
    }
}
