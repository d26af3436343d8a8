//! AlertRelay - monitoring alert delivery relay
//!
//! One pass per invocation: drain the unsent queue, dispatch every pending
//! alert record, exit. An external scheduler re-invokes the process.

use alertrelay::{app::App, cli::Cli, config::Config};
use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    if config.slack.token.is_empty() {
        anyhow::bail!("slack.token is not configured");
    }

    info!(
        elasticsearch = %config.elasticsearch.url,
        "AlertRelay starting single pass"
    );

    let app = App::builder(config).build()?;
    app.run_once().await?;

    info!("pass complete");
    Ok(())
}
