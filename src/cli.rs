//! Command-Line Interface (CLI) argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Relays pending monitoring alerts from the search index to chat, once per
/// invocation. Re-run it from a periodic scheduler.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "alertrelay.toml")]
    pub config: PathBuf,
}
