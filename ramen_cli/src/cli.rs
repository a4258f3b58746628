//! CLI argument definitions.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ramen", version, about = "Ramen machine controller")]
pub struct Cli {
    /// Path to config TOML; missing file falls back to built-in defaults
    #[arg(long, value_name = "FILE", default_value = "etc/machine.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides the config
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Override the polling period in milliseconds
    #[arg(long, value_name = "MS")]
    pub tick_ms: Option<u64>,

    /// Run exactly this many ticks and exit (smoke tests and CI)
    #[arg(long, value_name = "N")]
    pub ticks: Option<u64>,

    /// Skip quadrature encoder setup
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_encoder: bool,
}
