//! CLI argument definitions for depwatch-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Depwatch dependency audit daemon.
///
/// Orchestrates the scan pipeline: isolated-workspace dependency
/// resolution, external vulnerability audits, risk scoring, and
/// per-project scan history.
#[derive(Parser, Debug)]
#[command(name = "depwatch-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to depwatch.toml configuration file.
    #[arg(short, long, default_value = "/etc/depwatch/depwatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Override PID file path (takes precedence over config file).
    #[arg(long)]
    pub pid_file: Option<String>,
}
