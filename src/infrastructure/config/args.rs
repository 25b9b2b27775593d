use clap::Parser;
use std::path::PathBuf;

use super::app_config::LogLevel;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "pictor",
    version,
    about = "A terminal client for self-hosted image catalogs",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Base URL of the catalog service.
    #[arg(long, env = "PICTOR_SERVER", value_name = "URL")]
    pub server_url: Option<String>,

    /// Session cookie obtained from the browser OAuth dance.
    #[arg(long, env = "PICTOR_SESSION", hide_env_values = true)]
    pub session_cookie: Option<String>,

    /// Preferred page size.
    #[arg(long, value_name = "N")]
    pub page_size: Option<u16>,

    /// Enable desktop notifications.
    #[arg(long)]
    pub desktop_notifications: Option<bool>,

    /// Image files to pre-stage in the upload queue.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}
