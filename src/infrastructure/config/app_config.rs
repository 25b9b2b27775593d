//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::args::CliArgs;

pub(super) const APP_QUALIFIER: &str = "com";
pub(super) const APP_ORGANIZATION: &str = "tecknian";
pub(super) const APP_NAME: &str = "pictor";

const LOG_FILE_NAME: &str = "pictor.log";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:8000".to_owned()
}

const fn default_true() -> bool {
    true
}

/// Application configuration, from the config file with CLI overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path. Logging always goes to a file; the terminal belongs
    /// to the UI.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Base URL of the catalog service.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Session cookie obtained from the browser OAuth dance.
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// Preferred page size; snapped to the allowed set.
    #[serde(default)]
    pub page_size: Option<u16>,

    /// Enable desktop notifications.
    #[serde(default = "default_true")]
    pub enable_desktop_notifications: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LogLevel::default(),
            server_url: default_server_url(),
            session_cookie: None,
            page_size: None,
            enable_desktop_notifications: true,
        }
    }
}

impl AppConfig {
    /// Applies CLI overrides on top of the file-loaded configuration.
    #[must_use]
    pub fn merge_cli(mut self, cli: &CliArgs) -> Self {
        if cli.log_path.is_some() {
            self.log_path.clone_from(&cli.log_path);
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        if let Some(url) = &cli.server_url {
            self.server_url.clone_from(url);
        }
        if cli.session_cookie.is_some() {
            self.session_cookie.clone_from(&cli.session_cookie);
        }
        if cli.page_size.is_some() {
            self.page_size = cli.page_size;
        }
        if let Some(enabled) = cli.desktop_notifications {
            self.enable_desktop_notifications = enabled;
        }
        self
    }

    /// The log file to write to: the explicit path, or one under the
    /// platform cache directory.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(|| {
            ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
                .map(|dirs| dirs.cache_dir().join(LOG_FILE_NAME))
        })
    }
}
