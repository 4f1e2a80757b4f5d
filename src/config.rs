use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::BackupError;
use crate::events::EventSink;
use crate::github::MAX_PAGE_SIZE;

/// Which repositories to enumerate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// A named user or organization
    Account(String),
    /// Every repository the authenticated identity can access
    AuthenticatedUser,
}

impl Scope {
    /// Build a scope from a possibly empty account name
    pub fn from_account(account: impl Into<String>) -> Self {
        let account = account.into();
        let account = account.trim();
        if account.is_empty() {
            Scope::AuthenticatedUser
        } else {
            Scope::Account(account.to_string())
        }
    }

    pub fn account(&self) -> Option<&str> {
        match self {
            Scope::Account(name) => Some(name),
            Scope::AuthenticatedUser => None,
        }
    }
}

/// Everything a single backup run needs
#[derive(Debug, Clone)]
pub struct Config {
    pub scope: Scope,

    /// Password or personal access token for the hosting API
    pub secret: Option<String>,

    /// Directory the working copies are kept in
    pub target_dir: PathBuf,

    /// Where progress updates are delivered
    pub updates: EventSink,

    /// Tunables, usually loaded from the settings file
    pub settings: Settings,
}

impl Config {
    /// Create a run configuration.
    ///
    /// An empty account selects the authenticated user; an empty secret means
    /// unauthenticated access.
    pub fn new(
        account: impl Into<String>,
        secret: impl Into<String>,
        target_dir: impl Into<PathBuf>,
        updates: EventSink,
    ) -> Self {
        let secret = secret.into();
        Self {
            scope: Scope::from_account(account),
            secret: if secret.is_empty() { None } else { Some(secret) },
            target_dir: target_dir.into(),
            updates,
            settings: Settings::default(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Reject configurations that cannot possibly produce a run
    pub fn validate(&self) -> std::result::Result<(), BackupError> {
        if self.scope == Scope::AuthenticatedUser && self.secret.is_none() {
            return Err(BackupError::Configuration(
                "at least one of account or secret must be specified".to_string(),
            ));
        }

        if self.target_dir.as_os_str().is_empty() {
            return Err(BackupError::Configuration(
                "target directory must not be empty".to_string(),
            ));
        }

        if self.settings.sync.max_parallel == 0 {
            return Err(BackupError::Configuration(
                "sync.max_parallel must be at least 1".to_string(),
            ));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.settings.github.page_size) {
            return Err(BackupError::Configuration(format!(
                "github.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(())
    }
}

/// File-backed tunables
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Hosting API settings
    #[serde(default)]
    pub github: GitHubSettings,

    /// Clone/update behavior
    #[serde(default)]
    pub sync: SyncSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// GitHub API configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubSettings {
    /// Base URL of the REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Repositories requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Timeout for a single listing request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncSettings {
    /// Maximum parallel clone/update operations
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Timeout for git operations in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingSettings {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_page_size() -> u32 {
    100
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_parallel() -> usize {
    4
}
fn default_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            timeout: default_timeout(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl GitHubSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl SyncSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Settings {
    /// Load settings from the default location, falling back to defaults
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_config_path()?;

        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!("No settings file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Load settings from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(settings)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repovault").join("config.yml"))
    }
}

/// Expand `~` and environment variables in a user supplied directory
pub fn expand_dir(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand directory path: {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
