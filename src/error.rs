//! Error taxonomy for a backup run.
//!
//! [`BackupError`] is fatal: it is returned before any repository is touched.
//! [`SyncError`] is per repository: it is captured into a failed
//! [`SyncOutcome`](crate::git::SyncOutcome) and never aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that stop a run before fan-out begins
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Target directory {path} is unusable: {source}")]
    TargetDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to list repositories: {0}")]
    Listing(#[from] ListingError),
}

/// Failures while enumerating remote repositories
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("authentication rejected ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("rate limit exceeded{}", reset_hint(.reset))]
    RateLimit { reset: Option<u64> },

    #[error("unexpected response {status} from {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

fn reset_hint(reset: &Option<u64>) -> String {
    match reset {
        Some(epoch) => format!(" (resets at unix time {})", epoch),
        None => String::new(),
    }
}

/// Per-repository failure detail
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git {command} timed out after {seconds}s")]
    TimedOut { command: String, seconds: u64 },

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("working copy has local modifications")]
    LocalChanges,

    #[error("worker task failed: {0}")]
    Worker(String),
}
