//! repovault - Mirror every repository of a GitHub account locally
//!
//! repovault enumerates the repositories of a GitHub user, organization or
//! authenticated identity and keeps a working copy of each under one target
//! directory: missing repositories are cloned, existing ones fast-forwarded.
//! Individual failures are reported and counted without stopping the run.
//!
//! ## Modules
//!
//! - [`config`]: Run configuration and file-backed settings
//! - [`discovery`]: Repository descriptors and the listing abstraction
//! - [`github`]: Paginated GitHub API listing
//! - [`git`]: Clone/update planning and git execution
//! - [`sync`]: Bounded parallel fan-out
//! - [`backup`]: Run orchestration
//! - [`events`]: Progress update stream

pub mod backup;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod git;
pub mod github;
pub mod sync;

pub use backup::{run, run_with};
pub use config::{Config, Scope, Settings};
pub use discovery::{RepositoryDescriptor, RepositoryLister};
pub use error::{BackupError, ListingError, SyncError};
pub use events::{EventSink, Update, UpdateKind};
pub use git::{GitExecutor, Operation, SyncExecutor, SyncOutcome, SyncPlan, SyncStatus};
pub use github::GitHubLister;
pub use sync::{RunResult, SyncEngine};
