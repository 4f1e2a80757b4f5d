//! Run orchestration
//!
//! Validates the configuration, prepares the target directory, lists the
//! remote repositories and hands them to the [`SyncEngine`]. Nothing is
//! emitted on the update stream until the listing has succeeded, so a fatal
//! run is silent apart from its returned error.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::discovery::{duplicate_names, RepositoryLister};
use crate::error::BackupError;
use crate::git::{GitExecutor, SyncExecutor};
use crate::github::GitHubLister;
use crate::sync::{RunResult, SyncEngine};

/// Back up every repository in the configured scope
pub async fn run(config: Config) -> Result<RunResult, BackupError> {
    config.validate()?;

    let lister = GitHubLister::new(&config.settings.github).map_err(|e| {
        BackupError::Configuration(format!("cannot build GitHub client: {}", e))
    })?;
    let executor = Arc::new(GitExecutor::from_config(&config));

    run_with(&config, &lister, executor).await
}

/// Back up with caller supplied listing and execution capabilities
pub async fn run_with(
    config: &Config,
    lister: &dyn RepositoryLister,
    executor: Arc<dyn SyncExecutor>,
) -> Result<RunResult, BackupError> {
    config.validate()?;

    prepare_target_dir(&config.target_dir).await?;

    info!("Listing repositories for {:?}", config.scope);
    let repositories = lister
        .list(&config.scope, config.secret.clone())
        .await?;
    info!("Discovered {} repositories", repositories.len());

    // Same-named repositories share a local path; the last writer wins
    for name in duplicate_names(&repositories) {
        warn!("Repository name {} is listed more than once", name);
    }

    let engine = SyncEngine::new(executor, config.settings.sync.max_parallel);
    Ok(engine
        .run_all(repositories, &config.target_dir, &config.updates)
        .await)
}

/// Create the target directory if needed and make sure it is a directory
async fn prepare_target_dir(path: &Path) -> Result<(), BackupError> {
    let unusable = |source| BackupError::TargetDirectory {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::create_dir_all(path).await.map_err(unusable)?;

    let metadata = tokio::fs::metadata(path).await.map_err(unusable)?;
    if !metadata.is_dir() {
        return Err(unusable(std::io::Error::new(
            std::io::ErrorKind::Other,
            "not a directory",
        )));
    }

    debug!("Using target directory {}", path.display());
    Ok(())
}
