//! Sync Engine - Fans repository synchronization out across bounded workers
//!
//! Every repository is planned and executed on its own tokio task. A semaphore
//! caps how many of them do git work at the same time, and a failed repository
//! never stops the others. The engine returns only once every repository has
//! produced an outcome.

use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, info_span, Instrument};

use crate::discovery::RepositoryDescriptor;
use crate::error::SyncError;
use crate::events::EventSink;
use crate::git::{plan, SyncExecutor, SyncOutcome, SyncStatus};

/// Aggregate result of a completed run
#[derive(Debug)]
pub struct RunResult {
    /// Number of outcomes that failed
    pub failure_count: usize,
    /// One outcome per listed repository, in completion order
    pub outcomes: Vec<SyncOutcome>,
    pub duration: Duration,
}

impl RunResult {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.total() - self.failure_count
    }

    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

/// Coordinates planning and execution with bounded concurrency
#[derive(Clone)]
pub struct SyncEngine {
    executor: Arc<dyn SyncExecutor>,
    max_parallel: usize,
}

impl SyncEngine {
    pub fn new(executor: Arc<dyn SyncExecutor>, max_parallel: usize) -> Self {
        Self {
            executor,
            max_parallel: max_parallel.max(1),
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Sync every repository into `target_dir` and wait for all of them
    pub async fn run_all(
        &self,
        repositories: Vec<RepositoryDescriptor>,
        target_dir: &Path,
        updates: &EventSink,
    ) -> RunResult {
        let start_time = Instant::now();

        info!(
            "Syncing {} repositories with up to {} in parallel",
            repositories.len(),
            self.max_parallel
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = FuturesUnordered::new();

        for repository in repositories {
            let semaphore = semaphore.clone();
            let executor = self.executor.clone();
            let updates = updates.clone();
            let target_dir = target_dir.to_path_buf();
            let span = info_span!("sync", repository = %repository.name);
            let fallback = repository.clone();

            let handle = tokio::spawn(
                async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            let path = target_dir.join(&repository.name);
                            let error = SyncError::Worker(e.to_string());
                            return failed_outcome(repository, path, error, &updates).await;
                        }
                    };

                    let plan = plan(&repository, &target_dir);
                    debug!("Planned {:?} at {}", plan.operation, plan.local_path.display());
                    executor.execute(&repository, &plan, &updates).await
                }
                .instrument(span),
            );

            tasks.push(async move { (fallback, handle.await) });
        }

        let mut outcomes = Vec::new();

        while let Some((repository, joined)) = tasks.next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Worker for {} did not finish: {}", repository.name, e);
                    let path = target_dir.join(&repository.name);
                    failed_outcome(repository, path, SyncError::Worker(e.to_string()), updates).await
                }
            };
            outcomes.push(outcome);
        }

        let failure_count = outcomes.iter().filter(|o| o.is_failed()).count();
        let duration = start_time.elapsed();

        info!(
            "Sync completed in {:.2}s: {} succeeded, {} failed",
            duration.as_secs_f64(),
            outcomes.len() - failure_count,
            failure_count
        );

        RunResult {
            failure_count,
            outcomes,
            duration,
        }
    }
}

/// Report a failure the executor itself never got to report
async fn failed_outcome(
    repository: RepositoryDescriptor,
    path: PathBuf,
    error: SyncError,
    updates: &EventSink,
) -> SyncOutcome {
    updates
        .error(&repository.name, format!("{}: {}", repository.name, error))
        .await;

    SyncOutcome {
        repository,
        path,
        status: SyncStatus::Failed(error),
    }
}
