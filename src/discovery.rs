//! Repository discovery abstraction layer
//!
//! This module provides a provider-agnostic interface for enumerating the
//! repositories to back up. [`GitHubLister`](crate::github::GitHubLister) is the
//! production implementation; tests substitute their own.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Scope;
use crate::error::ListingError;

/// Minimal remote metadata needed to mirror a repository locally
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryDescriptor {
    /// Repository name, also the directory name under the target directory
    pub name: String,

    /// URL handed to `git clone`
    pub clone_url: String,

    /// Default branch name, if reported
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl RepositoryDescriptor {
    pub fn new(name: impl Into<String>, clone_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clone_url: clone_url.into(),
            default_branch: None,
        }
    }
}

/// Enumerates every repository in a scope.
///
/// Implementations return the complete set or an error; partial listings are
/// never returned.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositoryLister: Send + Sync {
    async fn list(
        &self,
        scope: &Scope,
        secret: Option<String>,
    ) -> Result<Vec<RepositoryDescriptor>, ListingError>;
}

/// Names that occur more than once in a listing
pub fn duplicate_names(repositories: &[RepositoryDescriptor]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    let mut duplicates = Vec::new();

    for repo in repositories {
        if !seen.insert(repo.name.as_str()) && !duplicates.contains(&repo.name.as_str()) {
            duplicates.push(repo.name.as_str());
        }
    }

    duplicates
}
