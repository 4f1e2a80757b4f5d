//! Common test utilities and helpers for repovault tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Command;
use tokio::sync::mpsc;

use repovault::{ListingError, RepositoryDescriptor, RepositoryLister, Scope, Update};

/// Run git in `dir`, panicking with its stderr on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=repovault-tests",
            "-c",
            "user.email=tests@repovault.invalid",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute git");

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A bare "remote" repository plus the working repository that feeds it
pub struct RemoteFixture {
    pub name: String,
    pub work: PathBuf,
    pub bare: PathBuf,
}

impl RemoteFixture {
    /// Create a remote with one commit under `root`
    pub fn create(root: &Path, name: &str) -> Self {
        let work = root.join("work").join(name);
        let bare = root.join("remotes").join(format!("{}.git", name));
        std::fs::create_dir_all(&work).expect("Failed to create work dir");
        std::fs::create_dir_all(bare.parent().unwrap()).expect("Failed to create remotes dir");

        git(&work, &["init", "-q"]);
        std::fs::write(work.join("README.md"), format!("# {}\n", name)).unwrap();
        git(&work, &["add", "."]);
        git(&work, &["commit", "-q", "-m", "Initial commit"]);
        git(root, &["clone", "-q", "--bare", work.to_str().unwrap(), bare.to_str().unwrap()]);

        Self {
            name: name.to_string(),
            work,
            bare,
        }
    }

    /// Create a remote with no commits at all
    pub fn empty(root: &Path, name: &str) -> Self {
        let bare = root.join("remotes").join(format!("{}.git", name));
        std::fs::create_dir_all(&bare).expect("Failed to create remote dir");
        git(&bare, &["init", "-q", "--bare"]);

        Self {
            name: name.to_string(),
            work: root.join("work").join(name),
            bare,
        }
    }

    /// Commit a file in the work repository and push it to the remote
    pub fn push_file(&self, file: &str, contents: &str) {
        std::fs::write(self.work.join(file), contents).unwrap();
        git(&self.work, &["add", "."]);
        git(&self.work, &["commit", "-q", "-m", &format!("Add {}", file)]);
        git(&self.work, &["push", "-q", self.bare.to_str().unwrap(), "HEAD"]);
    }

    pub fn descriptor(&self) -> RepositoryDescriptor {
        RepositoryDescriptor::new(&self.name, self.bare.to_string_lossy())
    }
}

/// Accept HTTP connections and never answer them.
///
/// Returns a clone URL pointing at the listener.
pub fn stalled_remote(name: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Listener has no address");

    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });

    format!("http://{}/{}.git", addr, name)
}

/// Lister that returns a fixed set of repositories
pub struct StaticLister {
    pub repositories: Vec<RepositoryDescriptor>,
}

#[async_trait]
impl RepositoryLister for StaticLister {
    async fn list(
        &self,
        _scope: &Scope,
        _secret: Option<String>,
    ) -> Result<Vec<RepositoryDescriptor>, ListingError> {
        Ok(self.repositories.clone())
    }
}

/// Take every update currently queued
pub fn drain(receiver: &mut mpsc::Receiver<Update>) -> Vec<Update> {
    let mut updates = Vec::new();
    while let Ok(update) = receiver.try_recv() {
        updates.push(update);
    }
    updates
}
