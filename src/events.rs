//! Progress event stream
//!
//! Every component that does observable work reports through an [`EventSink`].
//! The sink is a bounded queue with many producers and a single consumer owned
//! by the caller, so events from one producer arrive in the order they were
//! sent while events from concurrent repositories may interleave.

use tokio::sync::mpsc;
use tracing::debug;

/// Severity of an [`Update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Info,
    Error,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::Info => "info",
            UpdateKind::Error => "error",
        }
    }
}

/// A single progress message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub kind: UpdateKind,
    pub message: String,
    /// Repository the message belongs to, if any
    pub repository: Option<String>,
}

impl Update {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: UpdateKind::Info,
            message: message.into(),
            repository: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: UpdateKind::Error,
            message: message.into(),
            repository: None,
        }
    }

    /// Tag the update with the repository it concerns
    pub fn for_repository(mut self, name: impl Into<String>) -> Self {
        self.repository = Some(name.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == UpdateKind::Error
    }
}

/// Write-only handle onto the caller's update queue
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::Sender<Update>,
}

impl EventSink {
    /// Create a sink together with the receiving end the caller drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Update>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Deliver an update, waiting for queue capacity.
    ///
    /// A consumer that has gone away is not an error for the producer.
    pub async fn send(&self, update: Update) {
        if let Err(e) = self.sender.send(update).await {
            debug!("Update dropped, receiver closed: {}", e.0.message);
        }
    }

    pub async fn info(&self, repository: &str, message: impl Into<String>) {
        self.send(Update::info(message).for_repository(repository))
            .await;
    }

    pub async fn error(&self, repository: &str, message: impl Into<String>) {
        self.send(Update::error(message).for_repository(repository))
            .await;
    }
}
