use sha2::{Digest, Sha256};
use std::fmt;

/// Length of the hex fingerprint used as a progress task key
pub const IDENTITY_LEN: usize = 8;

/// Derive the stable task key for a command.
///
/// SHA-256 over the UTF-8 command text, truncated to the first
/// [`IDENTITY_LEN`] hex characters. Same text always yields the same key.
pub fn fingerprint(command: &str) -> String {
    let digest = Sha256::digest(command.as_bytes());
    let mut identity = hex::encode(digest);
    identity.truncate(IDENTITY_LEN);
    identity
}

/// One shell command to run to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    command: String,
    identity: String,
    label: Option<String>,
}

impl Job {
    pub fn new<S: Into<String>>(command: S) -> Self {
        let command = command.into();
        let identity = fingerprint(&command);
        Self {
            command,
            identity,
            label: None,
        }
    }

    /// Human readable name shown on the progress display
    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The label if one was set, otherwise the command itself
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.command)
    }
}

impl From<String> for Job {
    fn from(command: String) -> Self {
        Job::new(command)
    }
}

impl From<&str> for Job {
    fn from(command: &str) -> Self {
        Job::new(command)
    }
}

/// How a single job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded,
    /// Exit code is `None` when the process was terminated by a signal
    Failed { exit_code: Option<i32> },
}

impl JobStatus {
    pub fn from_exit_code(exit_code: Option<i32>) -> Self {
        match exit_code {
            Some(0) => JobStatus::Succeeded,
            other => JobStatus::Failed { exit_code: other },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Succeeded => write!(f, "ok"),
            JobStatus::Failed { exit_code: Some(code) } => write!(f, "failed (exit {})", code),
            JobStatus::Failed { exit_code: None } => write!(f, "failed (killed)"),
        }
    }
}

/// Outcome of one job within a batch, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub job: Job,
    pub status: JobStatus,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
