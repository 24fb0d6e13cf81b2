// Process supervision for external encoder commands
//
// - lines: byte stream -> line reassembly
// - pattern: pluggable per-line progress extraction
// - ShellRunner: runs one command through a shell and reports progress

pub mod lines;
pub mod pattern;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::pending;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

pub use lines::LineAssembler;
pub use pattern::{PercentPattern, ProgressPattern};

use crate::error::{HardbrakeError, Result};
use crate::job::Job;

/// How long to keep draining output after the process itself has exited.
/// Background children can hold the pipes open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 4096;

/// Number of trailing output lines kept for failure reports
const TAIL_LINES: usize = 8;

/// One progress report for a running command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Completion in `0..=100`
    pub percent: u8,
    /// Remaining time reported by the encoder, when it prints one
    pub eta: Option<Duration>,
}

impl Progress {
    pub fn new(percent: u8) -> Self {
        Self { percent, eta: None }
    }

    pub fn with_eta(mut self, eta: Option<Duration>) -> Self {
        self.eta = eta;
        self
    }
}

/// Progress callback: `(command, progress)`
pub type ProgressCallback<'a> = dyn FnMut(&str, Progress) + Send + 'a;

/// Result of one finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// Last percentage found in the output stream itself
    pub last_reported_percent: Option<u8>,
    /// Last few non-empty output lines
    pub tail: Vec<String>,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs one job to completion, reporting progress through a callback
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `job`, blocking until its process exits.
    ///
    /// A non-zero exit is reported in the [`RunResult`], never as an error.
    /// Returns [`HardbrakeError::Interrupted`] once `cancel` fires.
    async fn run(
        &self,
        job: &Job,
        on_progress: &mut ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<RunResult>;
}

/// Per-run mutable state
struct RunState<'p> {
    pattern: &'p dyn ProgressPattern,
    last_reported_percent: Option<u8>,
    tail: VecDeque<String>,
}

impl<'p> RunState<'p> {
    fn new(pattern: &'p dyn ProgressPattern) -> Self {
        Self {
            pattern,
            last_reported_percent: None,
            tail: VecDeque::with_capacity(TAIL_LINES),
        }
    }

    fn handle_line(&mut self, job: &Job, line: String, on_progress: &mut ProgressCallback<'_>) {
        trace!(job = %job.identity(), "{}", line);

        if let Some(percent) = self.pattern.extract(&line) {
            self.last_reported_percent = Some(percent);
            on_progress(job.command(), Progress::new(percent).with_eta(self.pattern.eta(&line)));
        }

        if !line.trim().is_empty() {
            if self.tail.len() == TAIL_LINES {
                self.tail.pop_front();
            }
            self.tail.push_back(line);
        }
    }

    fn into_result(self, status: ExitStatus) -> RunResult {
        RunResult {
            exit_code: status.code(),
            last_reported_percent: self.last_reported_percent,
            tail: self.tail.into_iter().collect(),
        }
    }
}

/// Runs commands through `<shell> -c`, reading stdout and stderr together
pub struct ShellRunner {
    shell: String,
    pattern: Arc<dyn ProgressPattern>,
}

impl ShellRunner {
    pub fn new<S: Into<String>>(shell: S) -> Self {
        Self {
            shell: shell.into(),
            pattern: Arc::new(PercentPattern::new()),
        }
    }

    /// Use a different progress extraction strategy
    pub fn with_pattern(mut self, pattern: Arc<dyn ProgressPattern>) -> Self {
        self.pattern = pattern;
        self
    }

    fn spawn(&self, job: &Job) -> Result<Child> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(job.command())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd.spawn().map_err(|source| HardbrakeError::Spawn {
            command: job.command().to_string(),
            source,
        })
    }

    async fn abort(child: &mut Child, job: &Job) -> HardbrakeError {
        info!(job = %job.identity(), "Cancellation requested, killing process");
        if let Err(e) = child.start_kill() {
            debug!(job = %job.identity(), "Process already gone: {}", e);
        }
        if let Err(e) = child.wait().await {
            warn!(job = %job.identity(), "Failed to reap killed process: {}", e);
        }
        HardbrakeError::Interrupted
    }
}

/// A shell killed by SIGINT means the user interrupted it from the terminal
#[cfg(unix)]
fn interrupted_by_user(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal() == Some(libc::SIGINT)
}

#[cfg(not(unix))]
fn interrupted_by_user(_status: &ExitStatus) -> bool {
    false
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

/// Read from a stream that may already be closed. A closed stream never
/// becomes ready, so it drops out of the select loop.
async fn read_chunk<R: AsyncRead + Unpin>(stream: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize> {
    match stream {
        Some(reader) => reader.read(buf).await,
        None => pending().await,
    }
}

async fn grace_expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

#[async_trait]
impl ProcessRunner for ShellRunner {
    async fn run(
        &self,
        job: &Job,
        on_progress: &mut ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<RunResult> {
        if cancel.is_cancelled() {
            return Err(HardbrakeError::Interrupted);
        }

        // Spawn the shell with both output streams piped
        debug!(job = %job.identity(), command = %job.command(), "Starting process");
        let mut child = self.spawn(job)?;

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut out_lines = LineAssembler::new();
        let mut err_lines = LineAssembler::new();
        let mut out_buf = [0u8; READ_CHUNK];
        let mut err_buf = [0u8; READ_CHUNK];

        let mut state = RunState::new(self.pattern.as_ref());
        let mut exit: Option<ExitStatus> = None;
        let mut drain_deadline: Option<Instant> = None;

        // Read both streams until they close, or until the grace period after exit
        while stdout.is_some() || stderr.is_some() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(Self::abort(&mut child, job).await);
                }
                read = read_chunk(&mut stdout, &mut out_buf) => match read {
                    Ok(0) => stdout = None,
                    Ok(n) => {
                        for line in out_lines.push(&out_buf[..n]) {
                            state.handle_line(job, line, on_progress);
                        }
                    }
                    Err(e) => {
                        warn!(job = %job.identity(), "Failed to read stdout: {}", e);
                        stdout = None;
                    }
                },
                read = read_chunk(&mut stderr, &mut err_buf) => match read {
                    Ok(0) => stderr = None,
                    Ok(n) => {
                        for line in err_lines.push(&err_buf[..n]) {
                            state.handle_line(job, line, on_progress);
                        }
                    }
                    Err(e) => {
                        warn!(job = %job.identity(), "Failed to read stderr: {}", e);
                        stderr = None;
                    }
                },
                status = child.wait(), if exit.is_none() => {
                    exit = Some(status?);
                    drain_deadline = Some(Instant::now() + DRAIN_GRACE);
                }
                _ = grace_expired(drain_deadline) => {
                    debug!(job = %job.identity(), "Output still open after exit, stop draining");
                    break;
                }
            }
        }

        let status = match exit {
            Some(status) => status,
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(Self::abort(&mut child, job).await);
                }
                status = child.wait() => status?,
            },
        };

        // Ctrl-C reaches the child's process group too, so it may exit before the token fires
        if cancel.is_cancelled() || interrupted_by_user(&status) {
            info!(job = %job.identity(), "Process ended by interrupt");
            return Err(HardbrakeError::Interrupted);
        }

        // Flush what is left of the last line, then report completion
        for line in [out_lines.finish(), err_lines.finish()].into_iter().flatten() {
            state.handle_line(job, line, on_progress);
        }
        on_progress(job.command(), Progress::new(100));

        let result = state.into_result(status);
        debug!(
            job = %job.identity(),
            exit_code = ?result.exit_code,
            last_percent = ?result.last_reported_percent,
            "Process exited"
        );
        Ok(result)
    }
}
