use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{HardbrakeError, Result, TrackerError};
use crate::job::{fingerprint, Job, JobResult, JobStatus};
use crate::runner::{ProcessRunner, Progress};
use crate::tracker::{ProgressTracker, TrackerSession};

/// Task key of the aggregate "jobs finished" counter
pub const OVERALL_TASK: &str = "overall";

/// Total registered for every per-job task
const JOB_TASK_TOTAL: u64 = 100;

/// Status text shown next to a job's bar
fn progress_message(progress: &Progress) -> String {
    match progress.eta {
        Some(eta) => {
            let secs = eta.as_secs();
            format!("ETA HB: {:02}h{:02}m{:02}s", secs / 3600, secs % 3600 / 60, secs % 60)
        }
        None => String::new(),
    }
}

/// Runs a batch of commands one at a time and drives the progress display.
///
/// The supervisor owns its tracker and is the only thing that writes to it;
/// runners report progress through the callback only.
pub struct BatchSupervisor<R, T> {
    runner: R,
    tracker: T,
    cancel: CancellationToken,
}

impl<R: ProcessRunner, T: ProgressTracker> BatchSupervisor<R, T> {
    pub fn new(runner: R, tracker: T, cancel: CancellationToken) -> Self {
        Self {
            runner,
            tracker,
            cancel,
        }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Run every job in order. Plain command strings are accepted as jobs.
    ///
    /// A failing job does not stop the batch; its status is recorded and the
    /// next job starts. Cancellation stops the batch with
    /// [`HardbrakeError::Interrupted`] after the tracker has been stopped.
    pub async fn run_batch<I, S>(&mut self, commands: I) -> Result<Vec<JobResult>>
    where
        I: IntoIterator<Item = S>,
        S: Into<Job>,
    {
        let jobs: Vec<Job> = commands.into_iter().map(Into::into).collect();
        let total = jobs.len();
        info!(jobs = total, "Starting batch");

        // Register every task before the display starts
        for job in &jobs {
            self.tracker.add_task(job.identity(), JOB_TASK_TOTAL)?;
            self.tracker.set_label(job.identity(), job.label())?;
        }
        self.tracker.add_task(OVERALL_TASK, total as u64)?;

        let mut session = TrackerSession::start(&mut self.tracker)?;
        let mut results = Vec::with_capacity(total);

        for (index, job) in jobs.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(completed = index, "Batch cancelled before next job");
                return Err(HardbrakeError::Interrupted);
            }

            session.println(&format!("[{}/{}] {}", index + 1, total, job.command()));
            info!(job = %job.identity(), position = index + 1, "Starting job");

            let mut tracker_error: Option<TrackerError> = None;
            let outcome = {
                let session = &mut session;
                let tracker_error = &mut tracker_error;
                let mut on_progress = |command: &str, progress: Progress| {
                    if tracker_error.is_some() {
                        return;
                    }
                    let task_id = fingerprint(command);
                    let routed = session
                        .update(&task_id, u64::from(progress.percent))
                        .and_then(|_| session.set_message(&task_id, &progress_message(&progress)));
                    if let Err(e) = routed {
                        *tracker_error = Some(e);
                    }
                };
                self.runner.run(job, &mut on_progress, &self.cancel).await
            };

            if let Some(e) = tracker_error {
                return Err(e.into());
            }

            // The process can die from the user's Ctrl-C before the token is cancelled
            if self.cancel.is_cancelled() {
                info!(job = %job.identity(), "Batch cancelled during job");
                return Err(HardbrakeError::Interrupted);
            }

            let status = match outcome {
                Ok(run) => {
                    let status = JobStatus::from_exit_code(run.exit_code);
                    if !status.is_success() {
                        warn!(
                            job = %job.identity(),
                            exit_code = ?run.exit_code,
                            "Job failed; last output:\n{}",
                            run.tail.join("\n")
                        );
                    }
                    status
                }
                Err(HardbrakeError::Interrupted) => {
                    info!(job = %job.identity(), "Batch cancelled during job");
                    return Err(HardbrakeError::Interrupted);
                }
                Err(e) => {
                    warn!(job = %job.identity(), "Job could not run: {}", e);
                    JobStatus::Failed { exit_code: None }
                }
            };

            // Record the outcome and advance the overall counter
            info!(job = %job.identity(), status = %status, "Job finished");
            session.update(OVERALL_TASK, (index + 1) as u64)?;
            results.push(JobResult {
                job: job.clone(),
                status,
            });
        }

        session.finish()?;
        info!(
            succeeded = results.iter().filter(|r| r.is_success()).count(),
            failed = results.iter().filter(|r| !r.is_success()).count(),
            "Batch finished"
        );
        Ok(results)
    }
}
