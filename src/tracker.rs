use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::TrackerError;

const TICK_INTERVAL: Duration = Duration::from_millis(120);

const BAR_TEMPLATE: &str =
    "{spinner:.green} {prefix:<28} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}/{len:<3} ({eta}) {msg}";

/// Labels longer than this are shortened so bars stay aligned
const LABEL_WIDTH: usize = 28;

/// Named progress counters rendered as a live display.
///
/// Lifecycle is `start` once, any number of `update`s, `stop` once.
/// Tasks may be registered before or after `start`.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressTracker: Send {
    fn start(&mut self) -> Result<(), TrackerError>;

    fn add_task(&mut self, task_id: &str, total: u64) -> Result<(), TrackerError>;

    /// Name shown for a registered task in place of its key
    fn set_label(&mut self, task_id: &str, label: &str) -> Result<(), TrackerError>;

    fn update(&mut self, task_id: &str, completed: u64) -> Result<(), TrackerError>;

    /// Free-form status text shown after a task's bar
    fn set_message(&mut self, task_id: &str, message: &str) -> Result<(), TrackerError>;

    fn stop(&mut self) -> Result<(), TrackerError>;

    /// Print a plain line above the live display without corrupting it
    fn println(&self, line: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerState {
    Idle,
    Running,
    Stopped,
}

/// Terminal progress display backed by `indicatif`
pub struct TerminalTracker {
    multi: MultiProgress,
    bars: HashMap<String, ProgressBar>,
    state: TrackerState,
}

impl TerminalTracker {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            bars: HashMap::new(),
            state: TrackerState::Idle,
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }

    fn bar(&self, task_id: &str) -> Result<&ProgressBar, TrackerError> {
        self.bars
            .get(task_id)
            .ok_or_else(|| TrackerError::UnknownTask(task_id.to_string()))
    }

    fn ensure_running(&self) -> Result<(), TrackerError> {
        match self.state {
            TrackerState::Running => Ok(()),
            _ => Err(TrackerError::NotStarted),
        }
    }
}

/// Keep the tail of long labels, where file names carry the most information
fn fit_label(label: &str) -> String {
    let count = label.chars().count();
    if count <= LABEL_WIDTH {
        return label.to_string();
    }
    let tail: String = label.chars().skip(count - (LABEL_WIDTH - 3)).collect();
    format!("...{}", tail)
}

impl Default for TerminalTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker for TerminalTracker {
    fn start(&mut self) -> Result<(), TrackerError> {
        if self.state != TrackerState::Idle {
            return Err(TrackerError::AlreadyStarted);
        }

        self.multi.set_draw_target(ProgressDrawTarget::stderr());
        for bar in self.bars.values() {
            bar.enable_steady_tick(TICK_INTERVAL);
        }
        self.state = TrackerState::Running;
        debug!(tasks = self.bars.len(), "Progress tracker started");
        Ok(())
    }

    fn add_task(&mut self, task_id: &str, total: u64) -> Result<(), TrackerError> {
        if let Some(bar) = self.bars.get(task_id) {
            bar.set_length(total);
            bar.set_position(0);
            return Ok(());
        }

        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(Self::bar_style());
        bar.set_prefix(task_id.to_string());
        if self.state == TrackerState::Running {
            bar.enable_steady_tick(TICK_INTERVAL);
        }
        self.bars.insert(task_id.to_string(), bar);
        Ok(())
    }

    fn set_label(&mut self, task_id: &str, label: &str) -> Result<(), TrackerError> {
        self.bar(task_id)?.set_prefix(fit_label(label));
        Ok(())
    }

    fn update(&mut self, task_id: &str, completed: u64) -> Result<(), TrackerError> {
        self.ensure_running()?;
        self.bar(task_id)?.set_position(completed);
        Ok(())
    }

    fn set_message(&mut self, task_id: &str, message: &str) -> Result<(), TrackerError> {
        self.ensure_running()?;
        self.bar(task_id)?.set_message(message.to_string());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TrackerError> {
        self.ensure_running()?;

        for bar in self.bars.values() {
            bar.disable_steady_tick();
            bar.abandon();
        }
        self.state = TrackerState::Stopped;
        debug!("Progress tracker stopped");
        Ok(())
    }

    fn println(&self, line: &str) {
        if self.state == TrackerState::Running {
            if let Err(e) = self.multi.println(line) {
                warn!("Failed to print above progress display: {}", e);
            }
        } else {
            eprintln!("{}", line);
        }
    }
}

/// A started tracker that is guaranteed to be stopped exactly once.
///
/// Call [`TrackerSession::finish`] on the normal path; dropping the session
/// on any other path (error, cancellation) stops the tracker instead.
pub struct TrackerSession<'a, T: ProgressTracker + ?Sized> {
    tracker: &'a mut T,
    active: bool,
}

impl<'a, T: ProgressTracker + ?Sized> TrackerSession<'a, T> {
    pub fn start(tracker: &'a mut T) -> Result<Self, TrackerError> {
        tracker.start()?;
        Ok(Self {
            tracker,
            active: true,
        })
    }

    pub fn add_task(&mut self, task_id: &str, total: u64) -> Result<(), TrackerError> {
        self.tracker.add_task(task_id, total)
    }

    pub fn update(&mut self, task_id: &str, completed: u64) -> Result<(), TrackerError> {
        self.tracker.update(task_id, completed)
    }

    pub fn set_message(&mut self, task_id: &str, message: &str) -> Result<(), TrackerError> {
        self.tracker.set_message(task_id, message)
    }

    pub fn println(&self, line: &str) {
        self.tracker.println(line);
    }

    pub fn finish(mut self) -> Result<(), TrackerError> {
        self.active = false;
        self.tracker.stop()
    }
}

impl<T: ProgressTracker + ?Sized> Drop for TrackerSession<'_, T> {
    fn drop(&mut self) {
        if self.active {
            self.active = false;
            if let Err(e) = self.tracker.stop() {
                warn!("Failed to stop progress tracker: {}", e);
            }
        }
    }
}
