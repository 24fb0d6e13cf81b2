use std::sync::{Arc, Mutex};
use std::time::Duration;

use hardbrake::error::{HardbrakeError, TrackerError};
use hardbrake::job::{fingerprint, Job, JobStatus};
use hardbrake::runner::ShellRunner;
use hardbrake::supervisor::{BatchSupervisor, OVERALL_TASK};
use hardbrake::tracker::ProgressTracker;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Start,
    AddTask(String, u64),
    Label(String, String),
    Update(String, u64),
    Message(String, String),
    Stop,
    Line(String),
}

/// Tracker that records every call instead of drawing
#[derive(Clone, Default)]
struct RecordingTracker {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingTracker {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn updates_for(&self, task: &str) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Update(id, value) if id == task => Some(value),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressTracker for RecordingTracker {
    fn start(&mut self) -> Result<(), TrackerError> {
        self.push(Event::Start);
        Ok(())
    }

    fn add_task(&mut self, task_id: &str, total: u64) -> Result<(), TrackerError> {
        self.push(Event::AddTask(task_id.to_string(), total));
        Ok(())
    }

    fn set_label(&mut self, task_id: &str, label: &str) -> Result<(), TrackerError> {
        self.push(Event::Label(task_id.to_string(), label.to_string()));
        Ok(())
    }

    fn update(&mut self, task_id: &str, completed: u64) -> Result<(), TrackerError> {
        self.push(Event::Update(task_id.to_string(), completed));
        Ok(())
    }

    fn set_message(&mut self, task_id: &str, message: &str) -> Result<(), TrackerError> {
        self.push(Event::Message(task_id.to_string(), message.to_string()));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TrackerError> {
        self.push(Event::Stop);
        Ok(())
    }

    fn println(&self, line: &str) {
        self.push(Event::Line(line.to_string()));
    }
}

fn count(events: &[Event], wanted: &Event) -> usize {
    events.iter().filter(|e| *e == wanted).count()
}

#[tokio::test]
async fn failing_job_does_not_stop_the_batch() {
    let commands = vec![
        "printf '10.00 %%\\r50.00 %%\\r'; echo '90.00 %'".to_string(),
        "echo '30.00 %'; exit 3".to_string(),
        "printf 'Encoding: 75.50 %%'".to_string(),
    ];
    let tracker = RecordingTracker::default();
    let mut supervisor =
        BatchSupervisor::new(ShellRunner::default(), tracker.clone(), CancellationToken::new());

    let results = supervisor.run_batch(commands.clone()).await.unwrap();

    let statuses: Vec<JobStatus> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            JobStatus::Succeeded,
            JobStatus::Failed { exit_code: Some(3) },
            JobStatus::Succeeded,
        ]
    );

    assert_eq!(tracker.updates_for(&fingerprint(&commands[0])), vec![10, 50, 90, 100]);
    assert_eq!(tracker.updates_for(&fingerprint(&commands[1])), vec![30, 100]);
    assert_eq!(tracker.updates_for(&fingerprint(&commands[2])), vec![75, 100]);
    assert_eq!(tracker.updates_for(OVERALL_TASK), vec![1, 2, 3]);

    let events = tracker.events();
    assert_eq!(count(&events, &Event::Start), 1);
    assert_eq!(count(&events, &Event::Stop), 1);
    assert_eq!(events.last(), Some(&Event::Stop));
    assert!(events.contains(&Event::AddTask(OVERALL_TASK.to_string(), 3)));
    assert!(events.contains(&Event::Line(format!("[2/3] {}", commands[1]))));
}

#[tokio::test]
async fn tasks_are_registered_before_start() {
    let commands = vec!["true".to_string(), "false".to_string()];
    let tracker = RecordingTracker::default();
    let mut supervisor =
        BatchSupervisor::new(ShellRunner::default(), tracker.clone(), CancellationToken::new());

    supervisor.run_batch(commands.clone()).await.unwrap();

    let events = tracker.events();
    assert_eq!(
        &events[..6],
        &[
            Event::AddTask(fingerprint("true"), 100),
            Event::Label(fingerprint("true"), "true".to_string()),
            Event::AddTask(fingerprint("false"), 100),
            Event::Label(fingerprint("false"), "false".to_string()),
            Event::AddTask(OVERALL_TASK.to_string(), 2),
            Event::Start,
        ]
    );
}

#[tokio::test]
async fn encoder_eta_and_file_label_reach_the_display() {
    let command = "printf 'Encoding: task 1 of 1, 42.50 %% (88.00 fps, avg 90.00 fps, ETA 00h03m07s)\\n'";
    let job = Job::new(command).with_label("holiday.mkv");
    let tracker = RecordingTracker::default();
    let mut supervisor =
        BatchSupervisor::new(ShellRunner::default(), tracker.clone(), CancellationToken::new());

    supervisor.run_batch([job]).await.unwrap();

    let id = fingerprint(command);
    let events = tracker.events();
    assert!(events.contains(&Event::Label(id.clone(), "holiday.mkv".to_string())));
    let messages: Vec<String> = events
        .into_iter()
        .filter_map(|e| match e {
            Event::Message(task, message) if task == id => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(messages, vec!["ETA HB: 00h03m07s".to_string(), String::new()]);
}

#[cfg(unix)]
#[tokio::test]
async fn interrupt_signal_ends_batch_as_cancelled() {
    let commands = vec![
        "echo ok".to_string(),
        "sleep 0.2; kill -INT $$; sleep 5".to_string(),
        "echo 'never'".to_string(),
    ];
    let tracker = RecordingTracker::default();
    let cancel = CancellationToken::new();
    let mut supervisor = BatchSupervisor::new(ShellRunner::default(), tracker.clone(), cancel.clone());

    // The Ctrl-C listener may only fire after the child has already died
    let late_cancel = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
    });

    let outcome = supervisor.run_batch(commands.clone()).await;
    late_cancel.await.unwrap();

    assert!(matches!(outcome, Err(HardbrakeError::Interrupted)));
    let events = tracker.events();
    assert_eq!(count(&events, &Event::Stop), 1);
    assert_eq!(tracker.updates_for(OVERALL_TASK), vec![1]);
    assert!(tracker.updates_for(&fingerprint(&commands[2])).is_empty());
}

#[tokio::test]
async fn cancellation_mid_batch_stops_tracker_once() {
    let commands = vec![
        "echo '100.00 %'".to_string(),
        "echo '5.00 %'; sleep 30".to_string(),
        "echo 'never'".to_string(),
    ];
    let tracker = RecordingTracker::default();
    let cancel = CancellationToken::new();
    let mut supervisor = BatchSupervisor::new(ShellRunner::default(), tracker.clone(), cancel.clone());

    let trigger = {
        let tracker = tracker.clone();
        let cancel = cancel.clone();
        let waiting_for = fingerprint(&commands[1]);
        tokio::spawn(async move {
            while tracker.updates_for(&waiting_for).is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            cancel.cancel();
        })
    };

    let outcome = tokio::time::timeout(Duration::from_secs(10), supervisor.run_batch(commands.clone()))
        .await
        .expect("batch should stop promptly after cancellation");
    trigger.await.unwrap();

    assert!(matches!(outcome, Err(HardbrakeError::Interrupted)));

    let events = tracker.events();
    assert_eq!(count(&events, &Event::Stop), 1);
    assert!(tracker.updates_for(&fingerprint(&commands[2])).is_empty());
    assert!(!events.contains(&Event::Line(format!("[3/3] {}", commands[2]))));
    assert_eq!(tracker.updates_for(OVERALL_TASK), vec![1]);
}
