use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cleanup::run_cleanup;
use crate::config::Config;
use crate::encoder::{self, discover_presets, EncodePlan, PresetCatalog};
use crate::error::{HardbrakeError, Result};
use crate::job::{Job, JobResult, JobStatus};
use crate::prompts::Prompter;
use crate::report;
use crate::runner::ShellRunner;
use crate::selection::FilePicker;
use crate::setup;
use crate::supervisor::BatchSupervisor;
use crate::tracker::TerminalTracker;

/// A planned encode together with how it ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOutcome {
    pub plan: EncodePlan,
    pub status: JobStatus,
}

pub struct Workflow<P: Prompter> {
    config: Config,
    prompter: P,
    cancel: CancellationToken,
}

impl<P: Prompter> Workflow<P> {
    pub fn new(config: Config, prompter: P, cancel: CancellationToken) -> Self {
        Self {
            config,
            prompter,
            cancel,
        }
    }

    /// Interactive session: preset, files, batch encode, summary, cleanup
    pub async fn run(&self) -> Result<()> {
        // Step 1: check external programs
        setup::ensure_installed(&self.config.required_programs())?;

        // Step 2: preset and audio choice
        let catalog = discover_presets(&self.config.encoder.binary_path).await?;
        let preset = self.choose_preset(&catalog)?;
        let keep_audio = self.prompter.confirm("Do you want to keep the audio?", true)?;

        // Step 3: pick files and plan one encode per file
        let files = FilePicker::new(&self.config.picker).pick().await?;
        let builder = encoder::command_builder(&self.config.encoder);
        let plans: Vec<EncodePlan> = files
            .iter()
            .map(|file| builder.plan(file, &preset, keep_audio))
            .collect();
        info!(files = plans.len(), preset = %preset, keep_audio, "Encoding");

        // Step 4: encode, then summary and cleanup
        let outcomes = self.encode(plans).await?;
        self.finish(&outcomes, &preset)
    }

    /// Summary and cleanup questions for a completed batch.
    /// Nothing is shown or deleted once the user has cancelled.
    pub fn finish(&self, outcomes: &[EncodeOutcome], preset: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(HardbrakeError::Interrupted);
        }

        report::print_encode_summary(outcomes);
        if outcomes.iter().all(|o| o.status.is_success()) {
            report::success(&format!("Encoded {} file(s) with {}", outcomes.len(), preset));
        }

        let cleanup = run_cleanup(&self.prompter, outcomes, self.config.cleanup)?;
        if !cleanup.deleted_outputs.is_empty() {
            report::notice(&format!("Deleted {} output file(s).", cleanup.deleted_outputs.len()));
        }
        if !cleanup.deleted_originals.is_empty() {
            report::notice(&format!("Deleted {} original file(s).", cleanup.deleted_originals.len()));
        }
        Ok(())
    }

    /// Category first, then a preset within it
    pub fn choose_preset(&self, catalog: &PresetCatalog) -> Result<String> {
        let category = self
            .prompter
            .select("Select a preset category", &catalog.category_names())?;
        let presets = catalog
            .presets(&category)
            .filter(|presets| !presets.is_empty())
            .ok_or_else(|| HardbrakeError::Preset(format!("No presets in category {}", category)))?;
        self.prompter.select("Select a preset", presets)
    }

    /// Run every plan through the batch supervisor, in order
    pub async fn encode(&self, plans: Vec<EncodePlan>) -> Result<Vec<EncodeOutcome>> {
        if self.cancel.is_cancelled() {
            return Err(HardbrakeError::Interrupted);
        }

        let mut supervisor = BatchSupervisor::new(
            ShellRunner::new(&self.config.shell),
            TerminalTracker::new(),
            self.cancel.clone(),
        );
        let results = supervisor
            .run_batch(plans.iter().map(EncodePlan::job))
            .await?;

        Ok(plans
            .into_iter()
            .zip(results)
            .map(|(plan, result)| EncodeOutcome {
                plan,
                status: result.status,
            })
            .collect())
    }
}

/// Shell one-liner printing encoder-style progress lines, then exiting
fn demo_command(name: &str, step: u32, delay: Duration, exit_code: i32) -> String {
    let mut command = format!(
        "i=0; while [ $i -le 100 ]; do printf 'Encoding: task 1 of 1, %d.00 %% ({name})\\r' $i; i=$((i + {step})); sleep {delay:.2}; done; printf '\\n'",
        delay = delay.as_secs_f64(),
    );
    if exit_code != 0 {
        command.push_str(&format!("; echo '{name}: simulated failure' >&2; exit {exit_code}"));
    }
    command
}

/// Synthetic batch used by test mode; the second job fails
pub fn demo_commands(delay: Duration) -> Vec<String> {
    vec![
        demo_command("demo-1", 10, delay, 0),
        demo_command("demo-2", 20, delay, 1),
        demo_command("demo-3", 25, delay, 0),
    ]
}

/// Test mode: exercise the supervisor, runner and tracker without an encoder
pub async fn run_demo(config: &Config, cancel: CancellationToken) -> Result<Vec<JobResult>> {
    info!("Running demo batch");
    let mut supervisor = BatchSupervisor::new(
        ShellRunner::new(&config.shell),
        TerminalTracker::new(),
        cancel,
    );
    let jobs = demo_commands(Duration::from_millis(200))
        .into_iter()
        .enumerate()
        .map(|(i, command)| Job::new(command).with_label(format!("demo-{}", i + 1)));
    let results = supervisor.run_batch(jobs).await?;
    report::print_batch_summary(&results);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::parse_presets;
    use crate::prompts::MockPrompter;
    use crate::runner::{PercentPattern, ProcessRunner, Progress, ProgressPattern};
    use mockall::predicate::{always, eq};

    fn catalog() -> PresetCatalog {
        parse_presets("General/\n    Fast 1080p30\n    HQ 720p30\nEmpty/\n")
    }

    #[test]
    fn test_choose_preset_category_then_preset() {
        let mut prompter = MockPrompter::new();
        prompter
            .expect_select()
            .with(eq("Select a preset category"), always())
            .times(1)
            .returning(|_, _| Ok("General".to_string()));
        prompter
            .expect_select()
            .withf(|prompt, items| prompt.to_string() == "Select a preset" && items.len() == 2)
            .times(1)
            .returning(|_, items| Ok(items[1].clone()));

        let workflow = Workflow::new(Config::default(), prompter, CancellationToken::new());
        assert_eq!(workflow.choose_preset(&catalog()).unwrap(), "HQ 720p30");
    }

    #[test]
    fn test_choose_preset_empty_category() {
        let mut prompter = MockPrompter::new();
        prompter
            .expect_select()
            .returning(|_, _| Ok("Empty".to_string()));

        let workflow = Workflow::new(Config::default(), prompter, CancellationToken::new());
        assert!(matches!(
            workflow.choose_preset(&catalog()),
            Err(HardbrakeError::Preset(_))
        ));
    }

    #[test]
    fn test_demo_command_progress_lines() {
        let command = demo_command("x", 50, Duration::from_millis(10), 0);
        assert!(command.contains("printf 'Encoding: task 1 of 1, %d.00 %% (x)\\r' $i"));
        assert!(command.contains("sleep 0.01"));
        assert!(!command.contains("exit"));
        assert!(demo_command("y", 50, Duration::ZERO, 4).ends_with("exit 4"));
    }

    #[test]
    fn test_demo_output_matches_progress_pattern() {
        let pattern = PercentPattern::new();
        assert_eq!(pattern.extract("Encoding: task 1 of 1, 30.00 % (demo-1)"), Some(30));
    }

    #[tokio::test]
    async fn test_demo_commands_run() {
        let runner = ShellRunner::default();
        let commands = demo_commands(Duration::ZERO);
        let mut exit_codes = Vec::new();
        for command in &commands {
            let mut seen = Vec::new();
            let mut on_progress = |_: &str, p: Progress| seen.push(p.percent);
            let result = runner
                .run(&Job::new(command.clone()), &mut on_progress, &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(seen.first(), Some(&0));
            assert_eq!(seen.last(), Some(&100));
            exit_codes.push(result.exit_code);
        }
        assert_eq!(exit_codes, vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_finish_after_cancel_asks_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let plan = encoder::command_builder(&Config::default().encoder).plan(
            &dir.path().join("clip.mkv"),
            "Fast 1080p30",
            true,
        );
        std::fs::write(&plan.output, b"partial").unwrap();
        let outcomes = vec![EncodeOutcome {
            plan,
            status: JobStatus::Succeeded,
        }];

        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut prompter = MockPrompter::new();
        prompter.expect_confirm().never();

        let workflow = Workflow::new(Config::default(), prompter, cancel);
        let result = workflow.finish(&outcomes, "Fast 1080p30");

        assert!(matches!(result, Err(HardbrakeError::Interrupted)));
        assert!(outcomes[0].plan.output.exists());
    }

    #[tokio::test]
    async fn test_encode_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let workflow = Workflow::new(Config::default(), MockPrompter::new(), cancel);
        let result = workflow.encode(Vec::new()).await;
        assert!(matches!(result, Err(HardbrakeError::Interrupted)));
    }
}
