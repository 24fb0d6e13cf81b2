use console::style;
use indicatif::HumanBytes;
use std::path::Path;

use crate::job::{JobResult, JobStatus};
use crate::workflow::EncodeOutcome;

pub fn error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", style("Success:").green().bold(), msg);
}

pub fn notice(msg: &str) {
    println!("{} {}", style("Notice:").cyan().bold(), msg);
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}

fn styled_status(status: &JobStatus) -> String {
    match status {
        JobStatus::Succeeded => style(status).green().to_string(),
        JobStatus::Failed { .. } => style(status).red().to_string(),
    }
}

fn print_totals(succeeded: usize, failed: usize) {
    println!("  Success:  {}", style(succeeded).green());
    if failed > 0 {
        println!("  Failed:   {}", style(failed).red());
    }
}

/// Per-job table for a batch of plain commands
pub fn print_batch_summary(results: &[JobResult]) {
    println!();
    println!("{}", style("Batch Complete:").cyan().bold());
    for (index, result) in results.iter().enumerate() {
        println!(
            "  {:>3}. {:<8} {:<18} {}",
            index + 1,
            result.job.identity(),
            styled_status(&result.status),
            result.job.command()
        );
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    print_totals(succeeded, results.len() - succeeded);
}

/// Per-file table with original and output sizes
pub fn print_encode_summary(outcomes: &[EncodeOutcome]) {
    println!();
    println!("{}", style("Batch Complete:").cyan().bold());
    for outcome in outcomes {
        let name = outcome
            .plan
            .source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| outcome.plan.source.display().to_string());

        let sizes = match (
            outcome.status.is_success(),
            file_size(&outcome.plan.source),
            file_size(&outcome.plan.output),
        ) {
            (true, Some(before), Some(after)) => {
                format!("{} -> {}", HumanBytes(before), HumanBytes(after))
            }
            _ => String::new(),
        };

        println!("  {:<40} {:<18} {}", name, styled_status(&outcome.status), sizes);
    }

    let succeeded = outcomes.iter().filter(|o| o.status.is_success()).count();
    print_totals(succeeded, outcomes.len() - succeeded);
}
