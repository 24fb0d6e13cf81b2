use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::CleanupPolicy;
use crate::error::Result;
use crate::prompts::Prompter;
use crate::workflow::EncodeOutcome;

/// What the post-batch questions led to
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted_outputs: Vec<PathBuf>,
    pub deleted_originals: Vec<PathBuf>,
}

fn remove(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Deleted {}", path.display());
            true
        }
        Err(e) => {
            warn!("Failed to delete {}: {}", path.display(), e);
            false
        }
    }
}

/// Ask what to do with the files of a finished batch.
///
/// Rejecting the results deletes every produced output and keeps all
/// originals. Otherwise originals of successful encodes are offered for
/// deletion according to `policy`. Originals of failed encodes are never
/// touched.
pub fn run_cleanup<P: Prompter + ?Sized>(
    prompter: &P,
    outcomes: &[EncodeOutcome],
    policy: CleanupPolicy,
) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    let succeeded: Vec<&EncodeOutcome> = outcomes.iter().filter(|o| o.status.is_success()).collect();
    if succeeded.is_empty() {
        return Ok(report);
    }

    if !prompter.confirm("Are you happy with the results?", true)? {
        for outcome in &succeeded {
            if remove(&outcome.plan.output) {
                report.deleted_outputs.push(outcome.plan.output.clone());
            }
        }
        return Ok(report);
    }

    let originals: Vec<PathBuf> = match policy {
        CleanupPolicy::ConfirmAll => {
            if prompter.confirm("Do you want to delete the original files?", false)? {
                succeeded.iter().map(|o| o.plan.source.clone()).collect()
            } else {
                Vec::new()
            }
        }
        CleanupPolicy::PerFile => {
            let items: Vec<String> = succeeded
                .iter()
                .map(|o| o.plan.source.display().to_string())
                .collect();
            prompter
                .multi_select("Select the original files to delete", &items)?
                .into_iter()
                .map(PathBuf::from)
                .collect()
        }
    };

    for original in originals {
        if remove(&original) {
            report.deleted_originals.push(original);
        }
    }
    Ok(report)
}
