//! HardBrake - interactive batch video encoding
//!
//! Entry point: sets up logging, wires Ctrl-C to cancellation and turns
//! the library's errors into short user-facing messages.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use hardbrake::cli::Args;
use hardbrake::config::Config;
use hardbrake::error::HardbrakeError;
use hardbrake::prompts::TerminalPrompter;
use hardbrake::report;
use hardbrake::workflow::{self, Workflow};

/// Exit code conventionally used after SIGINT
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // The guard flushes the log file when main returns
    let _guard = setup_logging()?;
    info!("Starting HardBrake");

    // Ctrl-C cancels whatever is running
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl+C: {}", e);
                return;
            }
            info!("Ctrl+C received, cancelling");
            cancel.cancel();
        });
    }

    let config = Config::default();
    let outcome = if args.test {
        workflow::run_demo(&config, cancel).await.map(|_| ())
    } else {
        Workflow::new(config, TerminalPrompter::new(), cancel).run().await
    };

    let code = conclude(outcome)?;
    Ok(ExitCode::from(code))
}

/// Tell the user how the run ended and pick the process exit code.
/// Errors the user cannot act on are handed back to anyhow.
fn conclude(outcome: hardbrake::error::Result<()>) -> std::result::Result<u8, HardbrakeError> {
    match outcome {
        Ok(()) => {
            info!("HardBrake finished");
            Ok(0)
        }
        Err(HardbrakeError::SelectionEmpty) => {
            report::notice("No files selected. Nothing to do.");
            Ok(0)
        }
        Err(HardbrakeError::Interrupted) => {
            info!("Cancelled by user");
            report::error("Cancelled.");
            Ok(EXIT_INTERRUPTED)
        }
        Err(e @ HardbrakeError::Environment { .. }) => {
            info!("Stopping: {}", e);
            report::error(&e.to_string());
            Ok(1)
        }
        Err(e) => Err(e),
    }
}

/// Log to the console (warnings only, so the progress display stays clean)
/// and to a daily rolling file under `.hardbrake/log`.
fn setup_logging() -> Result<WorkerGuard> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".hardbrake").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "hardbrake.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    // Console layer: warnings and errors only
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN);

    // File layer: everything the filter lets through
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - file: {}", log_dir.join("hardbrake.log").display());
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conclude_returns_exit_codes() {
        assert_eq!(conclude(Ok(())).unwrap(), 0);
        assert_eq!(conclude(Err(HardbrakeError::SelectionEmpty)).unwrap(), 0);
        assert_eq!(conclude(Err(HardbrakeError::Interrupted)).unwrap(), 130);
        let missing = HardbrakeError::Environment {
            program: "HandBrakeCLI".to_string(),
            hint: "Install it.".to_string(),
        };
        assert_eq!(conclude(Err(missing)).unwrap(), 1);
        assert!(matches!(
            conclude(Err(HardbrakeError::Preset("empty".to_string()))),
            Err(HardbrakeError::Preset(_))
        ));
    }
}
