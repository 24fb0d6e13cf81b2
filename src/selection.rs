use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::PickerConfig;
use crate::error::{HardbrakeError, Result};

/// Keep non-blank paths whose extension is in `allowed` (case-insensitive).
///
/// Lines are trimmed; order and the original casing are preserved.
pub fn filter_media_paths<I, S>(lines: I, allowed: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| !line.is_empty())
        .filter(|line| {
            line.rsplit_once('.')
                .map(|(_, ext)| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
                .unwrap_or(false)
        })
        .collect()
}

/// Lets the user choose files in a full-screen terminal file manager.
///
/// The file manager writes the chosen absolute paths, one per line, to a
/// temporary file which is read back and removed.
pub struct FilePicker {
    binary_path: String,
    allowed_extensions: Vec<String>,
}

impl FilePicker {
    pub fn new(config: &PickerConfig) -> Self {
        Self {
            binary_path: config.binary_path.clone(),
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }

    pub async fn pick(&self) -> Result<Vec<PathBuf>> {
        let choice_file = tempfile::Builder::new()
            .prefix("hardbrake-choice-")
            .suffix(".txt")
            .tempfile()?;
        let choice_path = choice_file.path().to_path_buf();

        debug!("Launching {} with choice file {}", self.binary_path, choice_path.display());
        let status = Command::new(&self.binary_path)
            .arg(format!("--choosefiles={}", choice_path.display()))
            .status()
            .await
            .map_err(|source| HardbrakeError::Spawn {
                command: self.binary_path.clone(),
                source,
            })?;
        if !status.success() {
            warn!("{} exited with {}", self.binary_path, status);
        }

        let chosen = match tokio::fs::read_to_string(&choice_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = choice_file.close() {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove choice file {}: {}", choice_path.display(), e);
            }
        }

        let files = self.accept(&chosen)?;
        info!(files = files.len(), "Files selected");
        Ok(files)
    }

    /// Filter the file manager's output down to supported media files
    pub fn accept(&self, chosen: &str) -> Result<Vec<PathBuf>> {
        let files: Vec<PathBuf> = filter_media_paths(chosen.lines(), &self.allowed_extensions)
            .into_iter()
            .map(PathBuf::from)
            .collect();

        if files.is_empty() {
            return Err(HardbrakeError::SelectionEmpty);
        }
        Ok(files)
    }
}
