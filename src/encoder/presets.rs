use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{HardbrakeError, Result};

/// Indentation of a preset name under its category in `HandBrakeCLI -z`
const PRESET_INDENT: usize = 4;

/// Presets grouped by category, in the order the encoder lists them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetCatalog {
    categories: Vec<PresetCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetCategory {
    pub name: String,
    pub presets: Vec<String>,
}

impl PresetCatalog {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[PresetCategory] {
        &self.categories
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    pub fn presets(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.presets.as_slice())
    }
}

/// Parse the preset listing.
///
/// A category line starts at column 0 and contains a slash (`General/`);
/// a preset line is indented by exactly four whitespace characters and
/// belongs to the most recent category. Deeper-indented description lines
/// and anything before the first category are ignored.
pub fn parse_presets(listing: &str) -> PresetCatalog {
    let mut categories: Vec<PresetCategory> = Vec::new();

    for line in listing.lines() {
        let trimmed = line.trim_start();
        let indent = line.chars().count() - trimmed.chars().count();
        let trimmed = trimmed.trim_end();
        if trimmed.is_empty() {
            continue;
        }

        if indent == 0 && trimmed.contains('/') {
            categories.push(PresetCategory {
                name: trimmed.replacen('/', "", 1).trim().to_string(),
                presets: Vec::new(),
            });
        } else if indent == PRESET_INDENT {
            if let Some(category) = categories.last_mut() {
                category.presets.push(trimmed.to_string());
            }
        }
    }

    PresetCatalog { categories }
}

/// Ask the encoder for its preset list (`<binary> -z`).
///
/// The listing is printed on the diagnostic stream; stdout is used when
/// stderr holds no categories.
pub async fn discover_presets(binary_path: &str) -> Result<PresetCatalog> {
    debug!("Listing presets with {} -z", binary_path);

    let output = Command::new(binary_path)
        .arg("-z")
        .output()
        .await
        .map_err(|e| HardbrakeError::Preset(format!("Failed to execute {}: {}", binary_path, e)))?;

    let mut catalog = parse_presets(&String::from_utf8_lossy(&output.stderr));
    if catalog.is_empty() {
        catalog = parse_presets(&String::from_utf8_lossy(&output.stdout));
    }

    if catalog.is_empty() {
        return Err(HardbrakeError::Preset(format!(
            "{} -z listed no presets (exit status {})",
            binary_path, output.status
        )));
    }

    info!(categories = catalog.categories().len(), "Discovered encoder presets");
    Ok(catalog)
}
