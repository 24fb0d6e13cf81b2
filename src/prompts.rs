use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, FuzzySelect, MultiSelect};

use crate::error::{HardbrakeError, Result};

/// Interactive questions asked over the terminal
#[cfg_attr(test, mockall::automock)]
pub trait Prompter {
    /// Pick one item, with type-to-filter completion
    fn select(&self, prompt: &str, items: &[String]) -> Result<String>;

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Pick any number of items
    fn multi_select(&self, prompt: &str, items: &[String]) -> Result<Vec<String>>;
}

/// Prompts rendered with `dialoguer`
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn select(&self, prompt: &str, items: &[String]) -> Result<String> {
        if items.is_empty() {
            return Err(HardbrakeError::Prompt(format!("Nothing to choose for: {}", prompt)));
        }

        let index = FuzzySelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()?;
        Ok(items[index].clone())
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn multi_select(&self, prompt: &str, items: &[String]) -> Result<Vec<String>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let chosen = MultiSelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .interact()?;
        Ok(chosen.into_iter().map(|i| items[i].clone()).collect())
    }
}
