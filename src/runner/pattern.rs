use regex::Regex;
use std::time::Duration;

/// Strategy for pulling a completion percentage out of one output line
pub trait ProgressPattern: Send + Sync {
    /// Percentage in `0..=100`, or `None` when the line carries no progress
    fn extract(&self, line: &str) -> Option<u8>;

    /// Remaining time as estimated by the encoder itself, if the line has one
    fn eta(&self, _line: &str) -> Option<Duration> {
        None
    }
}

/// Matches `<digits>.<digits>` followed by optional whitespace and `%`,
/// as printed by HandBrakeCLI (`Encoding: task 1 of 1, 42.50 % (...)`).
/// The `ETA 00h01m12s` suffix of the same line is picked up as well.
#[derive(Debug, Clone)]
pub struct PercentPattern {
    percent: Regex,
    eta: Regex,
}

impl PercentPattern {
    pub fn new() -> Self {
        Self {
            percent: Regex::new(r"([0-9]+\.[0-9]+)\s*%").expect("valid percent regex"),
            eta: Regex::new(r"ETA ([0-9]+)h([0-9]+)m([0-9]+)s").expect("valid eta regex"),
        }
    }
}

impl Default for PercentPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressPattern for PercentPattern {
    fn extract(&self, line: &str) -> Option<u8> {
        let captures = self.percent.captures(line)?;
        let value: f64 = captures.get(1)?.as_str().parse().ok()?;
        Some(value.trunc().clamp(0.0, 100.0) as u8)
    }

    fn eta(&self, line: &str) -> Option<Duration> {
        let captures = self.eta.captures(line)?;
        let field = |i: usize| -> Option<u64> { captures.get(i)?.as_str().parse().ok() };
        Some(Duration::from_secs(field(1)? * 3600 + field(2)? * 60 + field(3)?))
    }
}

/// Any plain function works as a pattern
impl<F> ProgressPattern for F
where
    F: Fn(&str) -> Option<u8> + Send + Sync,
{
    fn extract(&self, line: &str) -> Option<u8> {
        self(line)
    }
}
