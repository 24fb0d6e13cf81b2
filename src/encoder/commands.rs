use std::path::{Path, PathBuf};

use crate::job::Job;

/// Encoder invocation rendered as a single shell command string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeCommand {
    pub binary_path: String,
    pub args: Vec<String>,
}

impl EncodeCommand {
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-o").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Select a named preset
    pub fn preset<S: Into<String>>(self, preset: S) -> Self {
        self.arg("-Z").arg(preset)
    }

    /// Drop all audio tracks
    pub fn no_audio(self) -> Self {
        self.arg("-a").arg("none")
    }

    /// Render as a command line for `sh -c`
    pub fn to_shell_string(&self) -> String {
        std::iter::once(self.binary_path.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Quote a word for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// One planned encode: source, destination and the command producing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodePlan {
    pub source: PathBuf,
    pub output: PathBuf,
    pub command: EncodeCommand,
}

impl EncodePlan {
    pub fn shell_command(&self) -> String {
        self.command.to_shell_string()
    }

    /// Batch job for this plan, labelled with the source file name
    pub fn job(&self) -> Job {
        let label = self
            .source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.display().to_string());
        Job::new(self.shell_command()).with_label(label)
    }
}

/// Builds encoder commands for source files
pub struct EncodeCommandBuilder {
    binary_path: String,
    output_tag: String,
    container: String,
}

impl EncodeCommandBuilder {
    pub fn new<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        binary_path: S1,
        output_tag: S2,
        container: S3,
    ) -> Self {
        Self {
            binary_path: binary_path.into(),
            output_tag: output_tag.into(),
            container: container.into(),
        }
    }

    /// Output path next to the source: `<stem>__<tag>__<preset>.<container>`
    pub fn output_path(&self, source: &Path, preset: &str) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let preset = preset.replace(['/', '\\'], "-");
        let file_name = format!("{}__{}__{}.{}", stem, self.output_tag, preset, self.container);

        match source.parent() {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    /// Plan the encode of `source` with `preset`
    pub fn plan(&self, source: &Path, preset: &str, keep_audio: bool) -> EncodePlan {
        let output = self.output_path(source, preset);
        let mut command = EncodeCommand::new(&self.binary_path)
            .input(source)
            .output(&output)
            .preset(preset);
        if !keep_audio {
            command = command.no_audio();
        }

        EncodePlan {
            source: source.to_path_buf(),
            output,
            command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> EncodeCommandBuilder {
        EncodeCommandBuilder::new("HandBrakeCLI", "HardBraked", "mp4")
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("HandBrakeCLI"), "HandBrakeCLI");
        assert_eq!(shell_quote("/videos/a.mp4"), "/videos/a.mp4");
        assert_eq!(shell_quote("Fast 1080p30"), "'Fast 1080p30'");
        assert_eq!(shell_quote("it's.mkv"), r"'it'\''s.mkv'");
        assert_eq!(shell_quote("$(rm -rf)"), "'$(rm -rf)'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_output_path() {
        let out = builder().output_path(Path::new("/videos/My Trip.mov"), "Fast 1080p30");
        assert_eq!(out, PathBuf::from("/videos/My Trip__HardBraked__Fast 1080p30.mp4"));
    }

    #[test]
    fn test_plan_command_line() {
        let plan = builder().plan(Path::new("/videos/My Trip.mov"), "Fast 1080p30", true);
        assert_eq!(
            plan.shell_command(),
            "HandBrakeCLI -i '/videos/My Trip.mov' -o '/videos/My Trip__HardBraked__Fast 1080p30.mp4' -Z 'Fast 1080p30'"
        );
    }

    #[test]
    fn test_plan_without_audio() {
        let plan = builder().plan(Path::new("/v/a.mkv"), "Creator 1080p60", false);
        assert!(plan.shell_command().ends_with("-Z 'Creator 1080p60' -a none"));
        assert_eq!(plan.source, PathBuf::from("/v/a.mkv"));
    }

    #[test]
    fn test_plan_job_is_labelled_with_file_name() {
        let plan = builder().plan(Path::new("/videos/My Trip.mov"), "Fast 1080p30", true);
        let job = plan.job();
        assert_eq!(job.label(), "My Trip.mov");
        assert_eq!(job.command(), plan.shell_command());
    }
}
