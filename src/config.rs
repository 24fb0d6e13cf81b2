use crate::setup::RequiredProgram;

/// Media containers the file picker accepts (matched case-insensitively)
pub const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "mkv", "avi", "mov", "m4v", "flv", "wmv"];

#[derive(Debug, Clone)]
pub struct Config {
    pub encoder: EncoderConfig,
    pub picker: PickerConfig,
    /// Shell used to run encoder commands (`<shell> -c <command>`)
    pub shell: String,
    pub cleanup: CleanupPolicy,
}

#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Path to the HandBrakeCLI binary
    pub binary_path: String,
    /// Marker placed in output file names
    pub output_tag: String,
    /// Output container extension
    pub container: String,
}

#[derive(Debug, Clone)]
pub struct PickerConfig {
    /// Terminal file manager that supports `--choosefiles=<path>`
    pub binary_path: String,
    pub allowed_extensions: Vec<String>,
}

/// How originals are offered for deletion after a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPolicy {
    /// One yes/no question covering every original
    ConfirmAll,
    /// Pick originals individually from a list
    PerFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encoder: EncoderConfig {
                binary_path: "HandBrakeCLI".to_string(),
                output_tag: "HardBraked".to_string(),
                container: "mp4".to_string(),
            },
            picker: PickerConfig {
                binary_path: "ranger".to_string(),
                allowed_extensions: VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            },
            shell: "sh".to_string(),
            cleanup: CleanupPolicy::ConfirmAll,
        }
    }
}

impl Config {
    /// External programs the interactive workflow cannot run without
    pub fn required_programs(&self) -> Vec<RequiredProgram> {
        vec![
            RequiredProgram::new(
                &self.encoder.binary_path,
                "HandBrake command line version, used to encode videos.",
                "Download it from https://handbrake.fr/downloads2.php",
            ),
            RequiredProgram::new(
                &self.picker.binary_path,
                "Terminal file manager, used to pick the files to encode.",
                "Install ranger with your package manager (e.g. `brew install ranger`).",
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.encoder.binary_path, "HandBrakeCLI");
        assert_eq!(config.picker.allowed_extensions.len(), 7);
        assert_eq!(config.cleanup, CleanupPolicy::ConfirmAll);
        let names: Vec<_> = config.required_programs().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["HandBrakeCLI", "ranger"]);
    }
}
