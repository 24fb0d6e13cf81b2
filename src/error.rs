use thiserror::Error;

#[derive(Error, Debug)]
pub enum HardbrakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{program} is not installed. {hint}")]
    Environment { program: String, hint: String },

    #[error("No files selected")]
    SelectionEmpty,

    #[error("Progress tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Batch cancelled")]
    Interrupted,

    #[error("Failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Preset discovery error: {0}")]
    Preset(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

/// Misuse of the progress tracker API. These are programmer errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("progress tracker already started")]
    AlreadyStarted,

    #[error("progress tracker not started")]
    NotStarted,

    #[error("unknown progress task: {0}")]
    UnknownTask(String),
}

impl From<dialoguer::Error> for HardbrakeError {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                HardbrakeError::Interrupted
            }
            other => HardbrakeError::Prompt(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, HardbrakeError>;
