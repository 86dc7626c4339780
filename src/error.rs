//! Fatal wrapper errors and their exit codes.

use std::path::PathBuf;

/// Every condition that aborts a run before a pass/fail decision is reached.
///
/// Policy failures (restricted dependencies left after filtering) are not
/// errors; they are reported through [`crate::models::Outcome::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum WrapperError {
    #[error("Input file not found: {0}. Please provide it using \"--inputFile=\" CLI option")]
    InputFileNotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    ConfigFormat { path: PathBuf, message: String },

    #[error("invalid configuration value: {0}")]
    ConfigValue(String),

    #[error("failed to read exclusions file {path}: {source}")]
    ExclusionsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid format for \"{path}\": {message}")]
    ExclusionsFormat { path: PathBuf, message: String },

    #[error("failed to read summary file {path}: {message}")]
    SummaryRead { path: PathBuf, message: String },

    #[error("malformed summary line {line}: \"{content}\" (expected 4 fields separated by \", \")")]
    SummaryFormat { line: usize, content: String },

    #[error("failed to back up {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch dash-licenses: {0}")]
    Fetch(String),

    #[error("failed to launch {command}: {message}")]
    Spawn { command: String, message: String },
}

impl WrapperError {
    /// Map the error to a process exit code.
    ///
    /// All fatal wrapper errors exit with `1`. The scanner's own internal
    /// error code is reported as an outcome, not through this type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InputFileNotFound(_)
            | Self::ConfigRead { .. }
            | Self::ConfigFormat { .. }
            | Self::ConfigValue(_)
            | Self::ExclusionsRead { .. }
            | Self::ExclusionsFormat { .. }
            | Self::SummaryRead { .. }
            | Self::SummaryFormat { .. }
            | Self::Backup { .. }
            | Self::Fetch(_)
            | Self::Spawn { .. } => 1,
        }
    }
}
