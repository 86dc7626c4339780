/// One line of the scanner's summary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub dependency: String,
    pub license: String,
    pub status: String,
    pub source: String,
}

impl Finding {
    /// `true` when the scanner flagged this dependency as needing review.
    pub fn is_restricted(&self) -> bool {
        self.status.to_lowercase() == "restricted"
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.dependency, self.license)
    }
}

/// How the scanner process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerExit {
    Code(i32),
    /// Killed by a signal (no exit code). Carries the signal number when known.
    Signal(Option<i32>),
}

/// Final result of a wrapper run, mapped onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No unhandled restricted dependencies.
    Passed,
    /// Usage was printed; nothing else ran.
    Help,
    /// Stopped before launching the scanner.
    DryRun,
    /// Restricted dependencies not covered by the exclusions.
    Failed,
    /// The scanner reported an internal error; the run is inconclusive.
    ScannerInternalError,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Passed | Outcome::Help | Outcome::DryRun => 0,
            Outcome::Failed => 1,
            Outcome::ScannerInternalError => crate::scanner::INTERNAL_ERROR_EXIT_CODE,
        }
    }
}
