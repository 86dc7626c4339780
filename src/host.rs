//! Side effects the orchestrator depends on: the filesystem, the network,
//! the environment and the scanner process.
//!
//! [`SystemHost`] is the real thing. Tests substitute their own [`Host`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, BoxStream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use crate::error::WrapperError;
use crate::models::ScannerExit;
use crate::scanner::{self, Invocation};

#[allow(async_fn_in_trait)]
pub trait Host {
    fn file_exists(&self, path: &Path) -> bool;

    /// Whole contents of a small text file (config, exclusions).
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Whether the review-mode credential is available.
    fn credential_present(&self) -> bool;

    /// Download the scanner jar to `dest`.
    async fn fetch_artifact(&self, dest: &Path) -> Result<(), WrapperError>;

    /// Move `path` to `backup`, replacing any previous backup.
    fn rename(&self, path: &Path, backup: &Path) -> Result<(), WrapperError>;

    /// Run the scanner to completion.
    async fn run_scanner(&self, invocation: &Invocation) -> Result<ScannerExit, WrapperError>;

    /// Lines of `path`, lazily and in file order.
    fn read_lines(&self, path: &Path) -> BoxStream<'static, Result<String, WrapperError>>;
}

/// [`Host`] backed by the local machine.
#[derive(Debug, Clone)]
pub struct SystemHost {
    download_url: String,
}

impl SystemHost {
    pub fn new() -> Self {
        Self {
            download_url: scanner::DOWNLOAD_URL.to_string(),
        }
    }

    async fn download(&self, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        spinner.set_message(format!("downloading {}", dest.display()));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result: Result<()> = async {
            let response = reqwest::get(&self.download_url)
                .await
                .with_context(|| format!("requesting {}", self.download_url))?
                .error_for_status()?;
            let bytes = response.bytes().await.context("reading response body")?;

            // Write next to the destination, then move into place, so an
            // interrupted download never looks like a usable jar.
            let partial = partial_path(dest);
            tokio::fs::write(&partial, &bytes)
                .await
                .with_context(|| format!("writing {}", partial.display()))?;
            tokio::fs::rename(&partial, dest)
                .await
                .with_context(|| format!("moving {} into place", partial.display()))?;
            Ok(())
        }
        .await;

        spinner.finish_and_clear();
        result
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

impl Host for SystemHost {
    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn credential_present(&self) -> bool {
        std::env::var_os(scanner::TOKEN_ENV).is_some()
    }

    async fn fetch_artifact(&self, dest: &Path) -> Result<(), WrapperError> {
        self.download(dest)
            .await
            .map_err(|e| WrapperError::Fetch(format!("{:#}", e)))
    }

    fn rename(&self, path: &Path, backup: &Path) -> Result<(), WrapperError> {
        std::fs::rename(path, backup).map_err(|source| WrapperError::Backup {
            path: path.to_path_buf(),
            source,
        })
    }

    async fn run_scanner(&self, invocation: &Invocation) -> Result<ScannerExit, WrapperError> {
        let status = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| WrapperError::Spawn {
                command: invocation.pretty(),
                message: e.to_string(),
            })?;

        Ok(match status.code() {
            Some(code) => ScannerExit::Code(code),
            None => ScannerExit::Signal(signal_of(&status)),
        })
    }

    fn read_lines(&self, path: &Path) -> BoxStream<'static, Result<String, WrapperError>> {
        read_file_lines(path.to_path_buf())
    }
}

#[cfg(unix)]
fn signal_of(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

enum LineState {
    Unopened(PathBuf),
    Reading(Lines<BufReader<File>>, PathBuf),
    Finished,
}

/// Open `path` on first poll and yield its lines one at a time.
pub fn read_file_lines(path: PathBuf) -> BoxStream<'static, Result<String, WrapperError>> {
    stream::unfold(LineState::Unopened(path), |state| async move {
        match state {
            LineState::Unopened(path) => match File::open(&path).await {
                Ok(file) => next_line(BufReader::new(file).lines(), path).await,
                Err(e) => Some((Err(read_error(&path, e)), LineState::Finished)),
            },
            LineState::Reading(lines, path) => next_line(lines, path).await,
            LineState::Finished => None,
        }
    })
    .boxed()
}

async fn next_line(
    mut lines: Lines<BufReader<File>>,
    path: PathBuf,
) -> Option<(Result<String, WrapperError>, LineState)> {
    match lines.next_line().await {
        Ok(Some(line)) => Some((Ok(line), LineState::Reading(lines, path))),
        Ok(None) => None,
        Err(e) => Some((Err(read_error(&path, e)), LineState::Finished)),
    }
}

fn read_error(path: &Path, e: std::io::Error) -> WrapperError {
    WrapperError::SummaryRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn test_read_file_lines_in_order() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "first\nsecond\nthird\n").unwrap();
        let lines: Vec<String> = read_file_lines(f.path().to_path_buf())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(lines, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_read_missing_file_yields_error() {
        let dir = TempDir::new().unwrap();
        let result: Result<Vec<String>, WrapperError> =
            read_file_lines(dir.path().join("missing.txt")).try_collect().await;
        assert!(matches!(result, Err(WrapperError::SummaryRead { .. })));
    }

    #[test]
    fn test_rename_moves_file() {
        let dir = TempDir::new().unwrap();
        let summary = dir.path().join("summary.txt");
        let backup = dir.path().join("summary.txt.old");
        std::fs::write(&summary, "a, MIT, approved, clearlydefined\n").unwrap();
        std::fs::write(&backup, "stale").unwrap();

        SystemHost::new().rename(&summary, &backup).unwrap();

        assert!(!summary.exists());
        assert_eq!(
            std::fs::read_to_string(&backup).unwrap(),
            "a, MIT, approved, clearlydefined\n"
        );
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/cache/dash-licenses.jar")),
            PathBuf::from("/cache/dash-licenses.jar.part")
        );
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let invocation = Invocation {
            program: "definitely-not-a-real-binary-4b1d".to_string(),
            args: vec![],
        };
        let err = SystemHost::new().run_scanner(&invocation).await.unwrap_err();
        assert!(matches!(err, WrapperError::Spawn { .. }));
    }
}
