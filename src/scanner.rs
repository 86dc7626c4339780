//! Everything about the external dash-licenses scanner: where its jar lives,
//! how it is invoked, and what its exit status means.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::models::ScannerExit;

/// Exit code dash-licenses uses for its own internal failures.
pub const INTERNAL_ERROR_EXIT_CODE: i32 = 127;

pub const DOWNLOAD_URL: &str = "https://repo.eclipse.org/service/local/artifact/maven/redirect?r=dash-licenses&g=org.eclipse.dash&a=org.eclipse.dash.licenses&v=LATEST";

/// Environment variable overriding the jar location.
pub const JAR_ENV: &str = "DASH_LICENSES_JAR";

/// Environment variable holding the Eclipse Foundation Gitlab token.
pub const TOKEN_ENV: &str = "DASH_TOKEN";

const JAR_NAME: &str = "dash-licenses.jar";

/// Where the scanner jar is kept.
///
/// 1. `override_path` (from [`JAR_ENV`]), when non-empty
/// 2. `<cache dir>/dash-licenses-wrapper/dash-licenses.jar`
/// 3. `./download/dash-licenses.jar`
pub fn artifact_path(override_path: Option<&str>) -> PathBuf {
    if let Some(path) = override_path.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    match dirs::cache_dir() {
        Some(cache) => cache.join("dash-licenses-wrapper").join(JAR_NAME),
        None => PathBuf::from("download").join(JAR_NAME),
    }
}

/// A fully assembled scanner command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// `["java", "-jar", ...]` as pretty JSON, for diagnostics.
    pub fn pretty(&self) -> String {
        let parts: Vec<&str> = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect();
        serde_json::to_string_pretty(&parts).unwrap_or_else(|_| parts.join(" "))
    }
}

/// Build the `java -jar` command line.
///
/// `-project` is added whenever a project is configured because it lets the
/// scanner account for project-specific approvals; `-review` only when
/// `review` survived the credential and project checks.
pub fn build_invocation(config: &Config, jar: &Path, summary: &Path, review: bool) -> Invocation {
    let mut args = vec![
        "-jar".to_string(),
        jar.display().to_string(),
        config.input_file.clone(),
        "-batch".to_string(),
        config.batch.to_string(),
        "-timeout".to_string(),
        config.timeout.to_string(),
        "-summary".to_string(),
        summary.display().to_string(),
    ];

    if let Some(project) = config.project() {
        args.push("-project".to_string());
        args.push(project.to_string());
        if review {
            args.push("-review".to_string());
        }
    }

    Invocation {
        program: "java".to_string(),
        args,
    }
}

/// How the wrapper treats a finished scanner process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitClass {
    Success,
    /// The scanner failed internally; the run is inconclusive.
    InternalError(String),
    /// Non-zero exit or signal; worth a warning, findings decide the result.
    Warning(String),
}

pub fn classify_exit(exit: ScannerExit, invocation: &Invocation) -> ExitClass {
    match exit {
        ScannerExit::Code(0) => ExitClass::Success,
        ScannerExit::Code(INTERNAL_ERROR_EXIT_CODE) => ExitClass::InternalError(format!(
            "Command {} exit code ({}) means dash-licenses has encountered an internal error",
            invocation.pretty(),
            INTERNAL_ERROR_EXIT_CODE
        )),
        ScannerExit::Code(code) => ExitClass::Warning(format!(
            "Command {} exited with code: {}",
            invocation.pretty(),
            code
        )),
        ScannerExit::Signal(signal) => ExitClass::Warning(format!(
            "Command {} exited with signal: {}",
            invocation.pretty(),
            signal.map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string())
        )),
    }
}
