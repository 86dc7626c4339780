//! One wrapper run, start to finish.
//!
//! # Flow
//! 1. Check the input file exists.
//! 2. Drop review mode if the credential or the project is missing.
//! 3. Fetch the scanner jar if it is not there yet.
//! 4. Move any previous summary to `<summary>.old`.
//! 5. Stop here on dry runs.
//! 6. Run the scanner; its internal-error code ends the run.
//! 7. Collect restricted findings and filter them through the exclusions.
//! 8. Pass when nothing restricted is left unhandled.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::console::Console;
use crate::error::WrapperError;
use crate::exclusions::{self, Exclusions};
use crate::host::Host;
use crate::models::{Finding, Outcome};
use crate::scanner::{self, ExitClass};
use crate::summary;

/// Where the previous summary is kept.
pub fn backup_path(summary: &Path) -> PathBuf {
    let mut name = summary.as_os_str().to_os_string();
    name.push(".old");
    PathBuf::from(name)
}

/// Review mode needs both the credential and a project name. Missing either
/// turns it off with a warning; the run goes on.
pub fn review_mode(config: &Config, credential_present: bool, console: &Console) -> bool {
    if !config.review {
        return false;
    }
    if !credential_present {
        console.warn("Please setup an Eclipse Foundation Gitlab Personal Access Token to run the license check in \"review\" mode");
        console.warn(&format!(
            "It should be set in an environment variable named \"{}\"",
            scanner::TOKEN_ENV
        ));
        console.warn("Proceeding without auto review since the PAT is not currently set");
        return false;
    }
    if config.project().is_none() {
        console.warn("Please provide a valid Eclipse Foundation project name to run the license check in \"review\" mode");
        console.warn("You can pass it using the \"--project=\" CLI parameter");
        console.warn("Proceeding without auto review, since the project is not currently set");
        return false;
    }
    true
}

pub async fn run<H: Host>(
    config: &Config,
    host: &H,
    console: &Console,
    artifact: &Path,
) -> Result<Outcome, WrapperError> {
    let input = Path::new(&config.input_file);
    if !host.file_exists(input) {
        return Err(WrapperError::InputFileNotFound(input.to_path_buf()));
    }
    console.info(&format!("Using input file: {} - found", input.display()));

    let review = review_mode(config, host.credential_present(), console);

    if !host.file_exists(artifact) {
        console.info("Fetching dash-licenses...");
        host.fetch_artifact(artifact).await?;
    }

    let summary_file =
        std::path::absolute(&config.summary).unwrap_or_else(|_| PathBuf::from(&config.summary));
    if host.file_exists(&summary_file) {
        console.info("Backing up previous summary...");
        host.rename(&summary_file, &backup_path(&summary_file))?;
    }

    let invocation = scanner::build_invocation(config, artifact, &summary_file, review);
    if review {
        if let Some(project) = config.project() {
            console.info(&format!("Using \"review\" mode for project: {}", project));
        }
    }

    if config.dry_run {
        console.info("Dry-run mode enabled - exiting before launching dash-licenses");
        return Ok(Outcome::DryRun);
    }

    console.info("Running dash-licenses...");
    let exit = host.run_scanner(&invocation).await?;
    match scanner::classify_exit(exit, &invocation) {
        ExitClass::Success => {}
        ExitClass::InternalError(message) => {
            console.error(&message);
            console.error("Detected an internal error in dash-licenses - run inconclusive");
            return Ok(Outcome::ScannerInternalError);
        }
        ExitClass::Warning(message) => console.warn(&message),
    }

    let restricted = summary::restricted_findings(host.read_lines(&summary_file)).await?;
    let outcome = check_restricted(config, host, console, &restricted)?;
    if outcome == Outcome::Passed {
        console.info("Done.");
    }
    Ok(outcome)
}

/// Decide pass/fail for the restricted findings.
fn check_restricted<H: Host>(
    config: &Config,
    host: &H,
    console: &Console,
    restricted: &[Finding],
) -> Result<Outcome, WrapperError> {
    if restricted.is_empty() {
        return Ok(Outcome::Passed);
    }

    let exclusions_file = Path::new(&config.exclusions);
    if !host.file_exists(exclusions_file) {
        console.error("Found unhandled restricted dependencies!");
        list_offending(console, restricted);
        return Ok(Outcome::Failed);
    }

    console.info("Checking results against the exclusions...");
    let exclusions = exclusions::load_exclusions(host, exclusions_file)?;
    let outcome = exclusions::filter(restricted, &exclusions);

    if !outcome.unmatched.is_empty() {
        report_stale(console, &outcome.unmatched, &exclusions);
    }

    if outcome.unhandled.is_empty() {
        return Ok(Outcome::Passed);
    }

    console.error("Found results that aren't part of the exclusions!");
    list_offending(console, &outcome.unhandled);
    Ok(Outcome::Failed)
}

fn list_offending(console: &Console, findings: &[Finding]) {
    for finding in findings {
        console.offending(&finding.to_string());
    }
}

fn report_stale<'a>(
    console: &Console,
    unmatched: impl IntoIterator<Item = &'a String>,
    exclusions: &Exclusions,
) {
    console.warn("Some entries in the exclusions did not match anything from dash-licenses output:");
    console.warn("(perhaps these entries are no longer required?)");
    for dependency in unmatched {
        console.stale(dependency);
        if let Some(data) = exclusions::annotation(exclusions, dependency) {
            console.warn(&format!("{}: {}", dependency, data));
        }
    }
}
