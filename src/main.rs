//! `dash-licenses-wrapper` — run dash-licenses and check restricted findings
//! against an exclusion list.
//!
//! # Flow
//! 1. Parse CLI arguments and resolve the configuration ([`config::resolve_from_args`]).
//! 2. Print usage and stop on `--help`.
//! 3. Trace the configuration layers.
//! 4. Run the check ([`orchestrator::run`]).
//! 5. Exit `0` (clean, help, dry run), `1` (fatal error or unhandled
//!    restricted dependencies) or `127` (scanner internal error).

use std::path::Path;

use anyhow::Result;

use dash_licenses_wrapper::cli::{self, FlagTable};
use dash_licenses_wrapper::config;
use dash_licenses_wrapper::console::{self, Console};
use dash_licenses_wrapper::error::WrapperError;
use dash_licenses_wrapper::host::SystemHost;
use dash_licenses_wrapper::models::Outcome;
use dash_licenses_wrapper::orchestrator;
use dash_licenses_wrapper::scanner;

#[tokio::main]
async fn main() -> Result<()> {
    let no_color_env = std::env::var("NO_COLOR").ok();
    console::apply_color(console::color_enabled(false, no_color_env.as_deref()));

    let mut argv = std::env::args_os().map(|a| a.to_string_lossy().into_owned());
    let exec_name = argv
        .next()
        .as_deref()
        .and_then(|p| Path::new(p).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dash-licenses-wrapper".to_string());
    let args: Vec<String> = argv.collect();

    let table = FlagTable::new()?;

    let code = match run(&table, &args, &exec_name, no_color_env.as_deref()).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            Console::default().error(&e.to_string());
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(
    table: &FlagTable,
    args: &[String],
    exec_name: &str,
    no_color_env: Option<&str>,
) -> Result<Outcome, WrapperError> {
    let host = SystemHost::new();
    let resolution = config::resolve_from_args(&host, table, args, &Console::default())?;
    let config = &resolution.config;

    console::apply_color(console::color_enabled(config.no_color, no_color_env));
    let console = Console::new(config.debug);

    if config.help {
        cli::print_help(&console, exec_name);
        return Ok(Outcome::Help);
    }

    resolution.trace(&console);

    let jar_override = std::env::var(scanner::JAR_ENV).ok();
    let artifact = scanner::artifact_path(jar_override.as_deref());

    orchestrator::run(config, &host, &console, &artifact).await
}
