//! Command-line parsing for the wrapper.
//!
//! Each argument is tried against an ordered table of anchored patterns. The
//! first pattern that matches decides the flag; its optional capture is the
//! value. Presence-only flags resolve to `true`. Flags the scanner accepts but
//! this wrapper refuses to forward are recognised only to warn about them.

use anyhow::Result;
use regex::Regex;
use serde_json::Value;

use crate::config::ConfigFragment;
use crate::console::Console;

const UNSUPPORTED: &str = "Unsupported CLI arg";
const UNSUPPORTED_TOKEN: &str =
    "Unsupported CLI arg - for security reasons, use an environment variable or GitHub secret instead";

/// What the wrapper does with a recognised flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// Consumed by the wrapper itself.
    Wrapper,
    /// Passed on to the scanner.
    Forwarded,
    /// Recognised, never used. Carries the warning shown to the user.
    Unsupported(&'static str),
}

/// One row of the flag table.
#[derive(Debug)]
pub struct FlagPattern {
    pub name: &'static str,
    pub pattern: Regex,
    pub kind: FlagKind,
}

/// Ordered flag table. Evaluation order is table order.
#[derive(Debug)]
pub struct FlagTable {
    flags: Vec<FlagPattern>,
}

impl FlagTable {
    pub fn new() -> Result<Self> {
        use FlagKind::*;

        let rows: [(&'static str, &str, FlagKind); 20] = [
            // wrapper only
            ("configFile", r"^--(configFile)=(\S+)$", Wrapper),
            ("debug", r"^--(debug)$", Wrapper),
            ("dryRun", r"^--(dryRun)$", Wrapper),
            ("exclusions", r"^--(exclusions)=(\S+)$", Wrapper),
            ("help", r"^--(help)$", Wrapper),
            ("inputFile", r"^--(inputFile)=(\S+)$", Wrapper),
            ("noColor", r"^--(noColor)$", Wrapper),
            // forwarded to the scanner
            ("batch", r"^--(batch)=(\d+)$", Forwarded),
            ("project", r"^--(project)=(\S+)$", Forwarded),
            ("review", r"^--(review)$", Forwarded),
            ("summary", r"^--(summary)=(\S+)$", Forwarded),
            ("timeout", r"^--(timeout)=(\d+)$", Forwarded),
            // recognised but refused
            ("cd", r"^--(cd)=(\S+)$", Unsupported(UNSUPPORTED)),
            ("clearly-defined-api", r"^--(clearly-defined-api)=(\S+)$", Unsupported(UNSUPPORTED)),
            ("confidence", r"^--(confidence)=(\d+)$", Unsupported(UNSUPPORTED)),
            ("ef", r"^--(ef)=(\S+)$", Unsupported(UNSUPPORTED)),
            ("foundation-api", r"^--(foundation-api)=(\S+)$", Unsupported(UNSUPPORTED)),
            ("lic", r"^--(lic)=(\S+)$", Unsupported(UNSUPPORTED)),
            ("license", r"^--(license)=(\S+)$", Unsupported(UNSUPPORTED)),
            ("token", r"^--(token)=(.+)$", Unsupported(UNSUPPORTED_TOKEN)),
        ];

        let flags = rows
            .into_iter()
            .map(|(name, pattern, kind)| -> Result<FlagPattern> {
                Ok(FlagPattern {
                    name,
                    pattern: Regex::new(pattern)?,
                    kind,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { flags })
    }

    /// Find the first row matching `arg`, with its captured value if any.
    pub fn lookup<'a>(&self, arg: &'a str) -> Option<(&FlagPattern, Option<&'a str>)> {
        self.flags.iter().find_map(|flag| {
            flag.pattern
                .captures(arg)
                .map(|caps| (flag, caps.get(2).map(|m| m.as_str())))
        })
    }

    /// The table as `name -> pattern`, for diagnostics.
    pub fn describe(&self) -> String {
        let map: serde_json::Map<String, Value> = self
            .flags
            .iter()
            .map(|f| (f.name.to_string(), Value::String(f.pattern.as_str().to_string())))
            .collect();
        serde_json::to_string_pretty(&Value::Object(map)).unwrap_or_default()
    }
}

/// Result of parsing the raw argument list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedArgs {
    /// Supported flags and their values, keyed by configuration name.
    pub values: ConfigFragment,
    /// Recognised flags that were dropped.
    pub unsupported: Vec<String>,
    /// Arguments no pattern matched.
    pub unrecognized: Vec<String>,
}

impl ParsedArgs {
    pub fn fully_understood(&self) -> bool {
        self.unrecognized.is_empty()
    }
}

/// Parse wrapper arguments (program name excluded).
///
/// Never aborts: unmatched arguments are warned about and collected, and the
/// whole flag table is printed once so the user can see what is accepted.
pub fn parse(table: &FlagTable, args: &[String], console: &Console) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();

    for arg in args {
        match table.lookup(arg) {
            Some((flag, value)) => match flag.kind {
                FlagKind::Unsupported(reason) => {
                    console.warn(&format!("{}: \n\t-> {}", reason, flag.name));
                    parsed.unsupported.push(flag.name.to_string());
                }
                FlagKind::Wrapper | FlagKind::Forwarded => {
                    let value = match value {
                        Some(v) => Value::String(v.to_string()),
                        None => Value::Bool(true),
                    };
                    parsed.values.insert(flag.name.to_string(), value);
                }
            },
            None => {
                console.warn(&format!(
                    "The following CLI argument was not parsed successfully: \"{}\"",
                    arg
                ));
                parsed.unrecognized.push(arg.clone());
            }
        }
    }

    if !parsed.fully_understood() {
        console.warn(
            "Here are the supported CLI configurations and the Regular Expressions used to parse them:",
        );
        console.warn(&table.describe());
    }

    parsed
}

/// Print usage to stdout.
pub fn print_help(console: &Console, exec_name: &str) {
    let lines = [
        format!("Usage: {} [options]", exec_name),
        "Options:".to_string(),
        "  --batch=<number>               Batch size. Passed as-is to dash-licenses".to_string(),
        "  --configFile=<file>            Config file, to fine-tune dash-licenses options".to_string(),
        "  --debug                        Run in debug mode, printing-out more information".to_string(),
        "  --dryRun                       Run in dry run mode - do not create IP tickets".to_string(),
        "  --exclusions=<file>            File where exclusions are defined. Excluded 3PPs will be ignored,".to_string(),
        "                                 if reported by dash-licenses, and so will not cause the wrapper to exit".to_string(),
        "                                 with an error status".to_string(),
        "  --help                         Display this help message and exit".to_string(),
        "  --inputFile=<file>             File where dependencies are defined. Passed as-is to dash-licenses".to_string(),
        "                                 e.g. a project's \"yarn.lock\" or \"package-lock.json\". Default: \"yarn.lock\"".to_string(),
        "  --noColor                      Disable color output".to_string(),
        "  --project=<name>               Eclipse Foundation short project name. e.g. \"ecd.theia\", \"technology.dash\"".to_string(),
        "  --review                       Use dash-license \"review\" mode, to automatically create IP tickets for".to_string(),
        "                                 dependencies whose license require more scrutiny".to_string(),
        "  --summary=<file>               Summary file, in which dash-licenses will save its findings".to_string(),
        "  --timeout=<number>             Timeout. Passed as-is to dash-licenses".to_string(),
        String::new(),
        "Environment:".to_string(),
        "  DASH_TOKEN                     Eclipse Foundation Gitlab token, required for \"review\" mode".to_string(),
        "  DASH_LICENSES_JAR              Location of the dash-licenses jar (downloaded if absent)".to_string(),
        "  NO_COLOR                       Disable color output when set".to_string(),
        String::new(),
        "Examples:".to_string(),
        format!("  {} --dryRun --configFile=configs/dashLicensesConfig.json", exec_name),
        format!("  {} --inputFile=package-lock.json --summary=/tmp/license-check-summary.txt --review", exec_name),
        format!("  {} --summary=license-check-summary.txt --review --project=ecd.theia", exec_name),
        format!(
            "  {} --summary=license-check-summary.txt --review --project=ecd.theia --exclusions=license-check-exclusions.json",
            exec_name
        ),
    ];
    for line in &lines {
        console.help(line);
    }
}
