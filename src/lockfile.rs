//! Yarn lockfile reader producing `name@version` identifiers.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

/// One resolved package from the lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
}

impl LockedPackage {
    pub fn identifier(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

pub fn read_yarn_lock(path: &Path) -> Result<Vec<LockedPackage>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read lockfile: {}", path.display()))?;
    parse_yarn_lock(&content)
}

/// Parse yarn v1 and berry lockfiles.
///
/// Headers look like `foo@^1.0.0:`, `"@scope/foo@^1.0.0", "@scope/foo@^1.1.0":`
/// or `"foo@npm:^1.0.0":`. The name is the header up to the `@` that starts
/// the range (a leading `@` belongs to the scope). The first `version` line of
/// the entry gives the version.
pub fn parse_yarn_lock(content: &str) -> Result<Vec<LockedPackage>> {
    let mut packages = Vec::new();
    let mut lines = content.lines().peekable();

    let header_re = Regex::new(r#"^"?(@?[^@"]+)@[^"]*"?$"#)?;
    let version_re = Regex::new(r#"^\s+version:?\s+"?([^"\s]+)"?"#)?;

    while let Some(line) = lines.next() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') || !line.trim_end().ends_with(':') {
            continue;
        }

        let header = line.trim_end().trim_end_matches(':');
        let first_spec = header.split(", ").next().unwrap_or(header);
        let Some(caps) = header_re.captures(first_spec) else {
            continue;
        };
        let name = caps[1].to_string();

        let mut version = None;
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() || !(next.starts_with(' ') || next.starts_with('\t')) {
                break;
            }
            if version.is_none() {
                if let Some(vcaps) = version_re.captures(next) {
                    version = Some(vcaps[1].to_string());
                }
            }
            lines.next();
        }

        if let Some(version) = version {
            packages.push(LockedPackage { name, version });
        }
    }

    Ok(packages)
}

/// Distinct identifiers, in first-seen order.
pub fn unique_identifiers(packages: &[LockedPackage]) -> Vec<String> {
    let mut seen = HashSet::new();
    packages
        .iter()
        .map(LockedPackage::identifier)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
