//! User-maintained allowlist of dependencies pre-approved despite a
//! restricted status.
//!
//! Two on-disk shapes are accepted:
//!
//! ```json
//! ["npm/npmjs/-/foo/1.0.0", "npm/npmjs/-/bar/2.1.0"]
//! ```
//!
//! ```json
//! { "npm/npmjs/-/foo/1.0.0": "CQ 12345", "npm/npmjs/-/bar/2.1.0": { "reason": "..." } }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::Value;

use crate::error::WrapperError;
use crate::host::Host;
use crate::models::Finding;

/// Dependency identifier -> optional free-form annotation.
pub type Exclusions = BTreeMap<String, Option<Value>>;

/// Read and validate an exclusions file.
pub fn load_exclusions<H: Host>(host: &H, path: &Path) -> Result<Exclusions, WrapperError> {
    let content = host.read_to_string(path).map_err(|source| WrapperError::ExclusionsRead {
        path: path.to_path_buf(),
        source,
    })?;
    let json: Value = serde_json::from_str(&content).map_err(|e| WrapperError::ExclusionsFormat {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_exclusions(json).map_err(|message| WrapperError::ExclusionsFormat {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_exclusions(json: Value) -> Result<Exclusions, String> {
    match json {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(id) => Ok((id, None)),
                other => Err(format!("list entries must be strings, found {}", other)),
            })
            .collect(),
        Value::Object(entries) => Ok(entries
            .into_iter()
            .map(|(id, data)| {
                let data = if data.is_null() { None } else { Some(data) };
                (id, data)
            })
            .collect()),
        other => Err(format!(
            "expected a list of dependencies or an object keyed by dependency, found {}",
            other
        )),
    }
}

/// The annotation worth showing next to `dependency`, if any.
///
/// `false`, `0` and empty strings count as no annotation.
pub fn annotation<'a>(exclusions: &'a Exclusions, dependency: &str) -> Option<&'a Value> {
    exclusions
        .get(dependency)
        .and_then(Option::as_ref)
        .filter(|data| is_truthy(data))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Result of checking restricted findings against the exclusions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    /// Findings with no matching exclusion, in input order.
    pub unhandled: Vec<Finding>,
    /// Exclusion keys no finding referenced.
    pub unmatched: BTreeSet<String>,
}

/// Drop findings whose dependency is excluded, and report stale exclusions.
pub fn filter(findings: &[Finding], exclusions: &Exclusions) -> FilterOutcome {
    let mut unmatched: BTreeSet<String> = exclusions.keys().cloned().collect();

    let unhandled = findings
        .iter()
        .filter(|finding| {
            unmatched.remove(&finding.dependency);
            !exclusions.contains_key(&finding.dependency)
        })
        .cloned()
        .collect();

    FilterOutcome {
        unhandled,
        unmatched,
    }
}
