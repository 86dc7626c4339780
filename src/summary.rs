//! Reader for the scanner's summary file.
//!
//! One record per line, four fields separated by `", "`:
//! dependency, license, status, source. There is no quoting, so a field
//! containing the separator itself is split wrongly; the upstream format has
//! no way to express it.

use futures::stream::BoxStream;
use futures::{Stream, StreamExt, TryStreamExt};

use crate::error::WrapperError;
use crate::models::Finding;

pub const SEPARATOR: &str = ", ";

/// Split one summary line. Fields past the fourth are ignored.
pub fn parse_line(line_no: usize, line: &str) -> Result<Finding, WrapperError> {
    let mut fields = line.split(SEPARATOR);
    match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(dependency), Some(license), Some(status), Some(source)) => Ok(Finding {
            dependency: dependency.to_string(),
            license: license.to_string(),
            status: status.to_string(),
            source: source.to_string(),
        }),
        // A missing source field is rejected too; the scanner always writes four.
        _ => Err(WrapperError::SummaryFormat {
            line: line_no,
            content: line.to_string(),
        }),
    }
}

/// Turn a line stream into findings, in file order. Blank lines are skipped.
pub fn findings(
    lines: BoxStream<'_, Result<String, WrapperError>>,
) -> impl Stream<Item = Result<Finding, WrapperError>> + '_ {
    lines
        .enumerate()
        .filter_map(|(index, line)| async move {
            match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(parse_line(index + 1, &line)),
                Err(e) => Some(Err(e)),
            }
        })
}

/// Keep restricted findings (status compared case-insensitively), sorted by
/// dependency. The sort is stable.
pub fn select_restricted(findings: impl IntoIterator<Item = Finding>) -> Vec<Finding> {
    let mut restricted: Vec<Finding> = findings.into_iter().filter(Finding::is_restricted).collect();
    restricted.sort_by(|a, b| a.dependency.cmp(&b.dependency));
    restricted
}

/// Drain `lines` and return the sorted restricted findings.
pub async fn restricted_findings(
    lines: BoxStream<'_, Result<String, WrapperError>>,
) -> Result<Vec<Finding>, WrapperError> {
    let all: Vec<Finding> = findings(lines).try_collect().await?;
    Ok(select_restricted(all))
}
