//! `dash-licenses-wrapper` — run the Eclipse dash-licenses scanner against a
//! dependency lockfile and fail when restricted dependencies are not covered
//! by the project's exclusion list.
//!
//! - [`cli`] parses the raw arguments against an ordered flag table.
//! - [`config`] merges defaults, the JSON config file and the CLI.
//! - [`orchestrator`] drives one run through a [`host::Host`].
//! - [`summary`] and [`exclusions`] turn scanner output into a verdict.
//! - [`lockfile`] backs the `yarn-deps` helper binary.

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod exclusions;
pub mod host;
pub mod lockfile;
pub mod models;
pub mod orchestrator;
pub mod scanner;
pub mod summary;
