//! Severity-prefixed, optionally coloured console output.
//!
//! Diagnostics (`INFO:`, `WARN:`, `ERROR:`, `DEBUG:`) go to stderr. Listings
//! meant to be copied or diffed (offending entries, stale exclusions, help)
//! go to stdout.

use colored::Colorize;

/// Console handle threaded through the run. `debug` gates [`Console::debug`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Console {
    debug: bool,
}

impl Console {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn info(&self, text: &str) {
        eprintln!("{}", format!("INFO: {}", text).bright_cyan());
    }

    pub fn warn(&self, text: &str) {
        eprintln!("{}", format!("WARN: {}", text).bright_yellow());
    }

    pub fn error(&self, text: &str) {
        eprintln!("{}", format!("ERROR: {}", text).bright_red());
    }

    pub fn debug(&self, text: &str) {
        if self.debug {
            eprintln!("{}", format!("DEBUG: {}", text).bright_black());
        }
    }

    pub fn help(&self, text: &str) {
        println!("{}", text.bright_green());
    }

    /// An offending entry in the failure listing.
    pub fn offending(&self, text: &str) {
        println!("{}", format!("X {}", text).bright_red());
    }

    /// An exclusion that matched nothing.
    pub fn stale(&self, text: &str) {
        println!("{}", format!("> {}", text).bright_magenta());
    }

    /// Print `text` line by line at INFO level, between dashed rulers.
    pub fn info_block(&self, title: &str, body: &str) {
        self.info(title);
        self.info(RULER);
        for line in body.lines() {
            self.info(line);
        }
        self.info(&format!("{}\n", RULER));
    }

    /// Same as [`Console::info_block`] at DEBUG level.
    pub fn debug_block(&self, title: &str, body: &str) {
        if !self.debug {
            return;
        }
        self.debug(title);
        self.debug(RULER);
        for line in body.lines() {
            self.debug(line);
        }
        self.debug(&format!("{}\n", RULER));
    }
}

const RULER: &str = "-------------------------------------";

/// Decide whether colour output stays on: off when the `noColor` setting is
/// set or `NO_COLOR` holds a non-empty value.
pub fn color_enabled(no_color_setting: bool, no_color_env: Option<&str>) -> bool {
    let env_disables = no_color_env.map(|v| !v.is_empty()).unwrap_or(false);
    !(no_color_setting || env_disables)
}

/// Apply the colour decision process-wide.
pub fn apply_color(enabled: bool) {
    if !enabled {
        colored::control::set_override(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_on_by_default() {
        assert!(color_enabled(false, None));
    }

    #[test]
    fn test_no_color_setting_disables() {
        assert!(!color_enabled(true, None));
    }

    #[test]
    fn test_no_color_env_disables_when_non_empty() {
        assert!(!color_enabled(false, Some("1")));
        assert!(color_enabled(false, Some("")));
    }
}
