use std::path::{Path, PathBuf};

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::cli::{self, FlagTable, ParsedArgs};
use crate::console::Console;
use crate::error::WrapperError;
use crate::host::Host;

/// Partial configuration: a subset of the schema keys with raw JSON values.
pub type ConfigFragment = serde_json::Map<String, Value>;

/// Every key of the configuration schema.
pub const KEYS: [&str; 12] = [
    "batch",
    "configFile",
    "debug",
    "dryRun",
    "exclusions",
    "help",
    "inputFile",
    "noColor",
    "project",
    "review",
    "summary",
    "timeout",
];

/// Effective configuration, resolved once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Batch size, passed as-is to the scanner.
    #[serde(deserialize_with = "number_or_string")]
    pub batch: u32,
    /// Config file fine-tuning the options below.
    #[serde(deserialize_with = "number_as_string")]
    pub config_file: String,
    /// Print the intermediate configuration layers.
    #[serde(deserialize_with = "lenient_bool")]
    pub debug: bool,
    /// Stop before launching the scanner.
    #[serde(deserialize_with = "lenient_bool")]
    pub dry_run: bool,
    /// File listing dependencies allowed despite a restricted status.
    #[serde(deserialize_with = "number_as_string")]
    pub exclusions: String,
    /// Print usage and exit.
    #[serde(deserialize_with = "lenient_bool")]
    pub help: bool,
    /// Dependency file handed to the scanner.
    #[serde(deserialize_with = "number_as_string")]
    pub input_file: String,
    /// Disable coloured output.
    #[serde(deserialize_with = "lenient_bool")]
    pub no_color: bool,
    /// Eclipse Foundation short project name, e.g. `ecd.theia`. Empty when unset.
    #[serde(deserialize_with = "number_as_string")]
    pub project: String,
    /// Ask the scanner to open review tickets for flagged dependencies.
    #[serde(deserialize_with = "lenient_bool")]
    pub review: bool,
    /// File the scanner writes its findings to.
    #[serde(deserialize_with = "number_as_string")]
    pub summary: String,
    /// Timeout, passed as-is to the scanner.
    #[serde(deserialize_with = "number_or_string")]
    pub timeout: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            batch: 100,
            config_file: "dashLicensesConfig.json".to_string(),
            debug: false,
            dry_run: false,
            exclusions: "license-check-exclusions.json".to_string(),
            help: false,
            input_file: "yarn.lock".to_string(),
            no_color: false,
            project: String::new(),
            review: false,
            summary: "license-check-summary.txt".to_string(),
            timeout: 30,
        }
    }
}

impl Config {
    /// The configuration as a JSON object holding every schema key.
    pub fn to_fragment(&self) -> ConfigFragment {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => ConfigFragment::new(),
        }
    }

    pub fn from_fragment(fragment: ConfigFragment) -> Result<Self, WrapperError> {
        serde_json::from_value(Value::Object(fragment))
            .map_err(|e| WrapperError::ConfigValue(e.to_string()))
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn project(&self) -> Option<&str> {
        if self.project.is_empty() {
            None
        } else {
            Some(self.project.as_str())
        }
    }
}

/// Accept `51` as well as `"51"` for numeric settings.
fn number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a number, found \"{}\"", s))),
    }
}

/// Accept `true`, `"true"`, `1` and friends for switches.
///
/// Strings other than `"false"` and `"0"` and numbers other than zero are on,
/// so a hand-written config file behaves the way it reads.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(true)),
        Value::String(s) => {
            let s = s.trim();
            Ok(!(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")))
        }
        other => Err(de::Error::custom(format!("expected a boolean, found {}", other))),
    }
}

/// Accept `42` as well as `"42"` for text settings.
fn number_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected a string, found {}", other))),
    }
}

/// `null` and blank strings count as "not provided".
fn is_provided(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Read the optional JSON config file.
///
/// A missing file is not an error. Unknown keys and unset values are warned
/// about and left out of the returned fragment.
pub fn load_config_file<H: Host>(
    host: &H,
    path: &Path,
    console: &Console,
) -> Result<ConfigFragment, WrapperError> {
    let mut fragment = ConfigFragment::new();

    if !host.file_exists(path) {
        console.warn(&format!("Config file not found: {} - ignoring it", path.display()));
        return Ok(fragment);
    }

    let content = host.read_to_string(path).map_err(|source| WrapperError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: Value = serde_json::from_str(&content).map_err(|e| WrapperError::ConfigFormat {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let Value::Object(entries) = parsed else {
        return Err(WrapperError::ConfigFormat {
            path: path.to_path_buf(),
            message: "expected a JSON object".to_string(),
        });
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    for (key, value) in entries {
        if !KEYS.contains(&key.as_str()) {
            console.warn(&format!("Unknown config file entry: \"{}\" - ignoring it", key));
        } else if is_provided(&value) {
            fragment.insert(key, value);
        } else {
            console.warn(&format!(
                "({}) - config file entry \"{}\" is undefined - ignoring it",
                file_name, key
            ));
        }
    }

    Ok(fragment)
}

/// Merge the layers. Per key: CLI, then config file, then the built-in default.
pub fn resolve(cli: &ConfigFragment, file: &ConfigFragment) -> Result<Config, WrapperError> {
    let merged: ConfigFragment = Config::default()
        .to_fragment()
        .into_iter()
        .map(|(key, default)| {
            let value = cli
                .get(&key)
                .filter(|v| is_provided(v))
                .or_else(|| file.get(&key).filter(|v| is_provided(v)))
                .cloned()
                .unwrap_or(default);
            (key, value)
        })
        .collect();

    Config::from_fragment(merged)
}

/// The three layers that produced an effective configuration.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: Config,
    pub cli: ParsedArgs,
    pub file: ConfigFragment,
    pub config_path: PathBuf,
}

impl Resolution {
    /// Print the layers: CLI and file at DEBUG, the effective values at INFO.
    pub fn trace(&self, console: &Console) {
        console.debug_block(
            &format!("Parsed config file: \n(From file: {})", self.config_path.display()),
            &pretty(&self.file),
        );
        console.debug_block("Parsed CLI:", &pretty(&self.cli.values));
        console.info_block("Effective configuration: ", &self.config.to_pretty_json());
    }
}

fn pretty(fragment: &ConfigFragment) -> String {
    serde_json::to_string_pretty(fragment).unwrap_or_default()
}

/// Parse `args`, locate and read the config file, and resolve.
///
/// The config file named on the command line (if any) is located before the
/// rest of the resolution runs.
pub fn resolve_from_args<H: Host>(
    host: &H,
    table: &FlagTable,
    args: &[String],
    console: &Console,
) -> Result<Resolution, WrapperError> {
    let cli = cli::parse(table, args, console);

    let config_path = match cli.values.get("configFile").and_then(Value::as_str) {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(Config::default().config_file),
    };

    let file = load_config_file(host, &config_path, console)?;
    let config = resolve(&cli.values, &file)?;

    Ok(Resolution {
        config,
        cli,
        file,
        config_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SystemHost;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn fragment(value: Value) -> ConfigFragment {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", content).unwrap();
        f
    }

    /// (key, file value, CLI value, CLI value after resolution)
    fn samples() -> Vec<(&'static str, Value, Value, Value)> {
        vec![
            ("batch", json!(51), json!("7"), json!(7)),
            ("configFile", json!("a.json"), json!("b.json"), json!("b.json")),
            ("debug", json!(true), json!(true), json!(true)),
            ("dryRun", json!(true), json!(true), json!(true)),
            ("exclusions", json!("file-ex.json"), json!("cli-ex.json"), json!("cli-ex.json")),
            ("help", json!(true), json!(true), json!(true)),
            ("inputFile", json!("package-lock.json"), json!("pnpm-lock.yaml"), json!("pnpm-lock.yaml")),
            ("noColor", json!(true), json!(true), json!(true)),
            ("project", json!("ecd.cdt-cloud"), json!("ecd.theia"), json!("ecd.theia")),
            ("review", json!(true), json!(true), json!(true)),
            ("summary", json!("file-summary.txt"), json!("cli-summary.txt"), json!("cli-summary.txt")),
            ("timeout", json!(241), json!("12"), json!(12)),
        ]
    }

    #[test]
    fn test_defaults_without_cli_or_file() {
        let config = resolve(&ConfigFragment::new(), &ConfigFragment::new()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.batch, 100);
        assert_eq!(config.config_file, "dashLicensesConfig.json");
        assert_eq!(config.exclusions, "license-check-exclusions.json");
        assert_eq!(config.input_file, "yarn.lock");
        assert_eq!(config.summary, "license-check-summary.txt");
        assert_eq!(config.timeout, 30);
        assert!(config.project.is_empty());
        assert!(!config.debug && !config.dry_run && !config.help);
        assert!(!config.no_color && !config.review);
    }

    #[test]
    fn test_every_key_is_present_after_resolution() {
        let config = resolve(&ConfigFragment::new(), &ConfigFragment::new()).unwrap();
        let resolved = config.to_fragment();
        for key in KEYS {
            assert!(resolved.contains_key(key), "missing {}", key);
        }
        assert_eq!(resolved.len(), KEYS.len());
    }

    #[test]
    fn test_file_overrides_default_per_key() {
        for (key, file_value, _, _) in samples() {
            let file = fragment(json!({ key: file_value.clone() }));
            let resolved = resolve(&ConfigFragment::new(), &file).unwrap().to_fragment();
            assert_eq!(resolved[key], file_value, "key {}", key);
        }
    }

    #[test]
    fn test_cli_overrides_file_per_key() {
        for (key, file_value, cli_value, expected) in samples() {
            let file = fragment(json!({ key: file_value }));
            let cli = fragment(json!({ key: cli_value }));
            let resolved = resolve(&cli, &file).unwrap().to_fragment();
            assert_eq!(resolved[key], expected, "key {}", key);
        }
    }

    #[test]
    fn test_false_and_zero_in_file_are_honoured() {
        let file = fragment(json!({ "batch": 0, "review": false }));
        let config = resolve(&ConfigFragment::new(), &file).unwrap();
        assert_eq!(config.batch, 0);
        assert!(!config.review);
    }

    #[test]
    fn test_blank_and_null_file_entries_fall_through() {
        let f = write_config(r#"{ "project": "   ", "summary": "", "inputFile": null, "timeout": 5 }"#);
        let file = load_config_file(&SystemHost::new(), f.path(), &Console::default()).unwrap();
        assert_eq!(file.len(), 1);
        assert_eq!(file["timeout"], json!(5));

        let config = resolve(&ConfigFragment::new(), &file).unwrap();
        assert_eq!(config.project, "");
        assert_eq!(config.summary, "license-check-summary.txt");
        assert_eq!(config.input_file, "yarn.lock");
        assert_eq!(config.timeout, 5);
    }

    #[test]
    fn test_unknown_file_keys_are_ignored() {
        let f = write_config(r#"{ "verbose": true, "project": "ecd.theia" }"#);
        let file = load_config_file(&SystemHost::new(), f.path(), &Console::default()).unwrap();
        assert!(!file.contains_key("verbose"));
        let resolved = resolve(&ConfigFragment::new(), &file).unwrap().to_fragment();
        assert!(!resolved.contains_key("verbose"));
        assert_eq!(resolved["project"], json!("ecd.theia"));
    }

    #[test]
    fn test_missing_config_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = load_config_file(&SystemHost::new(), &dir.path().join("nope.json"), &Console::default()).unwrap();
        assert!(file.is_empty());
    }

    #[test]
    fn test_non_object_config_file_is_an_error() {
        let f = write_config(r#"["batch"]"#);
        let err = load_config_file(&SystemHost::new(), f.path(), &Console::default()).unwrap_err();
        assert!(matches!(err, WrapperError::ConfigFormat { .. }));
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let f = write_config("{ not json");
        let err = load_config_file(&SystemHost::new(), f.path(), &Console::default()).unwrap_err();
        assert!(matches!(err, WrapperError::ConfigFormat { .. }));
    }

    #[test]
    fn test_wrong_type_is_a_value_error() {
        let file = fragment(json!({ "batch": "lots" }));
        let err = resolve(&ConfigFragment::new(), &file).unwrap_err();
        assert!(matches!(err, WrapperError::ConfigValue(_)));
    }

    #[test]
    fn test_switches_accept_strings_and_numbers() {
        let file = fragment(json!({
            "dryRun": "true",
            "debug": 1,
            "review": "false",
            "noColor": 0,
            "help": "TRUE",
        }));
        let config = resolve(&ConfigFragment::new(), &file).unwrap();
        assert!(config.dry_run);
        assert!(config.debug);
        assert!(!config.review);
        assert!(!config.no_color);
        assert!(config.help);
    }

    #[test]
    fn test_text_settings_accept_numbers() {
        let file = fragment(json!({ "project": 42, "summary": 7 }));
        let config = resolve(&ConfigFragment::new(), &file).unwrap();
        assert_eq!(config.project, "42");
        assert_eq!(config.summary, "7");
    }

    #[test]
    fn test_structured_values_are_still_rejected() {
        let file = fragment(json!({ "dryRun": ["yes"] }));
        assert!(matches!(
            resolve(&ConfigFragment::new(), &file).unwrap_err(),
            WrapperError::ConfigValue(_)
        ));
        let file = fragment(json!({ "project": { "name": "ecd.theia" } }));
        assert!(matches!(
            resolve(&ConfigFragment::new(), &file).unwrap_err(),
            WrapperError::ConfigValue(_)
        ));
    }

    #[test]
    fn test_config_file_from_cli_is_used() {
        let f = write_config(
            r#"{ "project": "ecd.cdt-cloud", "inputFile": "examples/package-lock.json", "batch": 51, "timeout": 241 }"#,
        );
        let path = f.path().to_string_lossy().into_owned();
        let args = vec![format!("--configFile={}", path), "--dryRun".to_string()];
        let table = FlagTable::new().unwrap();
        let resolution = resolve_from_args(&SystemHost::new(), &table, &args, &Console::default()).unwrap();

        assert_eq!(resolution.config_path, PathBuf::from(&path));
        assert_eq!(resolution.config.config_file, path);
        assert_eq!(resolution.config.project, "ecd.cdt-cloud");
        assert_eq!(resolution.config.input_file, "examples/package-lock.json");
        assert_eq!(resolution.config.batch, 51);
        assert_eq!(resolution.config.timeout, 241);
        assert!(resolution.config.dry_run);
    }

    #[test]
    fn test_json_round_trip() {
        let config = Config {
            batch: 51,
            project: "ecd.theia".to_string(),
            review: true,
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.to_fragment(), config.to_fragment());
    }

    #[test]
    fn test_project_accessor() {
        assert_eq!(Config::default().project(), None);
        let config = Config {
            project: "ecd.theia".to_string(),
            ..Config::default()
        };
        assert_eq!(config.project(), Some("ecd.theia"));
    }
}
