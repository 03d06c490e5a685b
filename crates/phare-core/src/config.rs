//! Configuration loading and parsing for Phare
//!
//! Provides functionality to load and parse `phare.toml` configuration files.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "phare.toml";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["stubs", "tests"];
const KNOWN_STUBS_KEYS: &[&str] = &["classes", "interfaces", "extends"];
const KNOWN_TESTS_KEYS: &[&str] = &["prefixes", "annotations", "attributes"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub stubs: StubsConfig,
    pub tests: TestsConfig,
}

/// Extra type knowledge seeded into the project index alongside the
/// built-in base types: classes and interfaces the analyzed codebase
/// assumes to exist (extensions, generated code), plus declared
/// `child = parent` inheritance pairs for them.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct StubsConfig {
    pub classes: Vec<String>,
    pub interfaces: Vec<String>,
    pub extends: HashMap<String, String>,
}

/// Test-method detection knobs used by the declaration harvester.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TestsConfig {
    pub prefixes: Vec<String>,
    pub annotations: Vec<String>,
    pub attributes: Vec<String>,
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            prefixes: vec!["test".to_string()],
            annotations: vec!["@test".to_string()],
            attributes: vec!["Test".to_string()],
        }
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    for (section, known_keys) in [("stubs", KNOWN_STUBS_KEYS), ("tests", KNOWN_TESTS_KEYS)] {
        if let Some(toml::Value::Table(section_table)) = table.get(section) {
            let known: HashSet<&str> = known_keys.iter().copied().collect();
            for key in section_table.keys() {
                if !known.contains(key.as_str()) {
                    warnings.push(format!("Unknown config option in [{}]: '{}'", section, key));
                }
            }
        }
    }

    warnings
}

pub fn load_config_or_default(start_dir: &Path) -> Config {
    find_config_file(start_dir)
        .and_then(|path| load_config(&path).ok())
        .unwrap_or_default()
}

pub fn load_config_or_default_with_warnings(start_dir: &Path) -> ConfigResult {
    match find_config_file(start_dir) {
        Some(path) => load_config_with_warnings(&path).unwrap_or_default(),
        None => ConfigResult::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    #[test]
    fn load_config_from_file() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
[stubs]
classes = ["Redis"]
interfaces = ["App\\Contracts\\Jsonable"]

[stubs.extends]
"App\\Generated\\Model" = "Illuminate\\Database\\Model"

[tests]
prefixes = ["test", "it"]
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();

        assert_eq!(config.stubs.classes, vec!["Redis"]);
        assert_eq!(config.stubs.interfaces, vec!["App\\Contracts\\Jsonable"]);
        assert_eq!(
            config.stubs.extends.get("App\\Generated\\Model"),
            Some(&"Illuminate\\Database\\Model".to_string())
        );
        assert_eq!(config.tests.prefixes, vec!["test", "it"]);
        // Sections not overridden keep their defaults.
        assert_eq!(config.tests.annotations, vec!["@test"]);
    }

    #[test]
    fn default_config_when_missing() {
        let dir = create_temp_dir();
        let config = load_config_or_default(dir.path());

        assert_eq!(config, Config::default());
        assert!(config.stubs.classes.is_empty());
        assert_eq!(config.tests.prefixes, vec!["test"]);
    }

    #[test]
    fn error_on_invalid_toml() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "this is not valid { toml }").unwrap();

        let result = load_config(&config_path);

        assert!(result.is_err());
        let err = result.unwrap_err();
        match err {
            ConfigError::ParseError { path, message } => {
                assert_eq!(path, config_path);
                assert!(!message.is_empty());
            }
            _ => panic!("Expected ParseError"),
        }
    }

    #[test]
    fn find_config_file_in_parent_directory() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "").unwrap();

        let nested = dir.path().join("src").join("Models");
        fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn unknown_keys_are_warned_not_fatal() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
typo_section = true

[tests]
prefixes = ["test"]
unknown_knob = 3
"#,
        )
        .unwrap();

        let result = load_config_with_warnings(&config_path).unwrap();
        assert_eq!(result.config.tests.prefixes, vec!["test"]);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("typo_section"));
        assert!(result.warnings[1].contains("[tests]"));
    }
}
