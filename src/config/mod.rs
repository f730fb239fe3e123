//! Configuration management for `jira_offline`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`JIRA_OFFLINE_*`)
//! 3. User config (~/.config/jira-offline/config.yaml)
//! 4. Defaults
//!
//! Layers are flat maps of normalized keys (`data-dir`, `closed-statuses`)
//! to string values; [`AppConfig::from_layer`] resolves the merged layer
//! into typed settings.

use crate::error::{JiraError, Result};
use crate::serializer::datetime::parse_offset;
use chrono::FixedOffset;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Issue cache filename inside the data directory.
pub const CACHE_FILENAME: &str = "issue_cache.jsonl";
/// Project registry filename inside the data directory.
pub const PROJECTS_FILENAME: &str = "projects.json";

const ENV_PREFIX: &str = "JIRA_OFFLINE_";
const APP_DIR: &str = "jira-offline";

/// Statuses treated as closed when none are configured.
pub const DEFAULT_CLOSED_STATUSES: &[&str] =
    &["Closed", "Done", "Story Done", "Epic Done", "Resolved"];

/// Risk-tracking issue types hidden from the projection by default.
pub const DEFAULT_EXCLUDED_ISSUETYPES: &[&str] = &["Delivery Risk", "Ops/Introduced Risk"];

/// A flat configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value =
            serde_yaml::from_str(&contents).map_err(|e| JiraError::ConfigFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut layer = Self::default();
        flatten_yaml(&value, "", &mut layer.values);
        layer.values = layer
            .values
            .into_iter()
            .map(|(k, v)| (normalize_key(&k), v))
            .collect();
        Ok(layer)
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from `JIRA_OFFLINE_*` variables.
    #[must_use]
    pub fn from_env_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&normalize_key(key))
            .map(String::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    pub timezone: Option<String>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.data_dir {
            layer.insert("data-dir", path.to_string_lossy());
        }
        if let Some(path) = &self.cache {
            layer.insert("cache", path.to_string_lossy());
        }
        if let Some(tz) = &self.timezone {
            layer.insert("timezone", tz.clone());
        }

        layer
    }
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub cache_path: PathBuf,
    pub projects_path: PathBuf,
    pub closed_statuses: Vec<String>,
    pub excluded_issuetypes: Vec<String>,
    /// Timezone attached to remote date-times; local time when `None`.
    pub timezone: Option<FixedOffset>,
}

impl AppConfig {
    /// Settings rooted at `data_dir` with default behavior.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            cache_path: data_dir.join(CACHE_FILENAME),
            projects_path: data_dir.join(PROJECTS_FILENAME),
            closed_statuses: to_strings(DEFAULT_CLOSED_STATUSES),
            excluded_issuetypes: to_strings(DEFAULT_EXCLUDED_ISSUETYPES),
            timezone: None,
        }
    }

    /// Resolve a merged layer.
    ///
    /// # Errors
    ///
    /// Returns an error when the timezone cannot be parsed.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let data_dir = layer
            .get("data-dir")
            .map_or_else(default_data_dir, PathBuf::from);
        let mut config = Self::in_dir(&data_dir);

        if let Some(cache) = layer.get("cache") {
            config.cache_path = PathBuf::from(cache);
        }
        if let Some(projects) = layer.get("projects") {
            config.projects_path = PathBuf::from(projects);
        }
        if let Some(list) = layer.get("closed-statuses") {
            config.closed_statuses = split_list(list);
        }
        if let Some(list) = layer.get("excluded-issuetypes") {
            config.excluded_issuetypes = split_list(list);
        }
        if let Some(tz) = layer.get("timezone") {
            config.timezone = Some(
                parse_offset(tz)
                    .ok_or_else(|| JiraError::Config(format!("Unknown timezone '{tz}'")))?,
            );
        }

        Ok(config)
    }
}

/// Path of the user config file, if a home directory is known.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    let home = env::var("HOME").ok()?;
    Some(
        Path::new(&home)
            .join(".config")
            .join(APP_DIR)
            .join("config.yaml"),
    )
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.insert("closed-statuses", DEFAULT_CLOSED_STATUSES.join(","));
    layer.insert("excluded-issuetypes", DEFAULT_EXCLUDED_ISSUETYPES.join(","));
    layer
}

/// Load configuration with the standard precedence order.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or a
/// value does not resolve.
pub fn load_config(cli: &CliOverrides) -> Result<AppConfig> {
    let user = match cli.config.clone().or_else(user_config_path) {
        Some(path) => ConfigLayer::from_yaml(&path)?,
        None => ConfigLayer::default(),
    };
    let merged = ConfigLayer::merge_layers(&[
        default_config_layer(),
        user,
        ConfigLayer::from_env(),
        cli.as_layer(),
    ]);
    AppConfig::from_layer(&merged)
}

fn default_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("XDG_DATA_HOME") {
        if !dir.trim().is_empty() {
            return Path::new(&dir).join(APP_DIR);
        }
    }
    env::var("HOME").map_or_else(
        |_| PathBuf::from(".").join(format!(".{APP_DIR}")),
        |home| Path::new(&home).join(".local").join("share").join(APP_DIR),
    )
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn yaml_layer_flattens_lists() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.yaml");
        fs::write(
            &path,
            "data_dir: /tmp/jira\nclosed_statuses:\n  - Done\n  - Won't Fix\ntimezone: \"+10:00\"\n",
        )
        .expect("write config");

        let layer = ConfigLayer::from_yaml(&path).expect("layer");
        assert_eq!(layer.get("data-dir"), Some("/tmp/jira"));
        assert_eq!(layer.get("closed-statuses"), Some("Done,Won't Fix"));

        let config = AppConfig::from_layer(&layer).expect("config");
        assert_eq!(config.cache_path, PathBuf::from("/tmp/jira").join(CACHE_FILENAME));
        assert_eq!(config.closed_statuses, vec!["Done", "Won't Fix"]);
        assert_eq!(config.timezone, FixedOffset::east_opt(10 * 3600));
    }

    #[test]
    fn missing_yaml_is_empty() {
        let temp = TempDir::new().expect("tempdir");
        let layer = ConfigLayer::from_yaml(&temp.path().join("nope.yaml")).expect("layer");
        assert!(layer.values.is_empty());
    }

    #[test]
    fn invalid_yaml_names_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.yaml");
        fs::write(&path, "data_dir: [unclosed").expect("write config");
        let err = ConfigLayer::from_yaml(&path).unwrap_err();
        assert!(matches!(err, JiraError::ConfigFile { .. }));
    }

    #[test]
    fn env_vars_use_prefix() {
        let layer = ConfigLayer::from_env_vars(vec![
            ("JIRA_OFFLINE_DATA_DIR".to_string(), "/data".to_string()),
            ("JIRA_OFFLINE_EXCLUDED_ISSUETYPES".to_string(), "Risk".to_string()),
            ("HOME".to_string(), "/home/user".to_string()),
        ]);
        assert_eq!(layer.get("data-dir"), Some("/data"));
        assert_eq!(layer.get("excluded_issuetypes"), Some("Risk"));
        assert_eq!(layer.values.len(), 2);
    }

    #[test]
    fn precedence_cli_over_env_over_file() {
        let mut file = ConfigLayer::default();
        file.insert("data-dir", "/file");
        file.insert("timezone", "UTC");
        let env_layer = ConfigLayer::from_env_vars(vec![(
            "JIRA_OFFLINE_DATA_DIR".to_string(),
            "/env".to_string(),
        )]);
        let cli = CliOverrides {
            cache: Some(PathBuf::from("/cli/cache.jsonl")),
            ..CliOverrides::default()
        };

        let merged = ConfigLayer::merge_layers(&[
            default_config_layer(),
            file,
            env_layer,
            cli.as_layer(),
        ]);
        let config = AppConfig::from_layer(&merged).expect("config");
        assert_eq!(config.data_dir, PathBuf::from("/env"));
        assert_eq!(config.projects_path, PathBuf::from("/env").join(PROJECTS_FILENAME));
        assert_eq!(config.cache_path, PathBuf::from("/cli/cache.jsonl"));
        assert_eq!(config.timezone, FixedOffset::east_opt(0));
        assert_eq!(config.excluded_issuetypes.len(), 2);
    }

    #[test]
    fn bad_timezone_is_config_error() {
        let mut layer = ConfigLayer::default();
        layer.insert("data-dir", "/data");
        layer.insert("timezone", "Mars/Olympus");
        let err = AppConfig::from_layer(&layer).unwrap_err();
        assert!(matches!(err, JiraError::Config(_)));
    }
}
