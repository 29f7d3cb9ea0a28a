use crate::adapter::{Options, BACKEND_KEY, DEFAULT_BACKEND};
use crate::callable::Callable;
use crate::error::{Result, WriteDownError};
use crate::input::DEFAULT_PREFIXES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";

/// Configuration for writedown, stored in `config.json` in the config directory.
///
/// Keys other than the ones below are backend options (`json_path`, `t_command`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteDownConfig {
    /// Backend name (e.g. "json", "t")
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Characters that start a tag
    #[serde(default = "default_prefixes")]
    pub prefixes: String,

    /// Method applied to plain text (default "add")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<serde_json::Value>,

    /// Method run when there is no input at all (default "list")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_action: Option<serde_json::Value>,

    #[serde(flatten)]
    pub options: BTreeMap<String, String>,
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

fn default_prefixes() -> String {
    DEFAULT_PREFIXES.to_string()
}

impl Default for WriteDownConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            prefixes: default_prefixes(),
            fallback: None,
            default_action: None,
            options: BTreeMap::new(),
        }
    }
}

impl WriteDownConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: WriteDownConfig = serde_json::from_str(&content)
            .map_err(|e| WriteDownError::Config(format!("{}: {}", config_path.display(), e)))?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    /// Backend options, including the backend name itself.
    pub fn to_options(&self) -> Options {
        let mut options: Options = self.options.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        options.set(BACKEND_KEY, self.backend.clone());
        options
    }

    /// Name of the fallback method, if one is configured.
    pub fn fallback_method(&self) -> Result<Option<String>> {
        method_name(self.fallback.as_ref())
    }

    /// Name of the method run when there is no input, if one is configured.
    pub fn default_action_method(&self) -> Result<Option<String>> {
        method_name(self.default_action.as_ref())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "backend" => Some(self.backend.clone()),
            "prefixes" => Some(self.prefixes.clone()),
            "fallback" => self.fallback.as_ref().map(display_value),
            "default_action" => self.default_action.as_ref().map(display_value),
            other => self.options.get(other).cloned(),
        }
    }

    /// Set a value. Callable keys must name a method.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "backend" => {
                if value.trim().is_empty() {
                    return Err(WriteDownError::Config("backend cannot be empty".into()));
                }
                self.backend = value.trim().to_string();
            }
            "prefixes" => self.prefixes = value.to_string(),
            "fallback" | "default_action" => {
                let callable = serde_json::Value::String(value.to_string());
                Callable::try_from(&callable)?;
                if key == "fallback" {
                    self.fallback = Some(callable);
                } else {
                    self.default_action = Some(callable);
                }
            }
            other => {
                self.options.insert(other.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    /// Every key and its value, in display order.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            ("backend".to_string(), self.backend.clone()),
            ("prefixes".to_string(), self.prefixes.clone()),
        ];
        for key in ["fallback", "default_action"] {
            if let Some(value) = self.get(key) {
                entries.push((key.to_string(), value));
            }
        }
        entries.extend(self.options.iter().map(|(k, v)| (k.clone(), v.clone())));
        entries
    }
}

fn method_name(value: Option<&serde_json::Value>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(value) => {
            let callable = Callable::try_from(value)?;
            Ok(callable.name().map(str::to_string))
        }
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WriteDownConfig::default();
        assert_eq!(config.backend, "example");
        assert_eq!(config.prefixes, "#@");
        assert_eq!(config.fallback_method().unwrap(), None);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = WriteDownConfig::load(dir.path().join("nowhere")).unwrap();
        assert_eq!(config, WriteDownConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("writedown");

        let mut config = WriteDownConfig::default();
        config.set("backend", "json").unwrap();
        config.set("json_path", "/tmp/notes.json").unwrap();
        config.set("fallback", "search").unwrap();
        config.save(&config_dir).unwrap();

        let loaded = WriteDownConfig::load(&config_dir).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.fallback_method().unwrap().as_deref(), Some("search"));
    }

    #[test]
    fn test_unknown_keys_are_backend_options() {
        let config: WriteDownConfig =
            serde_json::from_str(r#"{"backend": "t", "t_command": "python3 t.py", "list": "work"}"#)
                .unwrap();
        let options = config.to_options();
        assert_eq!(options.backend(), "t");
        assert_eq!(options.get("t_command"), Some("python3 t.py"));
        assert_eq!(options.get("list"), Some("work"));
        assert_eq!(config.prefixes, "#@");
    }

    #[test]
    fn test_non_string_callable_is_rejected() {
        let config: WriteDownConfig = serde_json::from_str(r#"{"fallback": 42}"#).unwrap();
        assert!(matches!(
            config.fallback_method(),
            Err(WriteDownError::InvalidCallableKind(_))
        ));

        let mut config = WriteDownConfig::default();
        assert!(config.set("default_action", " ").is_err());
        assert!(config.set("backend", "").is_err());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{ not json").unwrap();
        assert!(matches!(
            WriteDownConfig::load(dir.path()),
            Err(WriteDownError::Config(_))
        ));
    }

    #[test]
    fn test_entries_list_every_key() {
        let mut config = WriteDownConfig::default();
        config.set("default_action", "list").unwrap();
        config.set("task_dir", "/tmp/tasks").unwrap();
        let keys: Vec<String> = config.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["backend", "prefixes", "default_action", "task_dir"]);
        assert_eq!(config.get("default_action").as_deref(), Some("list"));
        assert_eq!(config.get("missing"), None);
    }
}
