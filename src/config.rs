//! CLI configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via BICFG_CONFIG or --config)
//! 3. Environment variables

use bicfg_core::WorkspaceConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    IoError(PathBuf, std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine configuration.
    pub engine: EngineConfig,
    /// Output formatting.
    pub output: OutputConfig,
    /// REPL configuration.
    pub repl: ReplConfig,
    /// Default log filter when RUST_LOG is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            output: OutputConfig::default(),
            repl: ReplConfig::default(),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or BICFG_CONFIG), then applies
    /// environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match std::env::var("BICFG_CONFIG") {
                Ok(path) => Self::from_file(path)?,
                Err(_) => Self::default(),
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Self::from_yaml(&content).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    fn from_yaml(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    fn apply_env_overrides(&mut self) {
        self.engine.apply_env_overrides();
        self.output.apply_env_overrides();
        self.repl.apply_env_overrides();

        if let Ok(level) = std::env::var("BICFG_LOG") {
            if !level.is_empty() {
                self.log_level = level;
            }
        }
    }

    /// Engine settings for a workspace.
    pub fn workspace_config(&self) -> WorkspaceConfig {
        WorkspaceConfig::new().with_interpolate_templates(self.engine.interpolate_templates)
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Render `${variable}` placeholders in effect values.
    pub interpolate_templates: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpolate_templates: true,
        }
    }
}

impl EngineConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BICFG_INTERPOLATE_TEMPLATES") {
            self.interpolate_templates = parse_flag(&v);
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print exported and displayed JSON.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl OutputConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BICFG_PRETTY") {
            self.pretty = parse_flag(&v);
        }
    }
}

/// REPL configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// History file. Defaults to `$HOME/.bicfg_history`.
    pub history_file: Option<PathBuf>,
}

impl ReplConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("BICFG_HISTORY_FILE") {
            self.history_file = Some(PathBuf::from(path));
        }
    }

    /// Resolved history file path.
    pub fn history_path(&self) -> PathBuf {
        self.history_file.clone().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|h| PathBuf::from(h).join(".bicfg_history"))
                .unwrap_or_else(|_| ".bicfg_history".into())
        })
    }
}

fn parse_flag(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.engine.interpolate_templates);
        assert!(config.output.pretty);
        assert_eq!(config.log_level, "warn");
        assert!(config.repl.history_file.is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("engine:\n  interpolate_templates: false\n").unwrap();
        assert!(!config.engine.interpolate_templates);
        assert!(config.output.pretty);
        assert!(!config.workspace_config().interpolate_templates);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bicfg.yaml");
        std::fs::write(
            &path,
            "output:\n  pretty: false\nrepl:\n  history_file: /tmp/h\nlog_level: debug\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(!config.output.pretty);
        assert_eq!(config.repl.history_path(), PathBuf::from("/tmp/h"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_bad_yaml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "engine: [not, a, map]\n").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ParseError(..))
        ));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("yes"));
    }
}
