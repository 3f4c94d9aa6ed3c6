//! Configuration - Window policy and sequence defaults
//!
//! Read from `--config FILE` or `<root>/.readahead/config.json`. Every field is
//! optional; missing fields take their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::WindowPolicy;
use crate::core::model::{ResultItem, ResultSet};
use crate::core::paths::config_dir;
use crate::core::render::{RenderConfig, Renderer};

/// Config file name inside the settings directory
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Window tunables
    pub policy: WindowPolicy,

    /// Default extension filter for scans
    pub extensions: Vec<String>,

    /// Include hidden files in scans
    pub hidden: bool,
}

impl Config {
    /// Default location for a root
    pub fn default_path(root: &Path) -> PathBuf {
        config_dir(root).join(CONFIG_FILE)
    }

    /// Load the config. An explicit path must exist; the default location may not.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::default_path(root);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config
            .policy
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }
}

/// Run the policy command
pub fn run_policy(config: &Config, render_config: RenderConfig) -> Result<()> {
    let mut result_set = ResultSet::new();
    result_set.push(ResultItem::policy(serde_json::to_value(config.policy)?));

    let renderer = Renderer::with_config(render_config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_default_config_uses_defaults() {
        let temp = tempdir().unwrap();
        let config = Config::load(temp.path(), None).unwrap();
        assert_eq!(config.policy, WindowPolicy::default());
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = tempdir().unwrap();
        let result = Config::load(temp.path(), Some(&temp.path().join("nope.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_config() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(config_dir(temp.path())).unwrap();
        std::fs::write(
            Config::default_path(temp.path()),
            r#"{"policy": {"in_direction_count": 8}, "extensions": ["png"]}"#,
        )
        .unwrap();

        let config = Config::load(temp.path(), None).unwrap();
        assert_eq!(config.policy.in_direction_count, 8);
        assert_eq!(config.policy.behind_on_forward, 5);
        assert_eq!(config.extensions, vec!["png"]);
        assert!(!config.hidden);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("custom.json");
        std::fs::write(&path, r#"{"policy": {"warm_start": 0}}"#).unwrap();

        let err = Config::load(temp.path(), Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("warm_start"));
    }

    #[test]
    fn test_oversized_window_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("custom.json");
        std::fs::write(&path, r#"{"policy": {"in_direction_count": 2000000000}}"#).unwrap();

        let err = Config::load(temp.path(), Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("in_direction_count"));
    }
}
