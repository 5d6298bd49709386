//! `statecase.toml` configuration.
//!
//! Every key is optional; command-line flags override whatever the file
//! sets.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;
use statecase_core::{ConventionalEntryPoint, ModificationPolicy, TransitionAware, UniformModified};
use statecase_storage::{DEFAULT_NAMESPACE, DEFAULT_RETENTION};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "statecase.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error reading config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// How modified states are classified into code changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyName {
    #[default]
    Uniform,
    TransitionAware,
}

impl PolicyName {
    pub fn policy(self) -> Box<dyn ModificationPolicy> {
        match self {
            PolicyName::Uniform => Box::new(UniformModified),
            PolicyName::TransitionAware => Box::new(TransitionAware),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub namespace: String,
    pub retention: usize,
    pub store_dir: PathBuf,
    pub entry_points: Vec<String>,
    pub policy: PolicyName,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            namespace: DEFAULT_NAMESPACE.to_string(),
            retention: DEFAULT_RETENTION,
            store_dir: PathBuf::from(".statecase"),
            entry_points: ConventionalEntryPoint::DEFAULT_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            policy: PolicyName::Uniform,
        }
    }
}

impl Config {
    /// Load `explicit` if given (it must exist), else `statecase.toml` in
    /// the working directory if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Config::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Config::parse(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn parse(text: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn entry_strategy(&self) -> ConventionalEntryPoint {
        ConventionalEntryPoint::new(self.entry_points.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            retention = 5
            policy = "transition-aware"
            entry_points = ["splash"]
            "#,
        )
        .unwrap();
        assert_eq!(config.retention, 5);
        assert_eq!(config.policy, PolicyName::TransitionAware);
        assert_eq!(config.entry_points, vec!["splash"]);
        assert_eq!(config.namespace, "statecase");
        assert_eq!(config.store_dir, PathBuf::from(".statecase"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("retension = 5").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "namespace = \"qa\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.namespace, "qa");
    }
}
