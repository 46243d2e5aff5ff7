//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tradenet/tradenet.toml`
//! 3. Local config: `<data_dir>/.tradenet.toml`
//! 4. Environment variables: `TRADENET_*` prefix
//! 5. Command line (`--data-dir`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::util::path::{expand_env_vars, expand_path};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 1000;
const ENV_PREFIX: &str = "TRADENET";

/// The acting principal, as seen by the access policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ActorSettings {
    /// Display name (default: $USER or "operator")
    pub name: String,
    pub authenticated: bool,
    pub active: bool,
}

impl Default for ActorSettings {
    fn default() -> Self {
        Self {
            name: std::env::var("USER").unwrap_or_else(|_| "operator".into()),
            authenticated: true,
            active: true,
        }
    }
}

/// Raw actor settings; `None` means "not specified, inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawActorSettings {
    pub name: Option<String>,
    pub authenticated: Option<bool>,
    pub active: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub page_size: Option<usize>,
    pub actor: RawActorSettings,
}

/// Unified configuration for tradenet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the registry snapshot (default: ~/.tradenet)
    pub data_dir: PathBuf,
    /// Default page size of listings
    pub page_size: usize,
    pub actor: ActorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            page_size: DEFAULT_PAGE_SIZE,
            actor: ActorSettings::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".tradenet"))
        .unwrap_or_else(|| PathBuf::from("~/.tradenet"))
}

/// Get the XDG config directory for tradenet.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tradenet").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tradenet.toml"))
}

/// Get the path to the local config file in a data directory.
pub fn local_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".tradenet.toml")
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// `Ok(None)` when the key is absent, an error when it is present but malformed.
fn optional<T>(value: Result<T, ConfigError>) -> Result<Option<T>, ApplicationError> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.data_dir = expand_path(&self.data_dir);
        self.actor.name = expand_env_vars(&self.actor.name);
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            page_size: overlay.page_size.unwrap_or(self.page_size),
            actor: ActorSettings {
                name: overlay
                    .actor
                    .name
                    .clone()
                    .unwrap_or_else(|| self.actor.name.clone()),
                authenticated: overlay
                    .actor
                    .authenticated
                    .unwrap_or(self.actor.authenticated),
                active: overlay.actor.active.unwrap_or(self.actor.active),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// `data_dir` is the command line override; it also decides which
    /// local config file is read.
    pub fn load(data_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(
            global_config_path().as_deref(),
            data_dir,
            Environment::with_prefix(ENV_PREFIX),
        )
    }

    /// [`Settings::load`] with explicit global file and environment source.
    pub fn load_layers(
        global: Option<&Path>,
        data_dir: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        // 1. Defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global {
            if global_path.exists() {
                debug!("config: global {}", global_path.display());
                current = current.merge_with(&load_raw_settings(global_path)?);
            }
        }

        // 3. Local config of the data directory in effect
        let local_dir = data_dir
            .map(expand_path)
            .unwrap_or_else(|| expand_path(&current.data_dir));
        let local_path = local_config_path(&local_dir);
        if local_path.exists() {
            debug!("config: local {}", local_path.display());
            current = current.merge_with(&load_raw_settings(&local_path)?);
        }

        // 4. Environment
        current = Self::apply_env_overrides(current, env)?;

        // 5. Command line
        if let Some(dir) = data_dir {
            current.data_dir = dir.to_path_buf();
        }

        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Apply TRADENET_* environment variables, e.g. `TRADENET_PAGE_SIZE`
    /// or `TRADENET_ACTOR__ACTIVE`.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env.prefix_separator("_").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Some(val) = optional(config.get_string("data_dir"))? {
            settings.data_dir = PathBuf::from(val);
        }
        if let Some(val) = optional(config.get::<usize>("page_size"))? {
            settings.page_size = val;
        }
        if let Some(val) = optional(config.get_string("actor.name"))? {
            settings.actor.name = val;
        }
        if let Some(val) = optional(config.get_bool("actor.authenticated"))? {
            settings.actor.authenticated = val;
        }
        if let Some(val) = optional(config.get_bool("actor.active"))? {
            settings.actor.active = val;
        }
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ApplicationError::Config {
                message: format!(
                    "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                    self.page_size
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# tradenet configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/tradenet/tradenet.toml
#   Local:  <data_dir>/.tradenet.toml
#   Env:    TRADENET_* environment variables, nested keys with "__"
#           (TRADENET_PAGE_SIZE=50, TRADENET_ACTOR__ACTIVE=false)
#   CLI:    --data-dir

# Directory holding registry.json
# data_dir = "~/.tradenet"

# Default page size for listings (1..=1000)
# page_size = 20

[actor]
# Acting principal; every operation requires authenticated and active
# name = "operator"
# authenticated = true
# active = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load_layers(None, Some(temp.path()), env_of(&[])).unwrap();
        assert_eq!(settings.data_dir, temp.path());
        assert_eq!(settings.page_size, DEFAULT_PAGE_SIZE);
        assert!(settings.actor.authenticated && settings.actor.active);
    }

    #[test]
    fn given_global_and_local_files_when_loading_then_local_wins() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        std::fs::write(&global, "page_size = 50\n[actor]\nname = \"global\"\n").unwrap();
        std::fs::write(
            local_config_path(temp.path()),
            "page_size = 30\n",
        )
        .unwrap();

        let settings =
            Settings::load_layers(Some(&global), Some(temp.path()), env_of(&[])).unwrap();

        assert_eq!(settings.page_size, 30);
        assert_eq!(settings.actor.name, "global");
    }

    #[test]
    fn given_env_vars_when_loading_then_override_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(local_config_path(temp.path()), "page_size = 30\n").unwrap();

        let env = env_of(&[
            ("TRADENET_PAGE_SIZE", "7"),
            ("TRADENET_ACTOR__ACTIVE", "false"),
        ]);
        let settings = Settings::load_layers(None, Some(temp.path()), env).unwrap();

        assert_eq!(settings.page_size, 7);
        assert!(!settings.actor.active);
    }

    #[test]
    fn given_out_of_range_page_size_when_loading_then_config_error() {
        let temp = TempDir::new().unwrap();
        let env = env_of(&[("TRADENET_PAGE_SIZE", "0")]);
        let err = Settings::load_layers(None, Some(temp.path()), env).unwrap_err();
        assert!(matches!(err, ApplicationError::Config { .. }));
    }

    #[test]
    fn given_malformed_local_file_when_loading_then_config_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(local_config_path(temp.path()), "page_size = \"many\"\n").unwrap();
        let err = Settings::load_layers(None, Some(temp.path()), env_of(&[])).unwrap_err();
        assert!(err.to_string().contains(".tradenet.toml"));
    }

    #[test]
    fn given_tilde_in_data_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_dir: PathBuf::from("~/.tradenet"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.data_dir.starts_with(&home));
    }

    #[test]
    fn given_settings_when_to_toml_then_contains_actor_table() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("page_size = 20"));
        assert!(toml.contains("[actor]"));
    }
}
