//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tagtree/tagtree.toml`
//! 3. Local config: a file named by the caller (e.g. `tagtree -c local.toml`)
//! 4. Environment variables: `TAGTREE__*` (e.g. `TAGTREE__RENDER__SHOW_IDS=false`)

use std::path::{Path, PathBuf};

use config::{Config, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{ConfigurePolicy, Tag, TagTree};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("environment: {0}")]
    Env(#[from] config::ConfigError),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// How trees are printed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderSettings {
    /// Append `#id` to labels of tags that have an identifier
    pub show_ids: bool,
    /// Append `@handle` to labels of tags without an identifier
    pub show_handles: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            show_ids: true,
            show_handles: false,
        }
    }
}

/// Unified configuration for tagtree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// When containers configure newly attached children
    pub configure_policy: ConfigurePolicy,
    pub render: RenderSettings,
}

/// Raw render settings for intermediate parsing (`None` = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawRenderSettings {
    pub show_ids: Option<bool>,
    pub show_handles: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub configure_policy: Option<ConfigurePolicy>,
    pub render: RawRenderSettings,
}

/// Get the XDG config directory for tagtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tagtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tagtree.toml"))
}

fn env_source() -> Environment {
    Environment::with_prefix("TAGTREE").separator("__")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a policy name as written in config files.
pub fn parse_policy(value: &str) -> Result<ConfigurePolicy, SettingsError> {
    match value.trim() {
        "first-attach" => Ok(ConfigurePolicy::FirstAttach),
        "every-attach" => Ok(ConfigurePolicy::EveryAttach),
        other => Err(SettingsError::Invalid {
            key: "configure_policy".into(),
            value: other.into(),
        }),
    }
}

impl Settings {
    /// Overlay wins where it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            configure_policy: overlay.configure_policy.unwrap_or(self.configure_policy),
            render: RenderSettings {
                show_ids: overlay.render.show_ids.unwrap_or(self.render.show_ids),
                show_handles: overlay.render.show_handles.unwrap_or(self.render.show_handles),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file; unlike the global file it must exist
    #[instrument(level = "debug")]
    pub fn load(local: Option<&Path>) -> Result<Self, SettingsError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config, if present
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Local config
        if let Some(path) = local {
            debug!("local config: {}", path.display());
            current = current.merge_with(&load_raw_settings(path)?);
        }

        // 4. Environment variables (explicit override)
        Self::apply_env_overrides(current)
    }

    /// Apply TAGTREE__* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, SettingsError> {
        Self::apply_overrides(settings, env_source())
    }

    fn apply_overrides(mut settings: Self, source: Environment) -> Result<Self, SettingsError> {
        // Use config crate just for env var parsing
        let config = Config::builder().add_source(source).build()?;

        if let Ok(val) = config.get_string("configure_policy") {
            settings.configure_policy = parse_policy(&val)?;
        }
        if let Ok(val) = config.get_bool("render.show_ids") {
            settings.render.show_ids = val;
        }
        if let Ok(val) = config.get_bool("render.show_handles") {
            settings.render.show_handles = val;
        }

        Ok(settings)
    }

    /// An empty tree honoring these settings.
    pub fn new_tree<T: Tag>(&self) -> TagTree<T> {
        TagTree::with_policy(self.configure_policy)
    }

    /// Serialize as TOML, e.g. to seed a config file.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
