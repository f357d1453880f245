//! core::settings
//!
//! Process bootstrap settings.
//!
//! # Overview
//!
//! Settings are an explicit struct populated once at process start and
//! passed by reference where needed. The root namespace's render
//! environment receives them as its `bootstrap` scope via
//! [`Settings::bootstrap_scope`].
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Config file (TOML)
//! 3. `CONFCAST_*` environment variables
//!
//! # Config File Locations
//!
//! Searched in order:
//! 1. `--config <path>` / explicit path if given
//! 2. `$CONFCAST_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/confcast/config.toml`
//! 4. `~/.confcast/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use confcast::core::settings::Settings;
//!
//! let settings = Settings::load(None).unwrap();
//! println!("resources at {}", settings.resources_path.display());
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use super::types::NamespaceName;

/// Errors from settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid setting value: {0}")]
    InvalidValue(String),
}

/// Resolved process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Port an external façade would bind; exported to the bootstrap scope.
    pub api_port: u16,
    /// Root directory holding one resource bundle per namespace.
    pub resources_path: PathBuf,
    /// Path of the file-backed store document.
    pub store_path: PathBuf,
    /// The administrative namespace whose values form the `peer` scope.
    pub root_namespace: String,
    /// Log filter directive for the tracing subscriber.
    pub log_level: String,
    /// Timeout applied to the remote deployment channel, in seconds.
    pub deploy_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_port: 9791,
            resources_path: PathBuf::from("./resources"),
            store_path: PathBuf::from("./confcast.json"),
            root_namespace: "hub".to_string(),
            log_level: "info".to_string(),
            deploy_timeout_secs: 60,
        }
    }
}

/// On-disk settings schema. Every field is optional; missing fields keep
/// their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    api_port: Option<u16>,
    resources_path: Option<PathBuf>,
    store_path: Option<PathBuf>,
    root_namespace: Option<String>,
    log_level: Option<String>,
    deploy_timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings with the documented precedence chain.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` when an explicitly named file cannot be
    /// read or parsed, or when a value fails validation. A missing file
    /// in the default search locations is not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match Self::config_path(explicit) {
            Some(path) if path.exists() => Some(Self::read_file(&path)?),
            Some(path) if explicit.is_some() => {
                return Err(SettingsError::ReadError {
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "settings file not found",
                    ),
                    path,
                });
            }
            _ => None,
        };
        Self::from_sources(file, |name| env::var(name).ok())
    }

    /// Locate the config file, honoring the search order.
    fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = env::var("CONFCAST_CONFIG") {
            return Some(PathBuf::from(path));
        }
        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg).join("confcast").join("config.toml");
            if path.exists() {
                return Some(path);
            }
        }
        dirs::home_dir().map(|home| home.join(".confcast").join("config.toml"))
    }

    fn read_file(path: &Path) -> Result<SettingsFile, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| SettingsError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Merge defaults, file values, and environment overrides.
    ///
    /// The environment lookup is injected so tests can run without
    /// touching process state.
    fn from_sources(
        file: Option<SettingsFile>,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        let mut settings = Settings::default();

        if let Some(file) = file {
            if let Some(v) = file.api_port {
                settings.api_port = v;
            }
            if let Some(v) = file.resources_path {
                settings.resources_path = v;
            }
            if let Some(v) = file.store_path {
                settings.store_path = v;
            }
            if let Some(v) = file.root_namespace {
                settings.root_namespace = v;
            }
            if let Some(v) = file.log_level {
                settings.log_level = v;
            }
            if let Some(v) = file.deploy_timeout_secs {
                settings.deploy_timeout_secs = v;
            }
        }

        if let Some(v) = env_lookup("CONFCAST_API_PORT") {
            settings.api_port = v
                .parse()
                .map_err(|_| SettingsError::InvalidValue(format!("CONFCAST_API_PORT={v}")))?;
        }
        if let Some(v) = env_lookup("CONFCAST_RESOURCES_PATH") {
            settings.resources_path = PathBuf::from(v);
        }
        if let Some(v) = env_lookup("CONFCAST_STORE_PATH") {
            settings.store_path = PathBuf::from(v);
        }
        if let Some(v) = env_lookup("CONFCAST_ROOT_NAMESPACE") {
            settings.root_namespace = v;
        }
        if let Some(v) = env_lookup("CONFCAST_LOG_LEVEL") {
            settings.log_level = v;
        }
        if let Some(v) = env_lookup("CONFCAST_DEPLOY_TIMEOUT_SECS") {
            settings.deploy_timeout_secs = v.parse().map_err(|_| {
                SettingsError::InvalidValue(format!("CONFCAST_DEPLOY_TIMEOUT_SECS={v}"))
            })?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Validate values that have formats beyond their types.
    fn validate(&self) -> Result<(), SettingsError> {
        NamespaceName::new(self.root_namespace.as_str()).map_err(|_| {
            SettingsError::InvalidValue(format!(
                "root_namespace '{}' is not a valid namespace name",
                self.root_namespace
            ))
        })?;
        Ok(())
    }

    /// Settings as the `bootstrap` render scope for the root namespace.
    ///
    /// Keys are the setting field names, values their string forms, so
    /// root-namespace templates can reference e.g.
    /// `{{ bootstrap.api_port }}`.
    pub fn bootstrap_scope(&self) -> IndexMap<String, Option<String>> {
        let mut scope = IndexMap::new();
        scope.insert("api_port".to_string(), Some(self.api_port.to_string()));
        scope.insert(
            "resources_path".to_string(),
            Some(self.resources_path.display().to_string()),
        );
        scope.insert(
            "store_path".to_string(),
            Some(self.store_path.display().to_string()),
        );
        scope.insert(
            "root_namespace".to_string(),
            Some(self.root_namespace.clone()),
        );
        scope.insert("log_level".to_string(), Some(self.log_level.clone()));
        scope.insert(
            "deploy_timeout_secs".to_string(),
            Some(self.deploy_timeout_secs.to_string()),
        );
        scope
    }
}
