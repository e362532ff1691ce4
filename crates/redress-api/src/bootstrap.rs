//! # Service Bootstrap
//!
//! Resolves the runtime configuration and builds the initial [`AppState`].
//!
//! ## Configuration Sources (lowest to highest precedence)
//!
//! 1. Built-in defaults (port 8080, no auth secret, in-memory only,
//!    `unrestricted` transitions, text logs).
//! 2. Optional YAML file given by `--config` / `REDRESS_CONFIG`.
//! 3. Command-line flags and their environment variables.
//!
//! ```yaml
//! port: 8080
//! auth_token: change-me
//! database_url: postgres://redress@localhost/redress
//! transition_policy: workflow
//! log_json: true
//! ```

use std::path::{Path, PathBuf};

use redress_lifecycle::TransitionPolicy;
use serde::Deserialize;

use crate::state::{AppConfig, AppState};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for [`ConfigFile`].
    #[error("invalid config file {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Values accepted in the YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub port: Option<u16>,
    pub auth_token: Option<String>,
    pub database_url: Option<String>,
    pub transition_policy: Option<TransitionPolicy>,
    pub log_json: Option<bool>,
}

impl ConfigFile {
    /// Parse a config file from YAML text.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, BootstrapError> {
        // An empty document deserializes as unit, not as a mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| BootstrapError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, BootstrapError> {
        let text = std::fs::read_to_string(path).map_err(|source| BootstrapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }
}

/// Values from flags and environment variables. These win over the file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub auth_token: Option<String>,
    pub database_url: Option<String>,
    pub transition_policy: Option<TransitionPolicy>,
    /// JSON logs are enabled if either source asks for them.
    pub log_json: bool,
}

/// Blank secrets and URLs mean "not configured".
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Merge defaults, the file and the overrides into an [`AppConfig`].
pub fn resolve(file: ConfigFile, overrides: ConfigOverrides) -> AppConfig {
    let defaults = AppConfig::default();
    AppConfig {
        port: overrides.port.or(file.port).unwrap_or(defaults.port),
        auth_token: present(overrides.auth_token).or_else(|| present(file.auth_token)),
        database_url: present(overrides.database_url).or_else(|| present(file.database_url)),
        transition_policy: overrides
            .transition_policy
            .or(file.transition_policy)
            .unwrap_or(defaults.transition_policy),
        log_json: overrides.log_json || file.log_json.unwrap_or(defaults.log_json),
    }
}

/// Load the optional config file and apply overrides.
pub fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<AppConfig, BootstrapError> {
    let file = match path {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    Ok(resolve(file, overrides))
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Build the in-memory application state and log the startup banner.
pub fn bootstrap(config: AppConfig) -> AppState {
    if config.auth_token.is_none() {
        tracing::warn!(
            "AUTH_TOKEN not set, authentication disabled. \
             Every request runs as the development administrator."
        );
    }

    let persistence = if config.database_url.is_some() {
        "postgres"
    } else {
        "memory"
    };
    tracing::info!(
        port = config.port,
        transition_policy = %config.transition_policy,
        persistence,
        auth = config.auth_token.is_some(),
        "Redress API configured"
    );

    AppState::with_config(config)
}
