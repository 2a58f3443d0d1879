//! Relay configuration with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`RelaySettings::default()`]
//! 2. **JSON file** — optional, merged over defaults field by field
//! 3. **Environment variables** — `ARBITER_*` overrides (highest priority)

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Failure while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// File was not valid settings JSON.
    #[error("failed to parse settings file: {0}")]
    Json(#[from] serde_json::Error),
    /// An `ARBITER_*` variable held an unusable value.
    #[error("invalid value for {var}: `{value}`")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Listener configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port. The original relay listened on 8090.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8090,
        }
    }
}

/// Relay tuning knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayTuning {
    /// Per-connection outbound queue depth; payloads beyond it are
    /// dropped for that client.
    pub outbound_queue: usize,
}

impl Default for RelayTuning {
    fn default() -> Self {
        Self { outbound_queue: 64 }
    }
}

/// Top-level settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Listener configuration.
    pub server: ServerSettings,
    /// Relay tuning.
    pub relay: RelayTuning,
}

impl RelaySettings {
    /// Load settings: defaults, then the optional file, then
    /// `ARBITER_HOST` / `ARBITER_PORT` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_json::from_str(&text)?
            }
            None => Self::default(),
        };
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    /// Like [`Self::load`], falling back to defaults with a warning on
    /// failure.
    #[must_use]
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "failed to load settings, using defaults");
                Self::default()
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Apply `ARBITER_*` overrides through an injectable lookup, so
    /// the override logic is testable without mutating process env.
    fn apply_env_from(
        &mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SettingsError> {
        if let Some(host) = get("ARBITER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("ARBITER_PORT") {
            self.server.port = port.parse().map_err(|_| SettingsError::Env {
                var: "ARBITER_PORT",
                value: port,
            })?;
        }
        Ok(())
    }
}
