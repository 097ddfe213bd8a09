//! Explorer configuration
//!
//! Applications can load settings from the `[explorer]` section of `config/config.toml` or
//! from `LIFEGUARD_EXPLORER__EXPLORER__*` environment variables using `ExplorerConfig::load()`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "LIFEGUARD_EXPLORER";

/// What to do when a queue entry fails to resolve its relationships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPolicy {
    /// Abort the whole run with the error
    #[default]
    Abort,
    /// Record a diagnostic, skip the entry and keep going
    Continue,
}

/// What to do when the insert order leaves a residual graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedOrderPolicy {
    /// Return the partial order with the residual graph attached
    #[default]
    Report,
    /// Fail the run
    Abort,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub on_resolution_error: ResolutionPolicy,
    #[serde(default)]
    pub on_unresolved_order: UnresolvedOrderPolicy,
    /// Abandon the run once this many seconds have elapsed (checked per queue entry)
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl ExplorerConfig {
    /// Abort on resolution errors and on an unresolved insert order
    pub fn strict() -> Self {
        Self {
            on_resolution_error: ResolutionPolicy::Abort,
            on_unresolved_order: UnresolvedOrderPolicy::Abort,
            timeout_seconds: None,
        }
    }

    /// Skip failing entries and report an unresolved insert order
    pub fn lenient() -> Self {
        Self {
            on_resolution_error: ResolutionPolicy::Continue,
            on_unresolved_order: UnresolvedOrderPolicy::Report,
            timeout_seconds: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = Some(timeout.as_secs());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// Load the explorer configuration from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load from a specific TOML file (optional) overlaid with environment variables
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // An unreadable file is not fatal; retry with the environment only
                if std::path::Path::new(path).exists() {
                    log::warn!("Failed to load config file {path}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        // A missing section just means defaults
        match settings.get::<ExplorerConfig>("explorer") {
            Ok(cfg) => Ok(cfg),
            Err(ConfigError::NotFound(_)) => Ok(ExplorerConfig::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Explorer configuration could not be loaded from file or environment: {}",
                e
            ))),
        }
    }
}
