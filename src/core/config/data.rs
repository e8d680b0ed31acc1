use crate::utils::url::validate_endpoint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ROUTING_URL: &str = "http://localhost:8000/route";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_ENDPOINT_NAME: &str = "NLWeb Default";
pub const DEFAULT_ROUTING_TIMEOUT_SECS: u64 = 10;

pub const ENV_ROUTING_URL: &str = "NLWEB_ROUTING_URL";
pub const ENV_DEFAULT_ENDPOINT: &str = "NLWEB_DEFAULT_ENDPOINT";
pub const ENV_DATA_DIR: &str = "NLWEB_DATA_DIR";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Routing service that maps a query to an endpoint
    pub routing_url: Option<String>,
    /// Endpoint used when routing has no answer or is unavailable
    pub default_endpoint: Option<String>,
    pub default_endpoint_name: Option<String>,
    pub routing_timeout_secs: Option<u64>,
    /// Unset means tool calls run until the endpoint answers
    pub tool_timeout_secs: Option<u64>,
    /// Where conversations are stored (defaults to the platform data dir)
    pub data_dir: Option<PathBuf>,
}

/// Get a user-friendly display string for a path, using `~` for the home
/// directory on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn routing_url(&self) -> String {
        self.routing_url
            .clone()
            .unwrap_or_else(|| DEFAULT_ROUTING_URL.to_string())
    }

    pub fn default_endpoint(&self) -> String {
        self.default_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn default_endpoint_name(&self) -> String {
        self.default_endpoint_name
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT_NAME.to_string())
    }

    pub fn routing_timeout_secs(&self) -> u64 {
        self.routing_timeout_secs
            .unwrap_or(DEFAULT_ROUTING_TIMEOUT_SECS)
    }

    /// Applies environment overrides through `lookup` (normally
    /// `std::env::var`). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = read(ENV_ROUTING_URL) {
            self.routing_url = Some(url);
        }
        if let Some(endpoint) = read(ENV_DEFAULT_ENDPOINT) {
            self.default_endpoint = Some(endpoint);
        }
        if let Some(dir) = read(ENV_DATA_DIR) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    pub fn set_value(&mut self, key: ConfigKey, value: &str) -> Result<(), SettingError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SettingError::InvalidValue {
                key: key.as_str(),
                reason: "value must not be empty".to_string(),
            });
        }
        let invalid = |reason: String| SettingError::InvalidValue {
            key: key.as_str(),
            reason,
        };

        match key {
            ConfigKey::RoutingUrl => {
                validate_endpoint(value).map_err(invalid)?;
                self.routing_url = Some(value.to_string());
            }
            ConfigKey::DefaultEndpoint => {
                validate_endpoint(value).map_err(invalid)?;
                self.default_endpoint = Some(value.to_string());
            }
            ConfigKey::DefaultEndpointName => {
                self.default_endpoint_name = Some(value.to_string());
            }
            ConfigKey::RoutingTimeout => {
                self.routing_timeout_secs = Some(parse_seconds(value).map_err(invalid)?);
            }
            ConfigKey::ToolTimeout => {
                self.tool_timeout_secs = Some(parse_seconds(value).map_err(invalid)?);
            }
            ConfigKey::DataDir => {
                self.data_dir = Some(PathBuf::from(value));
            }
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::RoutingUrl => self.routing_url = None,
            ConfigKey::DefaultEndpoint => self.default_endpoint = None,
            ConfigKey::DefaultEndpointName => self.default_endpoint_name = None,
            ConfigKey::RoutingTimeout => self.routing_timeout_secs = None,
            ConfigKey::ToolTimeout => self.tool_timeout_secs = None,
            ConfigKey::DataDir => self.data_dir = None,
        }
    }
}

fn parse_seconds(value: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(0) => Err("timeout must be at least 1 second".to_string()),
        Ok(seconds) => Ok(seconds),
        Err(_) => Err(format!("'{value}' is not a whole number of seconds")),
    }
}

/// Keys accepted by `nlweb-chat set` / `nlweb-chat unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    RoutingUrl,
    DefaultEndpoint,
    DefaultEndpointName,
    RoutingTimeout,
    ToolTimeout,
    DataDir,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 6] = [
        ConfigKey::RoutingUrl,
        ConfigKey::DefaultEndpoint,
        ConfigKey::DefaultEndpointName,
        ConfigKey::RoutingTimeout,
        ConfigKey::ToolTimeout,
        ConfigKey::DataDir,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::RoutingUrl => "routing-url",
            ConfigKey::DefaultEndpoint => "default-endpoint",
            ConfigKey::DefaultEndpointName => "default-endpoint-name",
            ConfigKey::RoutingTimeout => "routing-timeout",
            ConfigKey::ToolTimeout => "tool-timeout",
            ConfigKey::DataDir => "data-dir",
        }
    }

    pub fn parse(key: &str) -> Result<Self, SettingError> {
        let normalized = key.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))
    }
}

/// Errors that can occur when modifying configuration settings.
#[derive(Debug, Error)]
pub enum SettingError {
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}
