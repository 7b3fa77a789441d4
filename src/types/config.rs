//! Configuration for the QA Sphere MCP server.
//!
//! Values come from an optional TOML file and are then overridden by the
//! environment (`QASPHERE_TENANT_URL`, `QASPHERE_API_KEY`, `MCP_LOG_TO_FILE`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{QaSphereError, QaSphereResult};

/// Environment variable holding the tenant URL.
pub const ENV_TENANT_URL: &str = "QASPHERE_TENANT_URL";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "QASPHERE_API_KEY";

/// Environment variable enabling the protocol traffic log.
pub const ENV_LOG_TO_FILE: &str = "MCP_LOG_TO_FILE";

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// QA Sphere API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Protocol traffic logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Timeout for each API request (in seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// QA Sphere tenant settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Tenant URL, e.g. `https://acme.eu1.qasphere.com`.
    #[serde(default)]
    pub tenant_url: String,

    /// API key sent as `Authorization: ApiKey <key>`.
    #[serde(default)]
    pub api_key: String,
}

/// Protocol traffic logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// File receiving every JSON-RPC message, one JSON object per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_log: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> QaSphereResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> QaSphereResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Loads the file if it exists, then overlays `.env` and the process environment.
    pub fn resolve<P: AsRef<Path>>(path: P) -> QaSphereResult<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default_config()
        };

        // A missing .env file is the common case
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(QaSphereError::config(format!("Failed to read .env: {}", e)));
            }
        }

        config.apply_env();
        Ok(config)
    }

    /// Overlays values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlays values from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = non_empty(ENV_TENANT_URL) {
            self.api.tenant_url = url;
        }
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api.api_key = key;
        }
        if let Some(path) = non_empty(ENV_LOG_TO_FILE) {
            self.logging.traffic_log = Some(PathBuf::from(path));
        }

        if !self.api.tenant_url.is_empty() {
            self.api.tenant_url = normalize_tenant_url(&self.api.tenant_url);
        }
    }

    /// Checks that everything needed to reach the API is present.
    pub fn validate(&self) -> QaSphereResult<()> {
        let mut missing = Vec::new();
        if self.api.tenant_url.is_empty() {
            missing.push(ENV_TENANT_URL);
        }
        if self.api.api_key.is_empty() {
            missing.push(ENV_API_KEY);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(QaSphereError::config(format!(
                "Missing required environment variable(s): {}",
                missing.join(", ")
            )))
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Normalizes a tenant URL.
///
/// Adds `https://` when no `http://`/`https://` scheme is present (compared
/// case-insensitively, original casing is kept) and strips one trailing slash.
pub fn normalize_tenant_url(url: &str) -> String {
    let lower = url.to_lowercase();
    let mut tenant_url = if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    if tenant_url.ends_with('/') {
        tenant_url.pop();
    }

    tenant_url
}
