//! Configuration loading and resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument / environment variable (collected into [`ConfigOverrides`])
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! A missing TOML file at the default location is not an error: the service
//! logs a warning and starts on defaults. A missing file that was named
//! explicitly is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;
/// Default generation model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";
/// Default generation API base URL
pub const DEFAULT_GENERATION_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Durable backend URL; `None` runs on the volatile backend only
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Pool acquire timeout; exceeding it counts as a connectivity failure
    pub database_acquire_timeout_ms: u64,
    pub generation: GenerationConfig,
    pub logging: LoggingConfig,
}

/// Settings for the external text generation capability
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// HTTP request timeout for one generation call
    pub request_timeout_secs: u64,
    /// Upper bound for one agent task, generation and storage together
    pub agent_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "salescribe_server=info,tower_http=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            database_max_connections: 5,
            database_acquire_timeout_ms: 3000,
            generation: GenerationConfig {
                api_key: None,
                model: DEFAULT_MODEL.to_string(),
                base_url: DEFAULT_GENERATION_BASE_URL.to_string(),
                request_timeout_secs: 30,
                agent_timeout_secs: 45,
            },
            logging: LoggingConfig::default(),
        }
    }
}

/// On-disk TOML layout. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<u32>,
    pub database_acquire_timeout_ms: Option<u64>,
    #[serde(default)]
    pub generation: TomlGenerationConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlGenerationConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub agent_timeout_secs: Option<u64>,
}

/// Highest-priority values, typically collected from CLI flags with ENV fallbacks
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub agent_timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }
}

/// Default config file location (`<config dir>/salescribe/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("salescribe").join("config.toml"))
}

/// Resolve the service configuration from overrides, TOML and defaults
pub fn resolve(overrides: &ConfigOverrides) -> Result<ServiceConfig> {
    let toml_config = match &overrides.config_file {
        Some(path) => {
            info!("Loading config file: {}", path.display());
            TomlConfig::load(path)?
        }
        None => match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading config file: {}", path.display());
                TomlConfig::load(&path)?
            }
            Some(path) => {
                warn!(
                    "Config file not found at {}, using defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                TomlConfig::default()
            }
        },
    };

    let config = merge(overrides, toml_config);
    config.validate()?;
    Ok(config)
}

/// Layer overrides over a parsed TOML config over compiled defaults
pub fn merge(overrides: &ConfigOverrides, file: TomlConfig) -> ServiceConfig {
    let defaults = ServiceConfig::default();
    let file_generation = file.generation;

    ServiceConfig {
        host: overrides.host.clone().or(file.host).unwrap_or(defaults.host),
        port: overrides.port.or(file.port).unwrap_or(defaults.port),
        database_url: overrides
            .database_url
            .clone()
            .or(file.database_url)
            .filter(|url| !url.trim().is_empty()),
        database_max_connections: file
            .database_max_connections
            .unwrap_or(defaults.database_max_connections),
        database_acquire_timeout_ms: file
            .database_acquire_timeout_ms
            .unwrap_or(defaults.database_acquire_timeout_ms),
        generation: GenerationConfig {
            api_key: overrides
                .api_key
                .clone()
                .or(file_generation.api_key)
                .filter(|key| !key.trim().is_empty()),
            model: overrides
                .model
                .clone()
                .or(file_generation.model)
                .unwrap_or(defaults.generation.model),
            base_url: file_generation.base_url.unwrap_or(defaults.generation.base_url),
            request_timeout_secs: file_generation
                .request_timeout_secs
                .unwrap_or(defaults.generation.request_timeout_secs),
            agent_timeout_secs: overrides
                .agent_timeout_secs
                .or(file_generation.agent_timeout_secs)
                .unwrap_or(defaults.generation.agent_timeout_secs),
        },
        logging: file.logging.unwrap_or(defaults.logging),
    }
}

impl ServiceConfig {
    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if self.database_max_connections == 0 {
            return Err(Error::Config(
                "database_max_connections must be at least 1".to_string(),
            ));
        }
        if self.database_acquire_timeout_ms == 0 {
            return Err(Error::Config(
                "database_acquire_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.generation.request_timeout_secs == 0 || self.generation.agent_timeout_secs == 0 {
            return Err(Error::Config(
                "generation timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` listen address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_overrides_take_priority_over_toml() {
        let file = TomlConfig::from_toml_str(
            r#"
            port = 9000
            database_url = "sqlite://file.db"

            [generation]
            model = "toml-model"
            agent_timeout_secs = 10
            "#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            port: Some(9100),
            model: Some("cli-model".to_string()),
            ..Default::default()
        };

        let config = merge(&overrides, file);
        assert_eq!(config.port, 9100);
        assert_eq!(config.generation.model, "cli-model");
        assert_eq!(config.database_url.as_deref(), Some("sqlite://file.db"));
        assert_eq!(config.generation.agent_timeout_secs, 10);
    }

    #[test]
    fn test_blank_database_url_means_volatile_only() {
        let overrides = ConfigOverrides {
            database_url: Some("   ".to_string()),
            ..Default::default()
        };
        let config = merge(&overrides, TomlConfig::default());
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ServiceConfig::default();
        config.generation.agent_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_toml_reports_config_error() {
        let result = TomlConfig::from_toml_str("port = \"not a number\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
