//! Configuration management for the ClimaSphere service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::ClimaError;
use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable conventionally holding the OpenWeatherMap key
pub const OPENWEATHERMAP_KEY_VAR: &str = "OPENWEATHERMAP_API_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClimaConfig {
    /// Upstream provider settings
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Request validation settings
    #[serde(default)]
    pub request: RequestConfig,
}

/// Provider endpoints, credentials and time budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Open-Meteo API base URL
    #[serde(default = "default_open_meteo_url")]
    pub open_meteo_url: String,
    /// OpenWeatherMap API base URL
    #[serde(default = "default_openweathermap_url")]
    pub openweathermap_url: String,
    /// OpenWeatherMap API key (the adapter is skipped without one)
    pub openweathermap_api_key: Option<String>,
    /// NASA POWER API base URL
    #[serde(default = "default_power_url")]
    pub power_url: String,
    /// Per-attempt time budget in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// User-Agent sent upstream
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Request validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// How far into the future a target date may lie
    #[serde(default = "default_max_days_ahead")]
    pub max_days_ahead: u32,
}

// Default value functions
fn default_open_meteo_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_openweathermap_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_power_url() -> String {
    "https://power.larc.nasa.gov/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    12
}

fn default_user_agent() -> String {
    format!("climasphere/{}", crate::VERSION)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_days_ahead() -> u32 {
    60
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            open_meteo_url: default_open_meteo_url(),
            openweathermap_url: default_openweathermap_url(),
            openweathermap_api_key: None,
            power_url: default_power_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_days_ahead: default_max_days_ahead(),
        }
    }
}

impl ProvidersConfig {
    #[must_use]
    pub fn attempt_budget(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ClimaConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_layered(config_path, None)
    }

    /// Layer file and environment. `env` replaces the process environment when given.
    fn load_layered(config_path: Option<PathBuf>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if explicit && !config_file.exists() {
            return Err(ClimaError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CLIMASPHERE_PROVIDERS__TIMEOUT_SECONDS=5 and friends
        builder = builder.add_source(
            Environment::with_prefix("CLIMASPHERE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env.clone()),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: ClimaConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.providers.openweathermap_api_key.is_none() {
            config.providers.openweathermap_api_key = match &env {
                Some(vars) => vars.get(OPENWEATHERMAP_KEY_VAR).cloned(),
                None => std::env::var(OPENWEATHERMAP_KEY_VAR).ok(),
            };
        }

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("climasphere").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.providers.open_meteo_url.is_empty() {
            self.providers.open_meteo_url = default_open_meteo_url();
        }
        if self.providers.openweathermap_url.is_empty() {
            self.providers.openweathermap_url = default_openweathermap_url();
        }
        if self.providers.power_url.is_empty() {
            self.providers.power_url = default_power_url();
        }
        if self.providers.timeout_seconds == 0 {
            self.providers.timeout_seconds = default_timeout_seconds();
        }
        if self.providers.user_agent.is_empty() {
            self.providers.user_agent = default_user_agent();
        }
        if self
            .providers
            .openweathermap_api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.providers.openweathermap_api_key = None;
        }
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.providers.timeout_seconds > 120 {
            return Err(ClimaError::config("Provider timeout cannot exceed 120 seconds").into());
        }

        if self.server.request_timeout_seconds > 600 {
            return Err(ClimaError::config("Request timeout cannot exceed 600 seconds").into());
        }

        // A chain may spend one budget on each of its two live adapters
        if self.server.request_timeout_seconds < 2 * self.providers.timeout_seconds {
            return Err(ClimaError::config(
                "Request timeout must be at least twice the provider timeout",
            )
            .into());
        }

        if self.request.max_days_ahead > 366 {
            return Err(ClimaError::config("max_days_ahead cannot exceed 366 days").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ClimaError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ClimaError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("open_meteo_url", &self.providers.open_meteo_url),
            ("openweathermap_url", &self.providers.openweathermap_url),
            ("power_url", &self.providers.power_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ClimaError::config(format!(
                    "providers.{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClimaConfig::default();
        assert_eq!(config.providers.open_meteo_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.providers.timeout_seconds, 12);
        assert_eq!(config.providers.attempt_budget(), Duration::from_secs(12));
        assert_eq!(config.request.max_days_ahead, 60);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 8000);
        assert!(config.providers.openweathermap_api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = ClimaConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = ClimaConfig::default();
        config.providers.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = ClimaConfig::default();
        config.providers.power_url = "ftp://power.example".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("power_url"));
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = ClimaConfig::default();
        config.providers.open_meteo_url = String::new();
        config.providers.timeout_seconds = 0;
        config.providers.openweathermap_api_key = Some("   ".to_string());
        config.apply_defaults();

        assert_eq!(config.providers.open_meteo_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.providers.timeout_seconds, 12);
        assert!(config.providers.openweathermap_api_key.is_none());
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!("climasphere-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[providers]\ntimeout_seconds = 5\nopenweathermap_api_key = \"abc123\"\n\n[server]\nport = 9090\n"
        )
        .unwrap();

        let config = ClimaConfig::load_from_path(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.providers.timeout_seconds, 5);
        assert_eq!(config.providers.openweathermap_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.request.max_days_ahead, 60);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = ClimaConfig::load_from_path(Some(PathBuf::from("/nonexistent/climasphere.toml")));
        assert!(result.is_err());
    }

    fn env(vars: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            vars.iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    fn empty_config_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("climasphere-{name}-{}.toml", std::process::id()));
        std::fs::File::create(&path).unwrap();
        path
    }

    #[test]
    fn test_environment_variable_override() {
        let path = empty_config_file("env-override");
        let config = ClimaConfig::load_layered(
            Some(path.clone()),
            env(&[
                ("CLIMASPHERE_PROVIDERS__TIMEOUT_SECONDS", "7"),
                ("CLIMASPHERE_SERVER__PORT", "9191"),
                ("CLIMASPHERE_LOGGING__FORMAT", "json"),
            ]),
        );
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.providers.timeout_seconds, 7);
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_environment_override_is_validated() {
        let path = empty_config_file("env-invalid");
        let result = ClimaConfig::load_layered(
            Some(path.clone()),
            env(&[("CLIMASPHERE_PROVIDERS__TIMEOUT_SECONDS", "500")]),
        );
        std::fs::remove_file(&path).unwrap();

        assert!(result.unwrap_err().to_string().contains("Provider timeout cannot exceed"));
    }

    #[test]
    fn test_openweathermap_key_falls_back_to_conventional_variable() {
        let path = empty_config_file("owm-key");
        let config = ClimaConfig::load_layered(
            Some(path.clone()),
            env(&[(OPENWEATHERMAP_KEY_VAR, "key-from-env")]),
        );
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            config.unwrap().providers.openweathermap_api_key.as_deref(),
            Some("key-from-env")
        );
    }

    #[test]
    fn test_prefixed_key_wins_over_conventional_variable() {
        let path = empty_config_file("owm-prefixed");
        let config = ClimaConfig::load_layered(
            Some(path.clone()),
            env(&[
                ("CLIMASPHERE_PROVIDERS__OPENWEATHERMAP_API_KEY", "prefixed"),
                (OPENWEATHERMAP_KEY_VAR, "conventional"),
            ]),
        );
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            config.unwrap().providers.openweathermap_api_key.as_deref(),
            Some("prefixed")
        );
    }

    #[test]
    fn test_config_path_generation() {
        let path = ClimaConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("climasphere"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
