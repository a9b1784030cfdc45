//! Configuration management for the `CareFinder` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::CareFinderError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `CareFinder` application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareFinderConfig {
    /// Web server configuration
    pub server: ServerConfig,
    /// Daycare dataset configuration
    pub data: DataConfig,
    /// Google Maps API configuration
    pub maps: MapsConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Default search settings
    pub defaults: DefaultsConfig,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the HTTP server listens on
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Daycare dataset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding dated CSV snapshots of the licensed child care dataset
    #[serde(default = "default_data_dir")]
    pub dir: String,
}

/// Google Maps API settings (geocoding and distance matrix)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    /// Google Maps API key; may also come from the GOOGLE_MAPS_API_KEY env var
    pub api_key: Option<String>,
    /// Base URL for the Google Maps web services
    #[serde(default = "default_maps_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_maps_timeout")]
    pub timeout_seconds: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
    /// Geocoding cache TTL in hours
    #[serde(default = "default_geocode_ttl")]
    pub geocode_ttl_hours: u32,
    /// Travel time cache TTL in hours
    #[serde(default = "default_travel_ttl")]
    pub travel_ttl_hours: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Default search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Search radius in kilometers
    #[serde(default = "default_search_radius")]
    pub search_radius_km: f64,
    /// Maximum number of results to return
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

// Default value functions
fn default_server_port() -> u16 {
    5001
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_maps_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_maps_timeout() -> u32 {
    30
}

fn default_cache_location() -> String {
    "~/.cache/carefinder".to_string()
}

fn default_geocode_ttl() -> u32 {
    24 * 30
}

fn default_travel_ttl() -> u32 {
    24 * 7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_search_radius() -> f64 {
    5.0
}

fn default_max_results() -> u32 {
    100
}

impl Default for CareFinderConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: default_server_port(),
            },
            data: DataConfig {
                dir: default_data_dir(),
            },
            maps: MapsConfig {
                api_key: None,
                base_url: default_maps_base_url(),
                timeout_seconds: default_maps_timeout(),
            },
            cache: CacheConfig {
                location: default_cache_location(),
                geocode_ttl_hours: default_geocode_ttl(),
                travel_ttl_hours: default_travel_ttl(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
            },
            defaults: DefaultsConfig {
                search_radius_km: default_search_radius(),
                max_results: default_max_results(),
            },
        }
    }
}

impl CareFinderConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with CAREFINDER_ prefix
        builder = builder.add_source(
            Environment::with_prefix("CAREFINDER")
                .separator("_")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CareFinderConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // The Maps key usually lives in the environment rather than the file
        if config.maps.api_key.is_none() {
            config.maps.api_key = std::env::var("GOOGLE_MAPS_API_KEY").ok();
        }

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("carefinder").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.port == 0 {
            self.server.port = default_server_port();
        }
        if self.data.dir.is_empty() {
            self.data.dir = default_data_dir();
        }
        if self.maps.base_url.is_empty() {
            self.maps.base_url = default_maps_base_url();
        }
        if self.maps.timeout_seconds == 0 {
            self.maps.timeout_seconds = default_maps_timeout();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.cache.geocode_ttl_hours == 0 {
            self.cache.geocode_ttl_hours = default_geocode_ttl();
        }
        if self.cache.travel_ttl_hours == 0 {
            self.cache.travel_ttl_hours = default_travel_ttl();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.defaults.search_radius_km <= 0.0 {
            self.defaults.search_radius_km = default_search_radius();
        }
        if self.defaults.max_results == 0 {
            self.defaults.max_results = default_max_results();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // The key is optional at startup; search requests fail without it
        if let Some(api_key) = &self.maps.api_key {
            if api_key.is_empty() {
                return Err(CareFinderError::config(
                    "Google Maps API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(CareFinderError::config(
                    "Google Maps API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 100 {
                return Err(CareFinderError::config(
                    "Google Maps API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.maps.timeout_seconds > 300 {
            return Err(
                CareFinderError::config("Maps API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.cache.geocode_ttl_hours > 24 * 365 {
            return Err(
                CareFinderError::config("Geocode cache TTL cannot exceed one year").into(),
            );
        }

        if self.cache.travel_ttl_hours > 24 * 90 {
            return Err(
                CareFinderError::config("Travel time cache TTL cannot exceed 90 days").into(),
            );
        }

        if !self.defaults.search_radius_km.is_finite() || self.defaults.search_radius_km > 50.0 {
            return Err(CareFinderError::config("Search radius cannot exceed 50 km").into());
        }

        if self.defaults.max_results > 500 {
            return Err(CareFinderError::config("Maximum results cannot exceed 500").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CareFinderError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        if !self.maps.base_url.starts_with("http://") && !self.maps.base_url.starts_with("https://")
        {
            return Err(CareFinderError::config(
                "Maps API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CareFinderConfig::default();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.data.dir, "data");
        assert_eq!(config.maps.base_url, "https://maps.googleapis.com/maps/api");
        assert_eq!(config.maps.timeout_seconds, 30);
        assert_eq!(config.defaults.search_radius_km, 5.0);
        assert!(config.maps.api_key.is_none());
    }

    #[test]
    fn test_config_validation_missing_api_key() {
        let config = CareFinderConfig::default();
        // The key is optional at startup
        assert!(config.validate_api_keys().is_ok());
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = CareFinderConfig::default();
        config.maps.api_key = Some("short".to_string());
        assert!(config.validate_api_keys().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = CareFinderConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid log level")
        );
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = CareFinderConfig::default();
        config.maps.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("timeout cannot exceed")
        );
    }

    #[test]
    fn test_config_validation_radius_range() {
        let mut config = CareFinderConfig::default();
        config.defaults.search_radius_km = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = CareFinderConfig::default();
        config.data.dir = String::new();
        config.defaults.search_radius_km = 0.0;
        config.apply_defaults();
        assert_eq!(config.data.dir, "data");
        assert_eq!(config.defaults.search_radius_km, 5.0);
    }

    #[test]
    fn test_config_path_generation() {
        let path = CareFinderConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("carefinder"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
