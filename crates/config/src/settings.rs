//! Process settings
//!
//! These control how the service runs (which document to load, how to log),
//! as opposed to the boot document itself. Defaults are overridden by
//! `IPXE_DISTRIBUTOR_*` environment variables and then by command line flags.

use crate::schema::DEFAULT_CONFIG_FILE;
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use types::{ConfigError, ConfigResult};

/// Environment variable prefix for service settings
pub const ENV_PREFIX: &str = "IPXE_DISTRIBUTOR_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// Service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Boot document to load
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_config_file() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            config_file: default_config_file(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl ServiceSettings {
    /// Defaults merged with the environment
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(ServiceSettings::default()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load settings from defaults and environment variables
    pub fn load() -> ConfigResult<Self> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> ConfigResult<Self> {
        let settings: ServiceSettings = figment
            .extract()
            .map_err(|e| ConfigError::InvalidSettings(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject log levels and formats the subscriber doesn't understand
    pub fn validate(&self) -> ConfigResult<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log_level".to_string(),
                value: self.log_level.clone(),
            });
        }

        if !VALID_LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log_format".to_string(),
                value: self.log_format.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let settings = ServiceSettings::default();
        assert_eq!(settings.config_file, PathBuf::from("/etc/ipxe-distributor/config.yaml"));
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.log_format, "json");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("IPXE_DISTRIBUTOR_CONFIG_FILE", "/srv/boot.yaml");
            jail.set_env("IPXE_DISTRIBUTOR_LOG_FORMAT", "pretty");

            let settings: ServiceSettings = ServiceSettings::figment().extract()?;
            assert_eq!(settings.config_file, PathBuf::from("/srv/boot.yaml"));
            assert_eq!(settings.log_format, "pretty");
            assert_eq!(settings.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        let figment = ServiceSettings::figment().merge(Serialized::default("log_format", "xml"));
        let err = ServiceSettings::from_figment(figment).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                field: "log_format".to_string(),
                value: "xml".to_string(),
            }
        );
    }
}
