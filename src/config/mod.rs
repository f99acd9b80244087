//! Configuration module for pushreload.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Transport, Reload, and Observability.

mod observability_config;
mod reload_config;
mod transport_config;

pub use observability_config::{LogFormat, ObservabilityEnvConfig};
pub use reload_config::{ReloadEnvConfig, ReloadMode};
pub use transport_config::TransportEnvConfig;

use crate::domain::errors::ConfigError;
use anyhow::Result;
use std::env;

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub transport: TransportEnvConfig,
    pub reload: ReloadEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Self {
            transport: TransportEnvConfig::from_lookup(&lookup),
            reload: ReloadEnvConfig::from_lookup(&lookup)?,
            observability: ObservabilityEnvConfig::from_lookup(&lookup),
        };
        Ok(config)
    }

    /// Checks cross-field requirements that individual parsers cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.reload.mode {
            ReloadMode::Command if self.reload.command.is_none() => {
                return Err(ConfigError::Missing {
                    key: "RELOAD_COMMAND",
                    mode: self.reload.mode.to_string(),
                });
            }
            ReloadMode::Webhook if self.reload.webhook_url.is_none() => {
                return Err(ConfigError::Missing {
                    key: "RELOAD_WEBHOOK_URL",
                    mode: self.reload.mode.to_string(),
                });
            }
            _ => {}
        }

        if self.transport.update_event.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "UPDATE_EVENT",
                reason: "event name must not be empty".to_string(),
            });
        }

        self.transport
            .socketio_options()
            .map_err(|e| ConfigError::Invalid {
                key: "PAGE_URL",
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_command_mode_requires_command() {
        let config = Config::from_lookup(|key| match key {
            "RELOAD_MODE" => Some("command".to_string()),
            _ => None,
        })
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "RELOAD_COMMAND", .. }));
    }

    #[test]
    fn test_webhook_mode_requires_url() {
        let config = Config::from_lookup(|key| match key {
            "RELOAD_MODE" => Some("webhook".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_reload_mode_fails_to_load() {
        let result = Config::from_lookup(|key| match key {
            "RELOAD_MODE" => Some("teleport".to_string()),
            _ => None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_page_url_fails_validation() {
        let config = Config::from_lookup(|key| match key {
            "PAGE_URL" => Some("kiosk".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "PAGE_URL", .. })
        ));
    }
}
