pub mod broadcast;
pub mod command;
pub mod log;
pub mod webhook;

pub use broadcast::{BroadcastReloader, ReloadRequest};
pub use command::CommandReloader;
pub use log::LogReloader;
pub use webhook::WebhookReloader;

use crate::config::{ReloadEnvConfig, ReloadMode};
use crate::domain::errors::ConfigError;
use crate::domain::ports::PageReloader;
use std::sync::Arc;
use std::time::Duration;

pub struct ReloaderFactory;

impl ReloaderFactory {
    pub fn create(config: &ReloadEnvConfig) -> Result<Arc<dyn PageReloader>, ConfigError> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));

        match config.mode {
            ReloadMode::Log => Ok(Arc::new(LogReloader)),
            ReloadMode::Command => {
                let line = config.command.as_deref().ok_or(ConfigError::Missing {
                    key: "RELOAD_COMMAND",
                    mode: config.mode.to_string(),
                })?;
                Ok(Arc::new(CommandReloader::from_shell(line, timeout)))
            }
            ReloadMode::Webhook => {
                let url = config.webhook_url.as_deref().ok_or(ConfigError::Missing {
                    key: "RELOAD_WEBHOOK_URL",
                    mode: config.mode.to_string(),
                })?;
                url::Url::parse(url).map_err(|e| ConfigError::Invalid {
                    key: "RELOAD_WEBHOOK_URL",
                    reason: e.to_string(),
                })?;
                Ok(Arc::new(WebhookReloader::new(url, timeout)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_builds_configured_reloader() {
        let log = ReloaderFactory::create(&ReloadEnvConfig::default()).unwrap();
        assert_eq!(log.name(), "log");

        let command = ReloaderFactory::create(&ReloadEnvConfig {
            mode: ReloadMode::Command,
            command: Some("true".to_string()),
            ..ReloadEnvConfig::default()
        })
        .unwrap();
        assert_eq!(command.name(), "command");
    }

    #[test]
    fn test_factory_rejects_incomplete_config() {
        let missing = ReloaderFactory::create(&ReloadEnvConfig {
            mode: ReloadMode::Webhook,
            ..ReloadEnvConfig::default()
        });
        assert!(matches!(missing, Err(ConfigError::Missing { .. })));

        let invalid = ReloaderFactory::create(&ReloadEnvConfig {
            mode: ReloadMode::Webhook,
            webhook_url: Some("not a url".to_string()),
            ..ReloadEnvConfig::default()
        });
        assert!(matches!(invalid, Err(ConfigError::Invalid { .. })));
    }
}
