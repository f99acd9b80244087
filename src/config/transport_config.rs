//! Transport configuration parsing from environment variables.
//!
//! This module handles where the listener connects and how the Socket.IO
//! client retries.

use crate::domain::errors::TransportError;
use crate::infrastructure::socketio::{ReconnectPolicy, SocketIoOptions, websocket_url};
use std::time::Duration;

/// Push transport environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TransportEnvConfig {
    /// URL of the page whose origin serves the Socket.IO endpoint
    pub page_url: String,
    pub socketio_path: String,
    pub namespace: String,
    pub update_event: String,
    pub connect_timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub reconnect_delay_ms: u64,
    pub reconnect_delay_max_ms: u64,
    pub reconnect_randomization: f64,
    /// 0 retries forever
    pub reconnect_attempts: u32,
}

impl Default for TransportEnvConfig {
    fn default() -> Self {
        Self {
            page_url: "https://localhost:5001/".to_string(),
            socketio_path: "socket.io".to_string(),
            namespace: "/".to_string(),
            update_event: "update".to_string(),
            connect_timeout_secs: 20,
            accept_invalid_certs: false,
            reconnect_delay_ms: 1000,
            reconnect_delay_max_ms: 5000,
            reconnect_randomization: 0.5,
            reconnect_attempts: 0,
        }
    }
}

impl TransportEnvConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let namespace = lookup("SOCKETIO_NAMESPACE").unwrap_or(defaults.namespace);
        let namespace = if namespace.starts_with('/') {
            namespace
        } else {
            format!("/{}", namespace)
        };

        Self {
            page_url: lookup("PAGE_URL").unwrap_or(defaults.page_url),
            socketio_path: lookup("SOCKETIO_PATH").unwrap_or(defaults.socketio_path),
            namespace,
            update_event: lookup("UPDATE_EVENT").unwrap_or(defaults.update_event),
            connect_timeout_secs: lookup("CONNECT_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.connect_timeout_secs),
            accept_invalid_certs: lookup("ACCEPT_INVALID_CERTS")
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(defaults.accept_invalid_certs),
            reconnect_delay_ms: lookup("RECONNECT_DELAY_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.reconnect_delay_ms),
            reconnect_delay_max_ms: lookup("RECONNECT_DELAY_MAX_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.reconnect_delay_max_ms),
            reconnect_randomization: lookup("RECONNECT_RANDOMIZATION")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|f| (0.0..=1.0).contains(f))
                .unwrap_or(defaults.reconnect_randomization),
            reconnect_attempts: lookup("RECONNECT_ATTEMPTS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.reconnect_attempts),
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_millis(self.reconnect_delay_ms),
            delay_max: Duration::from_millis(self.reconnect_delay_max_ms.max(self.reconnect_delay_ms)),
            randomization_factor: self.reconnect_randomization,
            max_attempts: (self.reconnect_attempts > 0).then_some(self.reconnect_attempts),
        }
    }

    pub fn socketio_options(&self) -> Result<SocketIoOptions, TransportError> {
        Ok(SocketIoOptions {
            endpoint: websocket_url(&self.page_url, &self.socketio_path)?,
            namespace: self.namespace.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            accept_invalid_certs: self.accept_invalid_certs,
            reconnect: self.reconnect_policy(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_transport_config_defaults() {
        let config = TransportEnvConfig::from_lookup(lookup(&[]));
        assert_eq!(config, TransportEnvConfig::default());
        assert_eq!(config.reconnect_policy().max_attempts, None);
    }

    #[test]
    fn test_transport_config_overrides() {
        let config = TransportEnvConfig::from_lookup(lookup(&[
            ("PAGE_URL", "http://kiosk:5001/dashboard"),
            ("SOCKETIO_NAMESPACE", "dashboard"),
            ("RECONNECT_ATTEMPTS", "3"),
            ("ACCEPT_INVALID_CERTS", "true"),
        ]));

        assert_eq!(config.namespace, "/dashboard");
        assert!(config.accept_invalid_certs);
        assert_eq!(config.reconnect_policy().max_attempts, Some(3));

        let options = config.socketio_options().unwrap();
        assert_eq!(
            options.endpoint.as_str(),
            "ws://kiosk:5001/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let config = TransportEnvConfig::from_lookup(lookup(&[
            ("RECONNECT_DELAY_MS", "soon"),
            ("RECONNECT_RANDOMIZATION", "3.5"),
        ]));
        assert_eq!(config.reconnect_delay_ms, 1000);
        assert_eq!(config.reconnect_randomization, 0.5);
    }

    #[test]
    fn test_bad_page_url_is_rejected() {
        let config = TransportEnvConfig::from_lookup(lookup(&[("PAGE_URL", "ftp://host/")]));
        assert!(config.socketio_options().is_err());
    }
}
