//! Observability configuration parsing from environment variables.
//!
//! This module handles log output and stats reporting settings. The level filter itself comes
//! from `RUST_LOG` and is read by the subscriber directly.

use std::str::FromStr;

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid LOG_FORMAT: {}. Must be 'pretty' or 'json'", s),
        }
    }
}

/// Observability environment configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservabilityEnvConfig {
    pub log_format: LogFormat,
    /// Seconds between listener stats reports; 0 disables reporting
    pub stats_interval_secs: u64,
}

impl ObservabilityEnvConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_format: lookup("LOG_FORMAT")
                .and_then(|v| v.parse::<LogFormat>().ok())
                .unwrap_or_default(),
            stats_interval_secs: lookup("STATS_INTERVAL_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0),
        }
    }
}
