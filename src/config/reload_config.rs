//! Reload action configuration parsing from environment variables.

use anyhow::Result;
use std::str::FromStr;

/// How a page reload is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMode {
    Log,
    Command,
    Webhook,
}

impl FromStr for ReloadMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" | "dry-run" => Ok(ReloadMode::Log),
            "command" => Ok(ReloadMode::Command),
            "webhook" => Ok(ReloadMode::Webhook),
            _ => anyhow::bail!(
                "Invalid RELOAD_MODE: {}. Must be 'log', 'command', or 'webhook'",
                s
            ),
        }
    }
}

impl std::fmt::Display for ReloadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReloadMode::Log => write!(f, "log"),
            ReloadMode::Command => write!(f, "command"),
            ReloadMode::Webhook => write!(f, "webhook"),
        }
    }
}

/// Reload environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadEnvConfig {
    pub mode: ReloadMode,
    pub command: Option<String>,
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ReloadEnvConfig {
    fn default() -> Self {
        Self {
            mode: ReloadMode::Log,
            command: None,
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

impl ReloadEnvConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mode = match lookup("RELOAD_MODE") {
            Some(mode) => mode.parse::<ReloadMode>()?,
            None => ReloadMode::Log,
        };

        Ok(Self {
            mode,
            command: lookup("RELOAD_COMMAND").filter(|c| !c.trim().is_empty()),
            webhook_url: lookup("RELOAD_WEBHOOK_URL").filter(|u| !u.trim().is_empty()),
            timeout_secs: lookup("RELOAD_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        })
    }
}
