use crate::domain::errors::ReloadError;
use crate::domain::events::UpdateNotice;
use crate::domain::ports::PageReloader;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;
use tracing::debug;

/// Environment variable carrying the update message to the child process
pub const MESSAGE_ENV: &str = "PUSH_UPDATE_MESSAGE";
/// Environment variable carrying the raw JSON payload
pub const PAYLOAD_ENV: &str = "PUSH_UPDATE_PAYLOAD";

/// Reloads by running an external command, e.g. a kiosk browser refresh.
#[derive(Debug, Clone)]
pub struct CommandReloader {
    program: String,
    args: Vec<String>,
    display: String,
    timeout: Duration,
}

impl CommandReloader {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        let program = program.into();
        let display = std::iter::once(program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            program,
            args,
            display,
            timeout,
        }
    }

    /// Runs `line` through the platform shell.
    pub fn from_shell(line: &str, timeout: Duration) -> Self {
        let mut reloader = if cfg!(windows) {
            Self::new("cmd", vec!["/C".to_string(), line.to_string()], timeout)
        } else {
            Self::new("sh", vec!["-c".to_string(), line.to_string()], timeout)
        };
        reloader.display = line.to_string();
        reloader
    }

    pub fn command_line(&self) -> &str {
        &self.display
    }
}

#[async_trait]
impl PageReloader for CommandReloader {
    async fn reload(&self, notice: &UpdateNotice) -> Result<(), ReloadError> {
        debug!("CommandReloader: Running '{}'", self.display);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env(MESSAGE_ENV, notice.message.as_deref().unwrap_or_default())
            .env(PAYLOAD_ENV, notice.payload.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let status = time::timeout(self.timeout, cmd.status())
            .await
            .map_err(|_| ReloadError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ReloadError::Spawn {
                command: self.display.clone(),
                reason: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ReloadError::CommandFailed {
                command: self.display.clone(),
                status: status.to_string(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
