//! pushreload - reloads a page whenever its server pushes an update
//!
//! Connects to the Socket.IO endpoint of the page's own origin and runs the
//! configured reload action on every `update` event.
//!
//! # Usage
//! ```sh
//! PAGE_URL=https://kiosk.local:5001/dashboard \
//! RELOAD_MODE=command RELOAD_COMMAND="pkill -HUP chromium" \
//! cargo run -- --insecure
//! ```
//!
//! # Environment Variables
//! - `PAGE_URL` - Page whose origin serves the push channel (default: https://localhost:5001/)
//! - `RELOAD_MODE` - `log`, `command` or `webhook` (default: log)
//! - `LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `STATS_INTERVAL_SECS` - Interval between JSON stats lines, 0 to disable (default: 0)

use anyhow::Result;
use clap::Parser;
use pushreload::application::Application;
use pushreload::config::{Config, ReloadMode};
use pushreload::infrastructure::observability::init_tracing;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Reload a page when its server pushes an update", long_about = None)]
struct Cli {
    /// Page URL; the push channel uses the same scheme, host and port
    #[arg(long)]
    page_url: Option<String>,

    /// Socket.IO namespace to join
    #[arg(long)]
    namespace: Option<String>,

    /// Event name that triggers a reload
    #[arg(long)]
    event: Option<String>,

    /// Shell command to run on every update
    #[arg(long, conflicts_with = "webhook_url")]
    reload_command: Option<String>,

    /// URL to POST to on every update
    #[arg(long)]
    webhook_url: Option<String>,

    /// Only log reloads
    #[arg(long, conflicts_with_all = ["reload_command", "webhook_url"])]
    dry_run: bool,

    /// Accept self-signed TLS certificates
    #[arg(long)]
    insecure: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(page_url) = self.page_url {
            config.transport.page_url = page_url;
        }
        if let Some(namespace) = self.namespace {
            config.transport.namespace = if namespace.starts_with('/') {
                namespace
            } else {
                format!("/{}", namespace)
            };
        }
        if let Some(event) = self.event {
            config.transport.update_event = event;
        }
        if self.insecure {
            config.transport.accept_invalid_certs = true;
        }
        if let Some(command) = self.reload_command {
            config.reload.mode = ReloadMode::Command;
            config.reload.command = Some(command);
        }
        if let Some(url) = self.webhook_url {
            config.reload.mode = ReloadMode::Webhook;
            config.reload.webhook_url = Some(url);
        }
        if self.dry_run {
            config.reload.mode = ReloadMode::Log;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply(&mut config);

    init_tracing(config.observability.log_format);

    info!("pushreload {} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Page: {} | Event: '{}' | Reload: {}",
        config.transport.page_url, config.transport.update_event, config.reload.mode
    );

    let app = Application::build(config)?;
    let handle = app.start().await?;
    info!("Listening for updates. Press Ctrl+C to stop.");

    let stats = handle
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    info!(
        "Stopped after {} updates ({} reloads, {} failed)",
        stats.updates, stats.reloads, stats.failed_reloads
    );

    Ok(())
}
