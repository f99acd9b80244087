use crate::application::listener::PushUpdateListener;
use crate::config::Config;
use crate::domain::connection::{ConnectionState, ListenerStats};
use crate::domain::ports::{PageReloader, PushTransport};
use crate::infrastructure::observability::StatsReporter;
use crate::infrastructure::{ReloaderFactory, SocketIoTransport};
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Wires the transport, the reloader and the listener together.
pub struct Application {
    config: Config,
    transport: Arc<dyn PushTransport>,
    reloader: Arc<dyn PageReloader>,
}

impl Application {
    pub fn build(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let options = config
            .transport
            .socketio_options()
            .context("Failed to derive Socket.IO endpoint")?;
        let transport = SocketIoTransport::new(options);
        info!("Push endpoint: {}", transport.endpoint());
        let transport: Arc<dyn PushTransport> = Arc::new(transport);
        let reloader =
            ReloaderFactory::create(&config.reload).context("Failed to create reloader")?;
        info!("Reload action: {}", reloader.name());

        Ok(Self::with_components(config, transport, reloader))
    }

    /// Builds an application around caller-provided components.
    pub fn with_components(
        config: Config,
        transport: Arc<dyn PushTransport>,
        reloader: Arc<dyn PageReloader>,
    ) -> Self {
        Self {
            config,
            transport,
            reloader,
        }
    }

    pub async fn start(self) -> Result<ApplicationHandle> {
        let listener =
            PushUpdateListener::new(self.reloader, self.config.transport.update_event.clone());
        let stats = listener.watch_stats();
        let state = listener.watch_state();

        let events = self
            .transport
            .connect()
            .await
            .context("Failed to start push transport")?;
        let listener_task = tokio::spawn(listener.run(events));

        let interval = self.config.observability.stats_interval_secs;
        let reporter_task = (interval > 0).then(|| {
            let reporter = StatsReporter::new(stats.clone(), state.clone(), interval);
            tokio::spawn(reporter.run())
        });

        Ok(ApplicationHandle {
            transport: self.transport,
            listener_task,
            reporter_task,
            stats,
            state,
        })
    }
}

pub struct ApplicationHandle {
    transport: Arc<dyn PushTransport>,
    listener_task: JoinHandle<ListenerStats>,
    reporter_task: Option<JoinHandle<()>>,
    stats: watch::Receiver<ListenerStats>,
    state: watch::Receiver<ConnectionState>,
}

impl ApplicationHandle {
    pub fn stats(&self) -> ListenerStats {
        *self.stats.borrow()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Runs until `shutdown` resolves or the transport gives up.
    pub async fn run_until<F>(self, shutdown: F) -> ListenerStats
    where
        F: Future<Output = ()>,
    {
        let ApplicationHandle {
            transport,
            mut listener_task,
            reporter_task,
            stats,
            ..
        } = self;

        let result = tokio::select! {
            result = &mut listener_task => {
                info!("Listener stopped: transport closed the event stream");
                result
            }
            _ = shutdown => {
                info!("Shutdown requested, closing push transport...");
                transport.shutdown().await;
                listener_task.await
            }
        };

        if let Some(reporter) = reporter_task {
            reporter.abort();
        }

        result.unwrap_or_else(|e| {
            error!("Listener task failed: {}", e);
            *stats.borrow()
        })
    }

    pub async fn shutdown(self) -> ListenerStats {
        self.run_until(std::future::ready(())).await
    }
}
