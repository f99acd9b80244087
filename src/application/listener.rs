use crate::domain::connection::{ConnectionState, ListenerStats};
use crate::domain::errors::TransportError;
use crate::domain::events::{DisconnectReason, ServerEvent, TransportEvent, UpdateNotice};
use crate::domain::ports::{PageReloader, PushTransport};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Bridges server-pushed update notifications to a page reload.
///
/// Handles three events: connect (log), update (log, then reload), and
/// disconnect (log). Every update received while connected reloads exactly
/// once; nothing is filtered, deduplicated or debounced. Retrying the
/// connection is the transport's job.
pub struct PushUpdateListener {
    reloader: Arc<dyn PageReloader>,
    update_event: String,
    state: ConnectionState,
    stats: ListenerStats,
    state_tx: watch::Sender<ConnectionState>,
    stats_tx: watch::Sender<ListenerStats>,
}

impl PushUpdateListener {
    pub fn new(reloader: Arc<dyn PageReloader>, update_event: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (stats_tx, _) = watch::channel(ListenerStats::default());

        Self {
            reloader,
            update_event: update_event.into(),
            state: ConnectionState::Disconnected,
            stats: ListenerStats::default(),
            state_tx,
            stats_tx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn stats(&self) -> ListenerStats {
        self.stats
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn watch_stats(&self) -> watch::Receiver<ListenerStats> {
        self.stats_tx.subscribe()
    }

    /// Connects through `transport` and handles events until it stops.
    pub async fn listen(self, transport: &dyn PushTransport) -> Result<ListenerStats, TransportError> {
        let events = transport.connect().await?;
        Ok(self.run(events).await)
    }

    /// Handles events in arrival order until the channel closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<TransportEvent>) -> ListenerStats {
        debug!(
            "PushUpdateListener: Waiting for '{}' events (reloader: {})",
            self.update_event,
            self.reloader.name()
        );

        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }

        debug!("PushUpdateListener: Transport closed the event stream");
        if self.state.is_connected() {
            self.set_state(ConnectionState::Disconnected);
        }
        self.stats
    }

    pub async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected { sid } => self.on_connect(sid),
            TransportEvent::Event(event) => self.on_server_event(event).await,
            TransportEvent::Disconnected { reason } => self.on_disconnect(reason),
        }
    }

    fn on_connect(&mut self, sid: Option<String>) {
        info!("WebSocket connected");
        if let Some(sid) = sid {
            debug!("PushUpdateListener: Session id {}", sid);
        }

        self.stats.connects += 1;
        self.set_state(ConnectionState::Connected);
        self.publish_stats();
    }

    async fn on_server_event(&mut self, event: ServerEvent) {
        if event.name != self.update_event {
            debug!("PushUpdateListener: Ignoring event '{}'", event.name);
            self.stats.ignored_events += 1;
            self.publish_stats();
            return;
        }

        if !self.state.is_connected() {
            warn!("PushUpdateListener: Update arrived while disconnected, ignoring");
            self.stats.ignored_events += 1;
            self.publish_stats();
            return;
        }

        let notice = UpdateNotice::from_payload(event.payload);
        self.on_update(&notice).await;
    }

    async fn on_update(&mut self, notice: &UpdateNotice) {
        info!("Update received: {}", notice.display_message());
        self.stats.updates += 1;

        match self.reloader.reload(notice).await {
            Ok(()) => {
                self.stats.reloads += 1;
            }
            Err(e) => {
                error!("PushUpdateListener: {} reload failed: {}", self.reloader.name(), e);
                self.stats.failed_reloads += 1;
            }
        }
        self.publish_stats();
    }

    fn on_disconnect(&mut self, reason: DisconnectReason) {
        info!("WebSocket disconnected ({})", reason);

        self.stats.disconnects += 1;
        self.set_state(ConnectionState::Disconnected);
        self.publish_stats();
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.state_tx.send_replace(state);
    }

    fn publish_stats(&self) {
        self.stats_tx.send_replace(self.stats);
    }
}
