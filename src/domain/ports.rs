use crate::domain::errors::{ReloadError, TransportError};
use crate::domain::events::{TransportEvent, UpdateNotice};
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

/// Real-time channel to the page origin.
///
/// The transport owns the connection and its retry policy. Events arrive on
/// the returned receiver in causal order; the receiver closes when the
/// transport gives up or is shut down.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(&self) -> Result<Receiver<TransportEvent>, TransportError>;
    async fn shutdown(&self);
}

/// The side effect of an update: reload the page.
#[async_trait]
pub trait PageReloader: Send + Sync {
    async fn reload(&self, notice: &UpdateNotice) -> Result<(), ReloadError>;

    /// Short label for log lines.
    fn name(&self) -> &'static str;
}
