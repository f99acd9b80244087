use crate::domain::errors::ReloadError;
use crate::domain::events::UpdateNotice;
use crate::domain::ports::PageReloader;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Reload request published to in-process subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadRequest {
    pub message: Option<String>,
    pub payload: serde_json::Value,
    pub requested_at: DateTime<Utc>,
}

/// Reloader for embedding applications: each reload becomes a broadcast
/// message that the host UI reacts to.
pub struct BroadcastReloader {
    tx: broadcast::Sender<ReloadRequest>,
}

impl BroadcastReloader {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadRequest> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl PageReloader for BroadcastReloader {
    async fn reload(&self, notice: &UpdateNotice) -> Result<(), ReloadError> {
        let request = ReloadRequest {
            message: notice.message.clone(),
            payload: notice.payload.clone(),
            requested_at: Utc::now(),
        };

        self.tx
            .send(request)
            .map(|_| ())
            .map_err(|_| ReloadError::NoSubscribers)
    }

    fn name(&self) -> &'static str {
        "broadcast"
    }
}
