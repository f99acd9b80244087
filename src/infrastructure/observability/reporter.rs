//! Push-based stats reporter
//!
//! Periodically outputs listener counters as structured JSON to stdout.

use crate::domain::connection::{ConnectionState, ListenerStats};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

/// Stats snapshot for JSON output
#[derive(Debug, Serialize)]
pub struct StatsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub connected: bool,
    pub stats: ListenerStats,
}

pub struct StatsReporter {
    stats: watch::Receiver<ListenerStats>,
    state: watch::Receiver<ConnectionState>,
    start_time: Instant,
    interval: Duration,
}

impl StatsReporter {
    pub fn new(
        stats: watch::Receiver<ListenerStats>,
        state: watch::Receiver<ConnectionState>,
        interval_seconds: u64,
    ) -> Self {
        Self {
            stats,
            state,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Run the reporter in a loop, outputting stats periodically
    pub async fn run(self) {
        info!(
            "StatsReporter: Starting (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            let snapshot = self.collect_snapshot();
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    // Prefix so logs can be easily filtered
                    println!("STATS_JSON:{}", json);
                    info!(
                        "Connected: {} | Updates: {} | Reloads: {} ({} failed) | Uptime: {}s",
                        snapshot.connected,
                        snapshot.stats.updates,
                        snapshot.stats.reloads,
                        snapshot.stats.failed_reloads,
                        snapshot.uptime_seconds
                    );
                }
                Err(e) => warn!("Failed to serialize stats: {}", e),
            }
        }
    }

    pub fn collect_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            connected: self.state.borrow().is_connected(),
            stats: *self.stats.borrow(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_latest_stats() {
        let (stats_tx, stats_rx) = watch::channel(ListenerStats::default());
        let (_state_tx, state_rx) = watch::channel(ConnectionState::Connected);
        let reporter = StatsReporter::new(stats_rx, state_rx, 60);

        stats_tx.send_modify(|s| {
            s.updates = 4;
            s.reloads = 3;
            s.failed_reloads = 1;
        });

        let snapshot = reporter.collect_snapshot();
        assert!(snapshot.connected);
        assert_eq!(snapshot.stats.updates, 4);
        assert!(!snapshot.timestamp.is_empty());
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = StatsSnapshot {
            timestamp: "2026-01-10T10:00:00Z".to_string(),
            uptime_seconds: 3600,
            version: "0.3.1".to_string(),
            connected: false,
            stats: ListenerStats {
                connects: 2,
                disconnects: 2,
                updates: 120,
                reloads: 120,
                ..ListenerStats::default()
            },
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"uptime_seconds\":3600"));
        assert!(json.contains("\"reloads\":120"));
    }
}
