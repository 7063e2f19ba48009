//! Periodic rotation of per-check audit logs.
//!
//! A pass runs at startup and then once per interval (daily by default).
//! Every live log with content is compressed into an archive and truncated;
//! a failure on one file is logged and does not stop the others.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::audit::{AuditLog, Rotation};

/// Counts from one rotation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationSummary {
    pub rotated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Rotation manager for per-check logs
pub struct LogRotator {
    audit: Arc<AuditLog>,
    interval: Duration,
}

impl LogRotator {
    pub fn new(audit: Arc<AuditLog>, interval: Duration) -> Self {
        Self { audit, interval }
    }

    /// Rotate every live log once
    pub async fn rotate_all(&self) -> RotationSummary {
        let mut summary = RotationSummary::default();

        let ids = match self.audit.list(false).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Could not list logs to rotate: {}", e);
                return summary;
            }
        };

        let rotated_at = chrono::Utc::now().timestamp_millis();
        for id in ids {
            match self.audit.rotate(&id, rotated_at).await {
                Ok(Rotation::Archived(archive)) => {
                    debug!(check_id = %id, archive = %archive, "Log archived");
                    summary.rotated += 1;
                }
                Ok(Rotation::Empty) => summary.skipped += 1,
                Err(e) => {
                    warn!(check_id = %id, "Failed to rotate log: {}", e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Log rotation completed: {} rotated, {} empty, {} failed",
            summary.rotated, summary.skipped, summary.failed
        );
        summary
    }

    /// Start background rotation (now, then every interval)
    pub fn start_periodic_rotation(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;
                self.rotate_all().await;
            }
        })
    }
}
