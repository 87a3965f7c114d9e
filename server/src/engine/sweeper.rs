use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::db::queries;
use crate::db::queries::slowmodes::SanitizeReport;
use crate::engine::platform::PlatformDirectory;
use crate::error::SlowmodeError;

/// Orchestrates sanitization sweeps: fetch the live server/channel set
/// from the platform, hand it to the persistence layer, report counts.
/// Carries no business rules of its own.
pub struct SanitizationSweeper {
    db: SqlitePool,
    directory: Arc<dyn PlatformDirectory>,
}

impl SanitizationSweeper {
    pub fn new(db: SqlitePool, directory: Arc<dyn PlatformDirectory>) -> Self {
        Self { db, directory }
    }

    /// Run one sweep against the platform's current live set.
    pub async fn run_once(&self) -> Result<SanitizeReport, SlowmodeError> {
        let live = self.directory.live_set().await?;
        let report = queries::slowmodes::sanitize(
            &self.db,
            &live.server_ids,
            &live.channel_ids,
            Utc::now().timestamp_millis(),
        )
        .await?;
        info!(
            deleted = report.deleted_channels,
            expired = report.expired_cooldowns,
            "sanitization sweep complete"
        );
        Ok(report)
    }

    /// Sweep on an interval until `shutdown` is cancelled. The first tick
    /// fires immediately, covering the startup sweep. A failed platform
    /// lookup skips that pass; a persistence error is returned so the
    /// caller can shut the process down.
    pub async fn run_periodic(
        &self,
        every: Duration,
        shutdown: CancellationToken,
    ) -> Result<(), SlowmodeError> {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("sanitization sweeper shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(_) => {}
                        Err(SlowmodeError::PlatformLookup(reason)) => {
                            warn!(%reason, "live set unavailable, skipping sweep");
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }
    }
}
