use std::sync::Arc;

use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::db::queries;
use crate::db::queries::slowmodes::SanitizeReport;
use crate::engine::checker::{self, Verdict};
use crate::engine::events::{Action, GatewayEvent, MessageEvent};
use crate::engine::platform::PlatformDirectory;
use crate::engine::slowmode::SlowmodeConfig;
use crate::error::SlowmodeError;

/// The slowmode engine: receives gateway events, applies the channel's
/// slowmode rule, and keeps the store consistent. The store is the single
/// source of truth — every check reads, evaluates, and writes back the
/// row rather than caching state across events.
pub struct SlowmodeEngine {
    db: SqlitePool,
    /// Per-channel locks serializing the check-then-write of the message
    /// path, so two near-simultaneous messages from one user cannot both
    /// read "allowed" before either write lands.
    channel_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SlowmodeEngine {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            channel_locks: DashMap::new(),
        }
    }

    fn channel_lock(&self, channel_id: &str) -> Arc<Mutex<()>> {
        self.channel_locks
            .entry(channel_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Dispatch one gateway event. Returns the outbound action, if any.
    pub async fn handle_event(
        &self,
        event: &GatewayEvent,
    ) -> Result<Option<Action>, SlowmodeError> {
        match event {
            GatewayEvent::Message(message) => self.handle_message(message).await,
            GatewayEvent::ChannelDeleted { channel_id } => {
                self.handle_channel_deleted(channel_id).await?;
                Ok(None)
            }
            GatewayEvent::ServerDeleted { server_id } => {
                self.handle_server_deleted(server_id).await?;
                Ok(None)
            }
            GatewayEvent::Startup {
                live_server_ids,
                live_channel_ids,
            } => {
                let now_ms = chrono::Utc::now().timestamp_millis();
                let report =
                    queries::slowmodes::sanitize(&self.db, live_server_ids, live_channel_ids, now_ms)
                        .await?;
                info!(
                    deleted = report.deleted_channels,
                    expired = report.expired_cooldowns,
                    "startup sanitization complete"
                );
                Ok(None)
            }
        }
    }

    /// Check one message against its channel's slowmode. On ALLOW the
    /// author's timestamp is recorded and the row written back; on
    /// VIOLATION a delete instruction is returned and nothing is written.
    pub async fn handle_message(
        &self,
        message: &MessageEvent,
    ) -> Result<Option<Action>, SlowmodeError> {
        // Channels without a slowmode never get a lock entry; the lock
        // registry only ever holds channels with a stored rule.
        if queries::slowmodes::get_channel(&self.db, &message.channel_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let lock = self.channel_lock(&message.channel_id);
        let _guard = lock.lock().await;

        // Re-read under the lock: the config may have changed or been
        // removed between the existence check and acquisition.
        let Some(mut config) = queries::slowmodes::get_channel(&self.db, &message.channel_id).await?
        else {
            return Ok(None);
        };

        let member = message.author_ref();
        match checker::check(&member, message, &config) {
            Verdict::Allow => {
                config.record_message(&message.author_id, message.timestamp_ms);
                queries::slowmodes::set_channel(&self.db, &config).await?;
                Ok(None)
            }
            Verdict::Violation => {
                debug!(
                    channel_id = %message.channel_id,
                    author_id = %message.author_id,
                    "message violated slowmode"
                );
                Ok(Some(Action::DeleteMessage {
                    message_id: message.message_id.clone(),
                }))
            }
            Verdict::NotApplicable => Ok(None),
        }
    }

    /// Drop the stored slowmode for a deleted channel.
    pub async fn handle_channel_deleted(&self, channel_id: &str) -> Result<(), SlowmodeError> {
        queries::slowmodes::remove_channel(&self.db, channel_id).await?;
        self.channel_locks.remove(channel_id);
        Ok(())
    }

    /// Drop every stored slowmode for a deleted server, along with the
    /// lock entries its channels held.
    pub async fn handle_server_deleted(&self, server_id: &str) -> Result<(), SlowmodeError> {
        let channel_ids = queries::slowmodes::list_channel_ids(&self.db, server_id).await?;
        let removed = queries::slowmodes::remove_server(&self.db, server_id).await?;
        for channel_id in &channel_ids {
            self.channel_locks.remove(channel_id);
        }
        if removed > 0 {
            info!(%server_id, removed, "removed slowmodes for deleted server");
        }
        Ok(())
    }

    // ── Config-mutation entrypoints (command layer) ─────────────────

    /// Create or wholesale-replace a channel's slowmode. Every referenced
    /// user and role is verified through the platform directory before
    /// anything is written; the first failed or negative lookup rejects
    /// the whole mutation.
    pub async fn create_or_replace_slowmode(
        &self,
        config: SlowmodeConfig,
        directory: &dyn PlatformDirectory,
    ) -> Result<(), SlowmodeError> {
        for user_id in config.user_includes().iter().chain(config.user_excludes()) {
            if !directory.user_exists(config.server_id(), user_id).await? {
                return Err(SlowmodeError::InvalidConfig(format!(
                    "unknown user {user_id} in server {}",
                    config.server_id()
                )));
            }
        }
        for role_id in config.role_includes().iter().chain(config.role_excludes()) {
            if !directory.role_exists(config.server_id(), role_id).await? {
                return Err(SlowmodeError::InvalidConfig(format!(
                    "unknown role {role_id} in server {}",
                    config.server_id()
                )));
            }
        }

        let lock = self.channel_lock(config.channel_id());
        let _guard = lock.lock().await;
        queries::slowmodes::set_channel(&self.db, &config).await?;
        info!(
            channel_id = %config.channel_id(),
            interval = config.interval_seconds(),
            scope = config.scope().as_str(),
            "slowmode set"
        );
        Ok(())
    }

    /// Remove a channel's slowmode. Returns false if none existed.
    pub async fn remove_slowmode(&self, channel_id: &str) -> Result<bool, SlowmodeError> {
        let removed = {
            let lock = self.channel_lock(channel_id);
            let _guard = lock.lock().await;
            queries::slowmodes::remove_channel(&self.db, channel_id).await?
        };
        self.channel_locks.remove(channel_id);
        if removed {
            info!(%channel_id, "slowmode removed");
        }
        Ok(removed)
    }

    /// Clear the listed users' cooldown entries for a channel, or all
    /// entries when the list is empty. The rule set is never altered.
    /// Returns entries cleared, or `None` if the channel has no slowmode.
    pub async fn reset_cooldowns(
        &self,
        channel_id: &str,
        user_ids: &[String],
    ) -> Result<Option<usize>, SlowmodeError> {
        let cleared = {
            let lock = self.channel_lock(channel_id);
            let _guard = lock.lock().await;
            queries::slowmodes::reset_cooldowns(&self.db, channel_id, user_ids).await?
        };
        if cleared.is_none() {
            // No slowmode to serialize against; drop the entry again.
            self.channel_locks.remove(channel_id);
        }
        Ok(cleared)
    }

    /// Read a channel's current slowmode, if any.
    pub async fn status(&self, channel_id: &str) -> Result<Option<SlowmodeConfig>, SlowmodeError> {
        queries::slowmodes::get_channel(&self.db, channel_id).await
    }

    /// Run a sanitization pass against the given live set.
    pub async fn sanitize(
        &self,
        live_server_ids: &[String],
        live_channel_ids: &[String],
    ) -> Result<SanitizeReport, SlowmodeError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        queries::slowmodes::sanitize(&self.db, live_server_ids, live_channel_ids, now_ms).await
    }
}
