use sqlx::SqlitePool;
use tracing::debug;

use crate::db::models::{SlowmodeRow, encode_columns};
use crate::engine::slowmode::SlowmodeConfig;
use crate::error::SlowmodeError;

/// Counts reported by a sanitization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub deleted_channels: u64,
    pub expired_cooldowns: u64,
}

/// Get the slowmode for a channel, or `None` if it has none.
pub async fn get_channel(
    pool: &SqlitePool,
    channel_id: &str,
) -> Result<Option<SlowmodeConfig>, SlowmodeError> {
    let row = sqlx::query_as::<_, SlowmodeRow>("SELECT * FROM slowmodes WHERE channel_id = ?")
        .bind(channel_id)
        .fetch_optional(pool)
        .await?;
    row.map(SlowmodeRow::decode).transpose()
}

/// Upsert the full record for a channel: rule set and cooldown map together.
pub async fn set_channel(pool: &SqlitePool, config: &SlowmodeConfig) -> Result<(), SlowmodeError> {
    let (scope, user_includes, user_excludes, role_includes, role_excludes, cooldowns) =
        encode_columns(config)?;
    sqlx::query(
        "INSERT INTO slowmodes (channel_id, server_id, interval_seconds, scope, \
             user_includes, user_excludes, role_includes, role_excludes, cooldowns) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(channel_id) DO UPDATE SET \
             server_id = excluded.server_id, \
             interval_seconds = excluded.interval_seconds, \
             scope = excluded.scope, \
             user_includes = excluded.user_includes, \
             user_excludes = excluded.user_excludes, \
             role_includes = excluded.role_includes, \
             role_excludes = excluded.role_excludes, \
             cooldowns = excluded.cooldowns, \
             updated_at = datetime('now')",
    )
    .bind(config.channel_id())
    .bind(config.server_id())
    .bind(config.interval_seconds())
    .bind(scope)
    .bind(user_includes)
    .bind(user_excludes)
    .bind(role_includes)
    .bind(role_excludes)
    .bind(cooldowns)
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove a channel's slowmode. Returns true if a row was deleted.
pub async fn remove_channel(pool: &SqlitePool, channel_id: &str) -> Result<bool, SlowmodeError> {
    let result = sqlx::query("DELETE FROM slowmodes WHERE channel_id = ?")
        .bind(channel_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove all slowmodes belonging to a server. Returns rows deleted.
pub async fn remove_server(pool: &SqlitePool, server_id: &str) -> Result<u64, SlowmodeError> {
    let result = sqlx::query("DELETE FROM slowmodes WHERE server_id = ?")
        .bind(server_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Channel IDs of every slowmode a server currently has.
pub async fn list_channel_ids(
    pool: &SqlitePool,
    server_id: &str,
) -> Result<Vec<String>, SlowmodeError> {
    let ids = sqlx::query_scalar::<_, String>("SELECT channel_id FROM slowmodes WHERE server_id = ?")
        .bind(server_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Clear the listed users' cooldown entries for a channel, or every entry
/// when the list is empty. Never alters the rule set. Returns entries
/// cleared, or `None` if the channel has no slowmode.
pub async fn reset_cooldowns(
    pool: &SqlitePool,
    channel_id: &str,
    user_ids: &[String],
) -> Result<Option<usize>, SlowmodeError> {
    let Some(mut config) = get_channel(pool, channel_id).await? else {
        return Ok(None);
    };
    let cleared = config.clear_cooldowns(user_ids);
    if cleared > 0 {
        set_channel(pool, &config).await?;
    }
    Ok(Some(cleared))
}

/// Write back a pruned cooldown map only if the stored map is still the
/// one that was read. Returns false when the row changed or vanished in
/// between — the caller must not overwrite state it never saw.
pub async fn update_cooldowns_if_unchanged(
    pool: &SqlitePool,
    channel_id: &str,
    expected_cooldowns: &str,
    new_cooldowns: &str,
) -> Result<bool, SlowmodeError> {
    let result = sqlx::query(
        "UPDATE slowmodes SET cooldowns = ?, updated_at = datetime('now') \
         WHERE channel_id = ? AND cooldowns = ?",
    )
    .bind(new_cooldowns)
    .bind(channel_id)
    .bind(expected_cooldowns)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop every stored channel whose server or channel is no longer live,
/// then prune expired cooldown entries from the surviving rows.
/// Idempotent: a second pass against the same live set reports zeros.
pub async fn sanitize(
    pool: &SqlitePool,
    live_server_ids: &[String],
    live_channel_ids: &[String],
    now_ms: i64,
) -> Result<SanitizeReport, SlowmodeError> {
    // No live servers or no live channels means nothing stored can be valid
    let deleted_channels = if live_server_ids.is_empty() || live_channel_ids.is_empty() {
        sqlx::query("DELETE FROM slowmodes")
            .execute(pool)
            .await?
            .rows_affected()
    } else {
        let server_marks = vec!["?"; live_server_ids.len()].join(", ");
        let channel_marks = vec!["?"; live_channel_ids.len()].join(", ");
        let sql = format!(
            "DELETE FROM slowmodes \
             WHERE server_id NOT IN ({server_marks}) \
                OR channel_id NOT IN ({channel_marks})"
        );
        let mut query = sqlx::query(&sql);
        for id in live_server_ids {
            query = query.bind(id);
        }
        for id in live_channel_ids {
            query = query.bind(id);
        }
        query.execute(pool).await?.rows_affected()
    };

    let mut expired_cooldowns: u64 = 0;
    let rows = sqlx::query_as::<_, SlowmodeRow>("SELECT * FROM slowmodes")
        .fetch_all(pool)
        .await?;
    for row in rows {
        let channel_id = row.channel_id.clone();
        let stored_cooldowns = row.cooldowns.clone();
        let mut config = row.decode()?;
        let pruned = config.prune_expired(now_ms);
        if pruned == 0 {
            continue;
        }
        let new_cooldowns =
            serde_json::to_string(config.cooldowns()).map_err(SlowmodeError::corrupt)?;
        // Conditional write-back: a message or config change may have
        // landed since the row was read. Rows that moved are left for
        // the next pass instead of being overwritten with a stale map.
        if update_cooldowns_if_unchanged(pool, &channel_id, &stored_cooldowns, &new_cooldowns)
            .await?
        {
            expired_cooldowns += pruned as u64;
        }
    }

    debug!(deleted_channels, expired_cooldowns, "sanitize pass finished");
    Ok(SanitizeReport {
        deleted_channels,
        expired_cooldowns,
    })
}
