use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::engine::slowmode::{Scope, SlowmodeConfig};
use crate::error::SlowmodeError;

/// A stored slowmode record: the rule set and its cooldown map travel in
/// one row, keyed by channel. Override sets and the cooldown map are JSON
/// text columns.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SlowmodeRow {
    pub channel_id: String,
    pub server_id: String,
    pub interval_seconds: i64,
    pub scope: String,
    pub user_includes: String,
    pub user_excludes: String,
    pub role_includes: String,
    pub role_excludes: String,
    pub cooldowns: String,
    pub created_at: String,
    pub updated_at: String,
}

impl SlowmodeRow {
    /// Decode the JSON columns into the domain entity. A malformed column
    /// means the stored record is corrupt and surfaces as a persistence
    /// failure.
    pub fn decode(self) -> Result<SlowmodeConfig, SlowmodeError> {
        let scope = Scope::parse(&self.scope).ok_or_else(|| {
            SlowmodeError::Persistence(sqlx::Error::Decode(
                format!("unknown slowmode scope '{}'", self.scope).into(),
            ))
        })?;
        let user_includes: HashSet<String> =
            serde_json::from_str(&self.user_includes).map_err(SlowmodeError::corrupt)?;
        let user_excludes: HashSet<String> =
            serde_json::from_str(&self.user_excludes).map_err(SlowmodeError::corrupt)?;
        let role_includes: HashSet<String> =
            serde_json::from_str(&self.role_includes).map_err(SlowmodeError::corrupt)?;
        let role_excludes: HashSet<String> =
            serde_json::from_str(&self.role_excludes).map_err(SlowmodeError::corrupt)?;
        let cooldowns: HashMap<String, i64> =
            serde_json::from_str(&self.cooldowns).map_err(SlowmodeError::corrupt)?;

        Ok(SlowmodeConfig::from_stored(
            self.channel_id,
            self.server_id,
            self.interval_seconds,
            scope,
            user_includes,
            user_excludes,
            role_includes,
            role_excludes,
            cooldowns,
        ))
    }
}

/// JSON column values for writing a config, in bind order:
/// (scope, user_includes, user_excludes, role_includes, role_excludes, cooldowns).
pub fn encode_columns(
    config: &SlowmodeConfig,
) -> Result<(&'static str, String, String, String, String, String), SlowmodeError> {
    Ok((
        config.scope().as_str(),
        serde_json::to_string(config.user_includes()).map_err(SlowmodeError::corrupt)?,
        serde_json::to_string(config.user_excludes()).map_err(SlowmodeError::corrupt)?,
        serde_json::to_string(config.role_includes()).map_err(SlowmodeError::corrupt)?,
        serde_json::to_string(config.role_excludes()).map_err(SlowmodeError::corrupt)?,
        serde_json::to_string(config.cooldowns()).map_err(SlowmodeError::corrupt)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SlowmodeRow {
        SlowmodeRow {
            channel_id: "c1".into(),
            server_id: "s1".into(),
            interval_seconds: 60,
            scope: "text".into(),
            user_includes: r#"["u1"]"#.into(),
            user_excludes: "[]".into(),
            role_includes: "[]".into(),
            role_excludes: r#"["r2"]"#.into(),
            cooldowns: r#"{"u1":1000}"#.into(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_decode_row() {
        let config = row().decode().unwrap();
        assert_eq!(config.channel_id(), "c1");
        assert_eq!(config.scope(), Scope::TextOnly);
        assert!(config.user_includes().contains("u1"));
        assert!(config.role_excludes().contains("r2"));
        assert_eq!(config.cooldown_for("u1"), Some(1000));
    }

    #[test]
    fn test_decode_rejects_unknown_scope() {
        let mut bad = row();
        bad.scope = "voice".into();
        assert!(matches!(bad.decode(), Err(SlowmodeError::Persistence(_))));
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let mut bad = row();
        bad.cooldowns = "not json".into();
        assert!(matches!(bad.decode(), Err(SlowmodeError::Persistence(_))));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let config = row().decode().unwrap();
        let (scope, ui, ue, ri, re, cd) = encode_columns(&config).unwrap();
        let back = SlowmodeRow {
            channel_id: config.channel_id().into(),
            server_id: config.server_id().into(),
            interval_seconds: config.interval_seconds(),
            scope: scope.into(),
            user_includes: ui,
            user_excludes: ue,
            role_includes: ri,
            role_excludes: re,
            cooldowns: cd,
            created_at: String::new(),
            updated_at: String::new(),
        }
        .decode()
        .unwrap();
        assert_eq!(back, config);
    }
}
