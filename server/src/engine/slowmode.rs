use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::SlowmodeError;

/// Shortest allowed slowmode interval, in seconds.
pub const MIN_INTERVAL_SECONDS: i64 = 1;

/// Longest allowed slowmode interval: one year, in seconds.
pub const MAX_INTERVAL_SECONDS: i64 = 31_536_000;

/// Which message content types a slowmode interval applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    TextOnly,
    ImageOnly,
    Both,
}

impl Scope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::TextOnly),
            "image" => Some(Self::ImageOnly),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextOnly => "text",
            Self::ImageOnly => "image",
            Self::Both => "both",
        }
    }
}

/// The slowmode rule set for one channel, together with the per-user
/// cooldown map it owns. The rule set is immutable after construction;
/// only the cooldown map mutates, and only through the methods here.
///
/// The include/exclude disjointness invariant and the interval range are
/// enforced by [`SlowmodeConfig::new`] — whole-record creation/replacement
/// is the only mutation path for the rule set, so there is no incremental
/// patch to slip past validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlowmodeConfig {
    channel_id: String,
    server_id: String,
    interval_seconds: i64,
    scope: Scope,
    user_includes: HashSet<String>,
    user_excludes: HashSet<String>,
    role_includes: HashSet<String>,
    role_excludes: HashSet<String>,
    /// Last qualifying message timestamp (ms) per user.
    cooldowns: HashMap<String, i64>,
}

impl SlowmodeConfig {
    /// Create a validated rule set with an empty cooldown map.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel_id: String,
        server_id: String,
        interval_seconds: i64,
        scope: Scope,
        user_includes: HashSet<String>,
        user_excludes: HashSet<String>,
        role_includes: HashSet<String>,
        role_excludes: HashSet<String>,
    ) -> Result<Self, SlowmodeError> {
        if !(MIN_INTERVAL_SECONDS..=MAX_INTERVAL_SECONDS).contains(&interval_seconds) {
            return Err(SlowmodeError::InvalidConfig(format!(
                "interval must be between {MIN_INTERVAL_SECONDS} and {MAX_INTERVAL_SECONDS} seconds, got {interval_seconds}"
            )));
        }
        if let Some(id) = user_includes.intersection(&user_excludes).next() {
            return Err(SlowmodeError::InvalidConfig(format!(
                "user {id} is both included and excluded"
            )));
        }
        if let Some(id) = role_includes.intersection(&role_excludes).next() {
            return Err(SlowmodeError::InvalidConfig(format!(
                "role {id} is both included and excluded"
            )));
        }
        Ok(Self {
            channel_id,
            server_id,
            interval_seconds,
            scope,
            user_includes,
            user_excludes,
            role_includes,
            role_excludes,
            cooldowns: HashMap::new(),
        })
    }

    /// Rehydrate a record read back from the store. Stored rows were
    /// validated when written, so this does not re-check invariants.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_stored(
        channel_id: String,
        server_id: String,
        interval_seconds: i64,
        scope: Scope,
        user_includes: HashSet<String>,
        user_excludes: HashSet<String>,
        role_includes: HashSet<String>,
        role_excludes: HashSet<String>,
        cooldowns: HashMap<String, i64>,
    ) -> Self {
        Self {
            channel_id,
            server_id,
            interval_seconds,
            scope,
            user_includes,
            user_excludes,
            role_includes,
            role_excludes,
            cooldowns,
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub fn interval_seconds(&self) -> i64 {
        self.interval_seconds
    }

    /// The interval in milliseconds, the unit cooldown timestamps use.
    pub fn interval_ms(&self) -> i64 {
        self.interval_seconds * 1000
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn user_includes(&self) -> &HashSet<String> {
        &self.user_includes
    }

    pub fn user_excludes(&self) -> &HashSet<String> {
        &self.user_excludes
    }

    pub fn role_includes(&self) -> &HashSet<String> {
        &self.role_includes
    }

    pub fn role_excludes(&self) -> &HashSet<String> {
        &self.role_excludes
    }

    pub fn cooldowns(&self) -> &HashMap<String, i64> {
        &self.cooldowns
    }

    /// Timestamp (ms) of the user's last qualifying message, if tracked.
    pub fn cooldown_for(&self, user_id: &str) -> Option<i64> {
        self.cooldowns.get(user_id).copied()
    }

    /// Record a qualifying message, starting or restarting the user's cooldown.
    pub fn record_message(&mut self, user_id: &str, timestamp_ms: i64) {
        self.cooldowns.insert(user_id.to_string(), timestamp_ms);
    }

    /// Clear the listed users' cooldown entries, or every entry when the
    /// list is empty. Never touches the rule set. Returns entries removed.
    pub fn clear_cooldowns(&mut self, user_ids: &[String]) -> usize {
        if user_ids.is_empty() {
            let cleared = self.cooldowns.len();
            self.cooldowns.clear();
            return cleared;
        }
        user_ids
            .iter()
            .filter(|id| self.cooldowns.remove(id.as_str()).is_some())
            .count()
    }

    /// Drop cooldown entries that have expired as of `now_ms`.
    /// Returns the number of entries removed.
    pub fn prune_expired(&mut self, now_ms: i64) -> usize {
        let interval_ms = self.interval_ms();
        let before = self.cooldowns.len();
        self.cooldowns.retain(|_, ts| *ts + interval_ms > now_ms);
        before - self.cooldowns.len()
    }
}
