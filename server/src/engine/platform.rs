use async_trait::async_trait;

use crate::error::SlowmodeError;

/// The servers and text channels currently visible to the process.
#[derive(Debug, Clone, Default)]
pub struct LiveSet {
    pub server_ids: Vec<String>,
    pub channel_ids: Vec<String>,
}

/// Injected capability for querying the platform. Used only at
/// configuration time and by the sanitization sweeper; the hot message
/// path runs entirely on pre-fetched snapshots.
///
/// Lookup failures surface as [`SlowmodeError::PlatformLookup`] and
/// reject the whole mutation — a configuration change is applied
/// all-or-nothing, never with a partially verified override list.
#[async_trait]
pub trait PlatformDirectory: Send + Sync {
    /// The current live server/channel set.
    async fn live_set(&self) -> Result<LiveSet, SlowmodeError>;

    /// Whether a user exists in the given server.
    async fn user_exists(&self, server_id: &str, user_id: &str) -> Result<bool, SlowmodeError>;

    /// Whether a role exists in the given server.
    async fn role_exists(&self, server_id: &str, role_id: &str) -> Result<bool, SlowmodeError>;
}

/// Directory backed by a fixed live set that treats every user/role
/// reference as valid. Used by the admin CLI, where the operator supplies
/// the IDs and vouches for them.
pub struct StaticDirectory {
    live: LiveSet,
}

impl StaticDirectory {
    pub fn new(live: LiveSet) -> Self {
        Self { live }
    }
}

#[async_trait]
impl PlatformDirectory for StaticDirectory {
    async fn live_set(&self) -> Result<LiveSet, SlowmodeError> {
        Ok(self.live.clone())
    }

    async fn user_exists(&self, _server_id: &str, _user_id: &str) -> Result<bool, SlowmodeError> {
        Ok(true)
    }

    async fn role_exists(&self, _server_id: &str, _role_id: &str) -> Result<bool, SlowmodeError> {
        Ok(true)
    }
}
