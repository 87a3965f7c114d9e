use thiserror::Error;

/// Errors surfaced by the slowmode core.
#[derive(Debug, Error)]
pub enum SlowmodeError {
    /// Rejected at the mutation boundary; never reaches the store.
    #[error("invalid slowmode configuration: {0}")]
    InvalidConfig(String),

    /// Backing store unreachable, timed out, or holding a corrupt record.
    /// The binary treats this as fatal: close the pool and exit rather
    /// than continue with possibly-stale or partial state.
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    /// A role/member lookup against the platform failed during a
    /// configuration change. The whole mutation is rejected.
    #[error("platform lookup failed: {0}")]
    PlatformLookup(String),
}

impl SlowmodeError {
    /// Wrap a corrupt stored value as a persistence decode failure.
    pub(crate) fn corrupt(err: serde_json::Error) -> Self {
        Self::Persistence(sqlx::Error::Decode(Box::new(err)))
    }
}
