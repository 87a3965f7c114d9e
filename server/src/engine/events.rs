use serde::{Deserialize, Serialize};

use super::member::{MemberRef, RoleRef};
use super::permissions::ChannelPermissions;

/// Snapshot of an inbound message, as delivered by the platform gateway.
/// Everything the cooldown check needs is captured here up front; the
/// core performs no platform lookups of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_id: String,
    pub channel_id: String,
    pub server_id: String,
    pub author_id: String,
    /// Platform message-creation time, in milliseconds.
    pub timestamp_ms: i64,
    pub has_text: bool,
    pub attachment_count: u32,
    pub author_roles: Vec<RoleRef>,
    pub author_is_owner: bool,
    /// Raw permission bits; unknown bits are dropped on conversion.
    pub author_permission_bits: u64,
}

impl MessageEvent {
    /// Build the evaluator's member snapshot from the event fields.
    pub fn author_ref(&self) -> MemberRef {
        MemberRef {
            user_id: self.author_id.clone(),
            roles: self.author_roles.clone(),
            is_owner: self.author_is_owner,
            permissions: ChannelPermissions::from_bits_truncate(self.author_permission_bits),
        }
    }
}

/// Events delivered to the engine by the platform gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// A message arrived in a channel.
    Message(MessageEvent),

    /// A channel was deleted on the platform.
    ChannelDeleted { channel_id: String },

    /// A server was deleted, or the process lost access to it.
    ServerDeleted { server_id: String },

    /// The gateway connected and reports the live server/channel set.
    Startup {
        live_server_ids: Vec<String>,
        live_channel_ids: Vec<String>,
    },
}

/// Instruction to the message-delivery collaborator. Issued only when a
/// message violates an active slowmode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    DeleteMessage { message_id: String },
}
