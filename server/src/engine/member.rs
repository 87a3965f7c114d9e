use serde::{Deserialize, Serialize};

use super::permissions::ChannelPermissions;

/// A role held by a member, with its position in the platform's role list.
/// Higher `rank` means the role sits higher in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: String,
    pub rank: i64,
}

/// Read-only snapshot of a member at evaluation time, supplied by the
/// gateway collaborator. The core never reaches back into the platform
/// once this is built.
#[derive(Debug, Clone)]
pub struct MemberRef {
    pub user_id: String,
    pub roles: Vec<RoleRef>,
    pub is_owner: bool,
    pub permissions: ChannelPermissions,
}
