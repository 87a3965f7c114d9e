use super::member::MemberRef;
use super::permissions::SLOWMODE_EXEMPT;
use super::slowmode::SlowmodeConfig;

/// Decide whether a member is bound by a channel's slowmode.
///
/// Resolution order, first match wins:
///   1. The server owner is never subject.
///   2. A specifically included user is subject.
///   3. A specifically excluded user is not subject.
///   4. Of the member's roles, take the highest-ranked included role and
///      the highest-ranked excluded role:
///      - neither present: subject unless the member holds Manage Messages,
///        Manage Channels, or Administrator in the channel (the platform's
///        native slowmode behavior);
///      - only an included role: subject;
///      - only an excluded role: not subject;
///      - both: the strictly higher-ranked role's status wins. A rank tie
///        can only come from corrupted override sets and resolves to
///        excluded.
pub fn subject_to_slowmode(member: &MemberRef, config: &SlowmodeConfig) -> bool {
    if member.is_owner {
        return false;
    }
    if config.user_includes().contains(&member.user_id) {
        return true;
    }
    if config.user_excludes().contains(&member.user_id) {
        return false;
    }

    let mut highest_included: Option<i64> = None;
    let mut highest_excluded: Option<i64> = None;
    for role in &member.roles {
        if config.role_includes().contains(&role.id) {
            highest_included = Some(highest_included.map_or(role.rank, |r| r.max(role.rank)));
        }
        if config.role_excludes().contains(&role.id) {
            highest_excluded = Some(highest_excluded.map_or(role.rank, |r| r.max(role.rank)));
        }
    }

    match (highest_included, highest_excluded) {
        (None, None) => !member.permissions.intersects(SLOWMODE_EXEMPT),
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (Some(included), Some(excluded)) => included > excluded,
    }
}
