use super::events::MessageEvent;
use super::member::MemberRef;
use super::slowmode::{Scope, SlowmodeConfig};
use super::subject::subject_to_slowmode;

/// Outcome of checking one message against a channel's slowmode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The message stands; the caller must record the author's timestamp.
    Allow,
    /// The message arrived inside the author's cooldown; delete it.
    Violation,
    /// The slowmode does not bind this member or this content type.
    NotApplicable,
}

/// Check a message against a channel's slowmode. Pure: reads the config's
/// cooldown map but never writes it. On [`Verdict::Allow`] the caller
/// records the timestamp and persists the row; members who are not
/// subject never accumulate cooldown entries.
pub fn check(member: &MemberRef, message: &MessageEvent, config: &SlowmodeConfig) -> Verdict {
    if !subject_to_slowmode(member, config) {
        return Verdict::NotApplicable;
    }

    let scope_applies = match config.scope() {
        Scope::Both => true,
        Scope::TextOnly => message.has_text,
        Scope::ImageOnly => message.attachment_count > 0,
    };
    if !scope_applies {
        return Verdict::NotApplicable;
    }

    match config.cooldown_for(&member.user_id) {
        Some(last) if message.timestamp_ms < last + config.interval_ms() => Verdict::Violation,
        _ => Verdict::Allow,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::engine::permissions::ChannelPermissions;

    fn config(interval: i64, scope: Scope) -> SlowmodeConfig {
        SlowmodeConfig::new(
            "c1".into(),
            "s1".into(),
            interval,
            scope,
            HashSet::new(),
            HashSet::new(),
            HashSet::new(),
            HashSet::new(),
        )
        .unwrap()
    }

    fn message(timestamp_ms: i64, has_text: bool, attachment_count: u32) -> MessageEvent {
        MessageEvent {
            message_id: "m1".into(),
            channel_id: "c1".into(),
            server_id: "s1".into(),
            author_id: "u1".into(),
            timestamp_ms,
            has_text,
            attachment_count,
            author_roles: vec![],
            author_is_owner: false,
            author_permission_bits: 0,
        }
    }

    fn plain_member() -> MemberRef {
        MemberRef {
            user_id: "u1".into(),
            roles: vec![],
            is_owner: false,
            permissions: ChannelPermissions::empty(),
        }
    }

    #[test]
    fn test_first_message_allowed() {
        let c = config(60, Scope::Both);
        assert_eq!(check(&plain_member(), &message(0, true, 0), &c), Verdict::Allow);
    }

    #[test]
    fn test_message_inside_interval_violates() {
        let mut c = config(60, Scope::Both);
        c.record_message("u1", 0);
        assert_eq!(
            check(&plain_member(), &message(30_000, true, 0), &c),
            Verdict::Violation
        );
    }

    #[test]
    fn test_message_at_interval_boundary_allowed() {
        let mut c = config(60, Scope::Both);
        c.record_message("u1", 0);
        // interval is inclusive at exactly last + interval
        assert_eq!(
            check(&plain_member(), &message(60_000, true, 0), &c),
            Verdict::Allow
        );
        assert_eq!(
            check(&plain_member(), &message(59_999, true, 0), &c),
            Verdict::Violation
        );
    }

    #[test]
    fn test_exempt_member_not_applicable() {
        let c = config(60, Scope::Both);
        let m = MemberRef {
            permissions: ChannelPermissions::MANAGE_MESSAGES,
            ..plain_member()
        };
        assert_eq!(check(&m, &message(0, true, 0), &c), Verdict::NotApplicable);
    }

    #[test]
    fn test_text_scope_ignores_image_only_message() {
        let c = config(60, Scope::TextOnly);
        assert_eq!(
            check(&plain_member(), &message(0, false, 2), &c),
            Verdict::NotApplicable
        );
        assert_eq!(check(&plain_member(), &message(0, true, 2), &c), Verdict::Allow);
    }

    #[test]
    fn test_image_scope_ignores_text_only_message() {
        let mut c = config(60, Scope::ImageOnly);
        c.record_message("u1", 0);
        // Text messages pass through even while the author is on cooldown
        assert_eq!(
            check(&plain_member(), &message(1000, true, 0), &c),
            Verdict::NotApplicable
        );
        assert_eq!(
            check(&plain_member(), &message(1000, false, 1), &c),
            Verdict::Violation
        );
    }

    #[test]
    fn test_cooldowns_are_per_user() {
        let mut c = config(60, Scope::Both);
        c.record_message("someone-else", 0);
        assert_eq!(check(&plain_member(), &message(10, true, 0), &c), Verdict::Allow);
    }
}
