use bitflags::bitflags;

bitflags! {
    /// Channel permission bits for a member, pre-translated from the
    /// platform's native representation by the gateway collaborator.
    /// Only the bits the slowmode evaluator consults are defined here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChannelPermissions: u64 {
        const MANAGE_CHANNELS = 1 << 1;
        const ADMINISTRATOR   = 1 << 7;
        const MANAGE_MESSAGES = 1 << 15;
    }
}

/// Bits that exempt a member from a slowmode when no include/exclude
/// override applies — the platform's native slowmode behavior.
pub const SLOWMODE_EXEMPT: ChannelPermissions = ChannelPermissions::MANAGE_MESSAGES
    .union(ChannelPermissions::MANAGE_CHANNELS)
    .union(ChannelPermissions::ADMINISTRATOR);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exempt_mask_covers_each_bit() {
        assert!(SLOWMODE_EXEMPT.contains(ChannelPermissions::MANAGE_MESSAGES));
        assert!(SLOWMODE_EXEMPT.contains(ChannelPermissions::MANAGE_CHANNELS));
        assert!(SLOWMODE_EXEMPT.contains(ChannelPermissions::ADMINISTRATOR));
    }

    #[test]
    fn test_unrelated_bits_are_not_exempt() {
        let perms = ChannelPermissions::from_bits_truncate(1 << 10);
        assert!(!perms.intersects(SLOWMODE_EXEMPT));
    }

    #[test]
    fn test_from_bits_truncate_drops_unknown_bits() {
        let perms = ChannelPermissions::from_bits_truncate(u64::MAX);
        assert_eq!(
            perms,
            ChannelPermissions::MANAGE_MESSAGES
                | ChannelPermissions::MANAGE_CHANNELS
                | ChannelPermissions::ADMINISTRATOR
        );
    }
}
