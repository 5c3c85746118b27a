use bitflags::bitflags;

bitflags! {
    /// Per-request load flags (subset of net/base/load_flags_list.h).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LoadFlags: u32 {
        const VALIDATE_CACHE = 1 << 0;
        const BYPASS_CACHE = 1 << 1;
        const SKIP_CACHE_VALIDATION = 1 << 2;
        const ONLY_FROM_CACHE = 1 << 3;
        const DISABLE_CACHE = 1 << 4;
        const DISABLE_INTERCEPT = 1 << 5;
        const BYPASS_PROXY = 1 << 7;
        const PREFETCH = 1 << 10;
        const DO_NOT_SAVE_COOKIES = 1 << 13;
        /// Started by a user gesture; exempt from throttling.
        const MAYBE_USER_GESTURE = 1 << 14;
        const IGNORE_LIMITS = 1 << 15;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combine() {
        let flags = LoadFlags::BYPASS_CACHE | LoadFlags::DO_NOT_SAVE_COOKIES;
        assert!(flags.contains(LoadFlags::DO_NOT_SAVE_COOKIES));
        assert!(!flags.contains(LoadFlags::PREFETCH));
        assert_eq!(LoadFlags::default(), LoadFlags::empty());
    }
}
