/// Request priority, lowest to highest.
/// Mirrors net/base/request_priority.h
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RequestPriority {
    Throttled,
    Idle,
    #[default]
    Lowest,
    Low,
    Medium,
    Highest,
}

impl RequestPriority {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
