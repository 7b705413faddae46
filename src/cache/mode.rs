//! Backing Mode Module
//!
//! Which backing store currently serves cache operations.

use std::fmt;

// == Backing Mode ==
/// Active backing store of a [`CacheStore`](super::CacheStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingMode {
    /// Operations are delegated to the remote cache
    Remote,
    /// Operations use the in-process expiry map
    Fallback,
}

impl BackingMode {
    /// Name reported in stats output.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackingMode::Remote => "redis",
            BackingMode::Fallback => "memory",
        }
    }
}

impl fmt::Display for BackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
