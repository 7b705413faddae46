//! Cache Entry Module
//!
//! Defines the structure for entries held by the in-process fallback map.

use crate::time::current_timestamp_ms;

// == Cache Entry ==
/// A serialized value with its absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// JSON-serialized value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry that expires `ttl_seconds` from now.
    pub fn new(value: String, ttl_seconds: u64) -> Self {
        Self {
            value,
            expires_at: expiry_from_now(ttl_seconds),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Refresh Expiry ==
    /// Moves the expiry to `ttl_seconds` from now without touching the value.
    pub fn refresh_expiry(&mut self, ttl_seconds: u64) {
        self.expires_at = expiry_from_now(ttl_seconds);
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

fn expiry_from_now(ttl_seconds: u64) -> u64 {
    current_timestamp_ms().saturating_add(ttl_seconds.saturating_mul(1000))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("\"test_value\"".to_string(), 60);

        assert_eq!(entry.value, "\"test_value\"");
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining_ms() <= 60_000);
        assert!(entry.ttl_remaining_ms() >= 59_000);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("1".to_string(), 1);

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining_ms(), 0);
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let entry = CacheEntry::new("1".to_string(), 0);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            value: "test".to_string(),
            expires_at: now + 10,
        };

        assert!(!entry.is_expired_at(now + 9));
        assert!(entry.is_expired_at(now + 10), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(now + 11));
    }

    #[test]
    fn test_refresh_expiry() {
        let mut entry = CacheEntry::new("1".to_string(), 0);
        assert!(entry.is_expired());

        entry.refresh_expiry(60);
        assert!(!entry.is_expired());
        assert_eq!(entry.value, "1");
    }
}
