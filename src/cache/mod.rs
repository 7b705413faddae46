//! Cache Module
//!
//! Dual-mode caching: a remote store when reachable, an in-process map with
//! per-key expiry otherwise.

mod entry;
mod mode;
pub mod remote;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use mode::BackingMode;
pub use remote::{RedisRemote, RemoteCache, RemoteInfo};
pub use stats::CacheStoreStats;
pub use store::CacheStore;

// == Public Constants ==
/// TTL applied when neither the caller nor configuration supplies one
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Largest TTL passed to either backing store; longer TTLs are clamped.
///
/// Redis rejects `EX`/`EXPIRE` values whose absolute expiry overflows its
/// signed millisecond clock. Half that range leaves room for the current time.
pub const MAX_TTL_SECONDS: u64 = i64::MAX as u64 / 1000 / 2;
