//! Flush event policy configuration.

use std::time::Duration;

/// Limits consumed by the flush executor when deciding what to do with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushEventConfig {
    /// Retries allowed before an event is abandoned.
    pub max_retry_times: u32,
    /// How long an event may stay pended before it is dropped.
    pub pending_timeout: Duration,
    /// Buffered size above which a partition is classified as huge.
    pub huge_partition_size_bytes: u64,
}

impl Default for FlushEventConfig {
    fn default() -> Self {
        Self {
            max_retry_times: 3,
            pending_timeout: Duration::from_secs(600),
            huge_partition_size_bytes: 20 * 1024 * 1024 * 1024, // 20GB
        }
    }
}

impl FlushEventConfig {
    /// Creates a FlushEventConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SHUFFLE_FLUSH_MAX_RETRY_TIMES`: Retries before abandoning (default: 3)
    /// - `SHUFFLE_FLUSH_PENDING_TIMEOUT_SECS`: Pending timeout in seconds (default: 600)
    /// - `SHUFFLE_FLUSH_HUGE_PARTITION_BYTES`: Huge partition threshold (default: 20GB)
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_retry_times: std::env::var("SHUFFLE_FLUSH_MAX_RETRY_TIMES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_retry_times),
            pending_timeout: std::env::var("SHUFFLE_FLUSH_PENDING_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.pending_timeout),
            huge_partition_size_bytes: std::env::var("SHUFFLE_FLUSH_HUGE_PARTITION_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.huge_partition_size_bytes),
        }
    }

    /// Returns true when a partition holding `buffered_bytes` counts as huge.
    pub fn is_huge_partition(&self, buffered_bytes: u64) -> bool {
        buffered_bytes > self.huge_partition_size_bytes
    }
}
