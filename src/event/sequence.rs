use std::sync::atomic::{AtomicU64, Ordering};

use crate::contracts::{SequenceError, SequenceGenerator};

/// Hands out flush event ids from a shared atomic counter.
///
/// Once `u64::MAX` has been issued the counter stays there and every further
/// call fails with [`SequenceError::Overflow`]; ids are never reused.
pub struct AtomicEventIdGenerator {
    last_issued: AtomicU64,
}

impl AtomicEventIdGenerator {
    pub fn new() -> Self {
        Self::starting_from(0)
    }

    /// The first id issued will be `last_issued + 1`.
    pub fn starting_from(last_issued: u64) -> Self {
        Self {
            last_issued: AtomicU64::new(last_issued),
        }
    }
}

impl Default for AtomicEventIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceGenerator for AtomicEventIdGenerator {
    fn next(&self) -> Result<u64, SequenceError> {
        self.last_issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |id| id.checked_add(1))
            .map(|prev| prev + 1)
            .map_err(|_| SequenceError::Overflow)
    }

    fn current(&self) -> u64 {
        self.last_issued.load(Ordering::Acquire)
    }
}
