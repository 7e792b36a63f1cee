use crate::contracts::error::SequenceError;

/// Generates the unique, monotonically increasing ids assigned to flush events.
///
/// # Invariants
/// - `id[n+1] > id[n]` always
/// - Lock-free in hot path
pub trait SequenceGenerator: Send + Sync {
    /// Returns the next id.
    /// Each call MUST return a value greater than any previous call.
    fn next(&self) -> Result<u64, SequenceError>;

    /// Returns the last id handed out without incrementing.
    fn current(&self) -> u64;
}
