/// The in-memory buffer that accumulated the blocks of a flush event.
///
/// Events hold a weak back-reference to their buffer for bookkeeping once
/// the flush completes.
pub trait ShuffleBuffer: Send + Sync {
    /// Releases the in-flush memory held for `event_id`.
    fn release_flushed(&self, event_id: u64, encoded_length: u64);
}
