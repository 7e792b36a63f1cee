use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};

use crate::contracts::{
    CleanupError, FlushEventError, ShuffleBuffer, ShufflePartitionedBlock, Storage,
};

/// Re-evaluates whether an event is still worth flushing (e.g. the app is
/// still registered). Called on demand, never cached.
pub type ValidityCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// Outcome of a single cleanup callback.
pub type CleanupResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Action run when the event's lifecycle ends.
pub type CleanupCallback = Box<dyn Fn() -> CleanupResult + Send + Sync>;

/// A batch of buffered shuffle blocks waiting to be written to a storage tier.
///
/// # Ownership
/// The event is owned by one pipeline stage at a time (buffer, executor,
/// cleanup). Mutators other than the retry counter take `&mut self`; the
/// buffer and storage references are weak and never keep those alive.
///
/// # Invariants
/// - Identity fields never change after construction
/// - `start_partition <= end_partition`
/// - `data_length <= encoded_length`
/// - The retry counter never decreases
pub struct FlushEvent {
    event_id: u64,
    app_id: String,
    shuffle_id: u32,
    start_partition: u32,
    end_partition: u32,
    /// Memory cost, including encoding overhead
    encoded_length: u64,
    /// Size of the shuffle data
    data_length: u64,
    shuffle_blocks: Arc<[ShufflePartitionedBlock]>,
    validity: Option<ValidityCheck>,
    shuffle_buffer: Weak<dyn ShuffleBuffer>,
    retry_times: AtomicU32,
    pended: bool,
    start_pending_time: Option<SystemTime>,
    under_storage: Option<Weak<dyn Storage>>,
    cleanup_callbacks: Vec<CleanupCallback>,
    owned_by_huge_partition: bool,
}

impl FlushEvent {
    /// Creates an event whose data length equals its encoded length.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_id: u64,
        app_id: impl Into<String>,
        shuffle_id: u32,
        start_partition: u32,
        end_partition: u32,
        encoded_length: u64,
        shuffle_blocks: impl Into<Arc<[ShufflePartitionedBlock]>>,
        validity: Option<ValidityCheck>,
        shuffle_buffer: Weak<dyn ShuffleBuffer>,
    ) -> Result<Self, FlushEventError> {
        Self::with_data_length(
            event_id,
            app_id,
            shuffle_id,
            start_partition,
            end_partition,
            encoded_length,
            encoded_length,
            shuffle_blocks,
            validity,
            shuffle_buffer,
        )
    }

    /// Creates an event with separate memory and data accounting.
    ///
    /// Does no I/O and does not call `validity`.
    #[allow(clippy::too_many_arguments)]
    pub fn with_data_length(
        event_id: u64,
        app_id: impl Into<String>,
        shuffle_id: u32,
        start_partition: u32,
        end_partition: u32,
        encoded_length: u64,
        data_length: u64,
        shuffle_blocks: impl Into<Arc<[ShufflePartitionedBlock]>>,
        validity: Option<ValidityCheck>,
        shuffle_buffer: Weak<dyn ShuffleBuffer>,
    ) -> Result<Self, FlushEventError> {
        let app_id = app_id.into();
        if app_id.is_empty() {
            return Err(FlushEventError::EmptyAppId);
        }
        if start_partition > end_partition {
            return Err(FlushEventError::InvalidPartitionRange {
                start: start_partition,
                end: end_partition,
            });
        }
        if data_length > encoded_length {
            return Err(FlushEventError::InvalidLength {
                encoded: encoded_length,
                data: data_length,
            });
        }

        tracing::debug!(
            event_id = event_id,
            app_id = %app_id,
            shuffle_id = shuffle_id,
            start_partition = start_partition,
            end_partition = end_partition,
            encoded_length = encoded_length,
            "Created flush event"
        );

        Ok(Self {
            event_id,
            app_id,
            shuffle_id,
            start_partition,
            end_partition,
            encoded_length,
            data_length,
            shuffle_blocks: shuffle_blocks.into(),
            validity,
            shuffle_buffer,
            retry_times: AtomicU32::new(0),
            pended: false,
            start_pending_time: None,
            under_storage: None,
            cleanup_callbacks: Vec::new(),
            owned_by_huge_partition: false,
        })
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn shuffle_id(&self) -> u32 {
        self.shuffle_id
    }

    pub fn start_partition(&self) -> u32 {
        self.start_partition
    }

    pub fn end_partition(&self) -> u32 {
        self.end_partition
    }

    /// Number of partitions covered by the inclusive range.
    pub fn partition_count(&self) -> u64 {
        u64::from(self.end_partition - self.start_partition) + 1
    }

    pub fn encoded_length(&self) -> u64 {
        self.encoded_length
    }

    pub fn data_length(&self) -> u64 {
        self.data_length
    }

    pub fn shuffle_blocks(&self) -> &[ShufflePartitionedBlock] {
        &self.shuffle_blocks
    }

    /// The buffer that produced this event, if it is still alive.
    pub fn shuffle_buffer(&self) -> Option<Arc<dyn ShuffleBuffer>> {
        self.shuffle_buffer.upgrade()
    }

    /// Returns the current result of the validity check, or true without one.
    pub fn is_valid(&self) -> bool {
        match &self.validity {
            Some(check) => check(),
            None => true,
        }
    }

    pub fn retry_times(&self) -> u32 {
        self.retry_times.load(Ordering::Acquire)
    }

    /// Safe to call from several retry paths at once. Saturates at `u32::MAX`.
    pub fn increase_retry_times(&self) {
        let prev = self
            .retry_times
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                Some(v.saturating_add(1))
            })
            .unwrap_or_else(|v| v);
        let retry_times = prev.saturating_add(1);
        tracing::trace!(event_id = self.event_id, retry_times, "Increased retry times");
    }

    /// Returns true once the event has been retried more than `max_retry_times`.
    pub fn exceeds_retry_limit(&self, max_retry_times: u32) -> bool {
        self.retry_times() > max_retry_times
    }

    pub fn is_pended(&self) -> bool {
        self.pended
    }

    /// Marks the event as waiting for a resource, restarting the pending clock.
    pub fn mark_pended(&mut self) {
        self.pended = true;
        self.start_pending_time = Some(SystemTime::now());
        tracing::debug!(event_id = self.event_id, "Marked flush event pended");
    }

    /// When the event was last marked pended. `None` until `mark_pended`.
    pub fn start_pending_time(&self) -> Option<SystemTime> {
        self.start_pending_time
    }

    /// Time spent pended so far, `None` when not pended.
    pub fn pending_elapsed(&self) -> Option<Duration> {
        if !self.pended {
            return None;
        }
        self.start_pending_time
            .map(|start| start.elapsed().unwrap_or(Duration::ZERO))
    }

    pub fn is_pending_timed_out(&self, timeout: Duration) -> bool {
        self.pending_elapsed()
            .is_some_and(|elapsed| elapsed > timeout)
    }

    /// The storage assigned for the current attempt, if any and still alive.
    pub fn under_storage(&self) -> Option<Arc<dyn Storage>> {
        self.under_storage.as_ref().and_then(Weak::upgrade)
    }

    pub fn set_under_storage(&mut self, storage: Weak<dyn Storage>) {
        if let Some(s) = storage.upgrade() {
            tracing::debug!(
                event_id = self.event_id,
                storage_type = s.storage_type(),
                "Assigned storage to flush event"
            );
        }
        self.under_storage = Some(storage);
    }

    /// Unsets the storage slot, e.g. before re-dispatching to another tier.
    pub fn clear_under_storage(&mut self) {
        self.under_storage = None;
    }

    pub fn is_owned_by_huge_partition(&self) -> bool {
        self.owned_by_huge_partition
    }

    pub fn mark_owned_by_huge_partition(&mut self) {
        self.owned_by_huge_partition = true;
    }

    /// Appends a callback to run on cleanup, after those already registered.
    pub fn add_cleanup_callback<F>(&mut self, callback: F)
    where
        F: Fn() -> CleanupResult + Send + Sync + 'static,
    {
        self.cleanup_callbacks.push(Box::new(callback));
    }

    /// Appends `callback` when present; `None` is ignored.
    pub fn add_optional_cleanup_callback(&mut self, callback: Option<CleanupCallback>) {
        if let Some(callback) = callback {
            self.cleanup_callbacks.push(callback);
        }
    }

    pub fn cleanup_callback_count(&self) -> usize {
        self.cleanup_callbacks.len()
    }

    /// Registers a callback releasing this event's memory from its source
    /// buffer. Does nothing on cleanup if the buffer is already gone.
    pub fn release_buffer_on_cleanup(&mut self) {
        let buffer = self.shuffle_buffer.clone();
        let event_id = self.event_id;
        let encoded_length = self.encoded_length;
        self.add_cleanup_callback(move || {
            if let Some(buffer) = buffer.upgrade() {
                buffer.release_flushed(event_id, encoded_length);
            }
            Ok(())
        });
    }

    /// Runs every cleanup callback in registration order.
    ///
    /// A callback that returns an error or panics is logged and skipped;
    /// the rest still run. Returns true only if all of them succeeded.
    /// Calling this again runs the whole chain again.
    pub fn do_cleanup(&self) -> bool {
        let mut ret = true;
        for (index, callback) in self.cleanup_callbacks.iter().enumerate() {
            let error = match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => CleanupError::Failed(e.to_string()),
                Err(payload) => CleanupError::Panicked(panic_message(payload.as_ref())),
            };
            ret = false;
            tracing::error!(
                event_id = self.event_id,
                app_id = %self.app_id,
                callback = index,
                error = %error,
                event = %self,
                "Errors doing cleanup callback"
            );
        }
        if !ret {
            tracing::warn!(event_id = self.event_id, "Flush event cleanup finished with failures");
        }
        ret
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl fmt::Display for FlushEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = match &self.under_storage {
            None => "none".to_string(),
            Some(weak) => weak
                .upgrade()
                .map(|s| s.storage_type().to_string())
                .unwrap_or_else(|| "dropped".to_string()),
        };
        write!(
            f,
            "FlushEvent: event_id={}, app_id={}, shuffle_id={}, start_partition={}, \
             end_partition={}, retry_times={}, under_storage={}, pended={}, \
             owned_by_huge_partition={}",
            self.event_id,
            self.app_id,
            self.shuffle_id,
            self.start_partition,
            self.end_partition,
            self.retry_times(),
            storage,
            self.pended,
            self.owned_by_huge_partition
        )
    }
}

impl fmt::Debug for FlushEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushEvent")
            .field("event_id", &self.event_id)
            .field("app_id", &self.app_id)
            .field("shuffle_id", &self.shuffle_id)
            .field("start_partition", &self.start_partition)
            .field("end_partition", &self.end_partition)
            .field("encoded_length", &self.encoded_length)
            .field("data_length", &self.data_length)
            .field("blocks", &self.shuffle_blocks.len())
            .field("retry_times", &self.retry_times())
            .field("pended", &self.pended)
            .field("start_pending_time", &self.start_pending_time)
            .field("cleanup_callbacks", &self.cleanup_callbacks.len())
            .field("owned_by_huge_partition", &self.owned_by_huge_partition)
            .finish_non_exhaustive()
    }
}
