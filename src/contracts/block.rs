use bytes::Bytes;

/// Fixed per-block bookkeeping cost added on top of the payload when
/// accounting buffer memory (block id, crc, lengths, task attempt id).
pub const BLOCK_ENCODING_OVERHEAD: u64 = 32;

/// A block of shuffle data for one partition, as received from a writer task.
///
/// The payload is opaque to the flush pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShufflePartitionedBlock {
    pub block_id: i64,
    pub task_attempt_id: i64,
    pub partition_id: u32,
    pub crc: i64,
    pub uncompress_length: u32,
    pub data: Bytes,
}

impl ShufflePartitionedBlock {
    pub fn new(
        block_id: i64,
        task_attempt_id: i64,
        partition_id: u32,
        crc: i64,
        uncompress_length: u32,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            block_id,
            task_attempt_id,
            partition_id,
            crc,
            uncompress_length,
            data: data.into(),
        }
    }

    /// Size of the payload.
    pub fn data_length(&self) -> u64 {
        self.data.len() as u64
    }

    /// Memory cost of the block while buffered.
    pub fn encoded_length(&self) -> u64 {
        self.data_length() + BLOCK_ENCODING_OVERHEAD
    }
}
