use thiserror::Error;

/// Rejections raised while constructing a flush event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlushEventError {
    #[error("App id must not be empty")]
    EmptyAppId,

    #[error("Invalid partition range: start {start} > end {end}")]
    InvalidPartitionRange { start: u32, end: u32 },

    #[error("Invalid length: data length {data} exceeds encoded length {encoded}")]
    InvalidLength { encoded: u64, data: u64 },
}

/// Failure of a single cleanup callback.
#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("Cleanup callback failed: {0}")]
    Failed(String),

    #[error("Cleanup callback panicked: {0}")]
    Panicked(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Sequence overflow")]
    Overflow,
}
