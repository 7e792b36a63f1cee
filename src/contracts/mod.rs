pub mod block;
pub mod buffer;
pub mod error;
pub mod sequence;
pub mod storage;

pub use block::{ShufflePartitionedBlock, BLOCK_ENCODING_OVERHEAD};
pub use buffer::ShuffleBuffer;
pub use error::{CleanupError, FlushEventError, SequenceError};
pub use sequence::SequenceGenerator;
pub use storage::Storage;
