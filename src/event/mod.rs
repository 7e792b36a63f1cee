mod flush_event;
mod sequence;

pub use flush_event::{CleanupCallback, CleanupResult, FlushEvent, ValidityCheck};
pub use sequence::AtomicEventIdGenerator;
