//! Observability metrics for the flush event pipeline.
//!
//! All metrics use lock-free atomics for minimal hot-path impact.

pub mod registry;

pub use registry::FlushEventMetrics;
