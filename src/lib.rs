pub mod config;
pub mod contracts;
pub mod event;
pub mod metrics;
