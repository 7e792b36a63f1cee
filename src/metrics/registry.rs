//! Flush event lifecycle metrics.
//!
//! Counters are lock-free atomics; per-app breakdowns use a concurrent hashmap
//! so cleanup callbacks can record from any thread.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Counters covering every stage of a flush event's life.
#[derive(Default)]
pub struct FlushEventMetrics {
    /// Total flush events created by buffers
    pub events_created_total: AtomicU64,
    /// Total retry attempts across all events
    pub event_retries_total: AtomicU64,
    /// Total events marked pended
    pub events_pended_total: AtomicU64,
    /// Total events whose cleanup chain ran
    pub events_cleaned_total: AtomicU64,
    /// Total cleanups that reported at least one failed callback
    pub cleanup_failures_total: AtomicU64,
    /// Encoded bytes released by cleanup, per app
    pub cleaned_bytes_by_app: DashMap<String, u64>,
}

impl FlushEventMetrics {
    /// Records the creation of an event.
    #[inline]
    pub fn record_created(&self) {
        self.events_created_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one retry attempt.
    #[inline]
    pub fn record_retry(&self) {
        self.event_retries_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an event being pended.
    #[inline]
    pub fn record_pended(&self) {
        self.events_pended_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed cleanup chain for `app_id`.
    pub fn record_cleanup(&self, app_id: &str, encoded_bytes: u64, success: bool) {
        self.events_cleaned_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.cleanup_failures_total.fetch_add(1, Ordering::Relaxed);
        }
        self.cleaned_bytes_by_app
            .entry(app_id.to_string())
            .and_modify(|v| *v += encoded_bytes)
            .or_insert(encoded_bytes);
    }

    /// Bytes released for `app_id` so far.
    pub fn cleaned_bytes(&self, app_id: &str) -> u64 {
        self.cleaned_bytes_by_app
            .get(app_id)
            .map(|v| *v)
            .unwrap_or(0)
    }

    /// Formats the metrics in Prometheus exposition format.
    pub fn format_prometheus(&self) -> String {
        let mut output = String::with_capacity(1024);

        write_counter(
            &mut output,
            "flush_events_created_total",
            "Total flush events created",
            &self.events_created_total,
        );
        write_counter(
            &mut output,
            "flush_event_retries_total",
            "Total flush event retry attempts",
            &self.event_retries_total,
        );
        write_counter(
            &mut output,
            "flush_events_pended_total",
            "Total flush events marked pended",
            &self.events_pended_total,
        );
        write_counter(
            &mut output,
            "flush_events_cleaned_total",
            "Total flush events cleaned up",
            &self.events_cleaned_total,
        );
        write_counter(
            &mut output,
            "flush_event_cleanup_failures_total",
            "Total cleanups with at least one failed callback",
            &self.cleanup_failures_total,
        );

        let _ = writeln!(
            output,
            "# HELP flush_cleaned_bytes_total Encoded bytes released by cleanup per app"
        );
        let _ = writeln!(output, "# TYPE flush_cleaned_bytes_total counter");
        for entry in self.cleaned_bytes_by_app.iter() {
            let _ = writeln!(
                output,
                "flush_cleaned_bytes_total{{app=\"{}\"}} {}",
                entry.key(),
                entry.value()
            );
        }
        output.push('\n');

        output
    }
}

fn write_counter(output: &mut String, name: &str, help: &str, value: &AtomicU64) {
    let _ = writeln!(output, "# HELP {} {}", name, help);
    let _ = writeln!(output, "# TYPE {} counter", name);
    let _ = writeln!(output, "{} {}", name, value.load(Ordering::Relaxed));
    output.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_counters() {
        let metrics = FlushEventMetrics::default();
        metrics.record_created();
        metrics.record_created();
        metrics.record_retry();
        metrics.record_pended();

        assert_eq!(metrics.events_created_total.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.event_retries_total.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.events_pended_total.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_cleanup_per_app() {
        let metrics = FlushEventMetrics::default();
        metrics.record_cleanup("app-1", 1_000, true);
        metrics.record_cleanup("app-1", 500, false);
        metrics.record_cleanup("app-2", 42, true);

        assert_eq!(metrics.events_cleaned_total.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.cleanup_failures_total.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.cleaned_bytes("app-1"), 1_500);
        assert_eq!(metrics.cleaned_bytes("app-2"), 42);
        assert_eq!(metrics.cleaned_bytes("missing"), 0);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = FlushEventMetrics::default();
        metrics.record_created();
        metrics.record_cleanup("app-1", 2_048, false);

        let output = metrics.format_prometheus();
        assert!(output.contains("# TYPE flush_events_created_total counter"));
        assert!(output.contains("flush_events_created_total 1"));
        assert!(output.contains("flush_event_retries_total 0"));
        assert!(output.contains("flush_event_cleanup_failures_total 1"));
        assert!(output.contains("flush_cleaned_bytes_total{app=\"app-1\"} 2048"));
    }
}
