//! Exploration metrics and tracing hooks
//!
//! With the `metrics` feature, runs report to the global OpenTelemetry meter
//! `lifeguard_explorer`. With the `tracing` feature, each run is wrapped in an `explore` span.
//! Without either feature these helpers compile to nothing.

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};
use std::time::Duration;

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<ExplorerMetrics> = Lazy::new(ExplorerMetrics::init);

#[cfg(feature = "metrics")]
pub struct ExplorerMetrics {
    pub records_visited: Counter<u64>,
    pub entries_skipped: Counter<u64>,
    pub run_duration: Histogram<f64>,
}

#[cfg(feature = "metrics")]
impl ExplorerMetrics {
    pub fn init() -> Self {
        let meter = global::meter("lifeguard_explorer");

        let records_visited = meter
            .u64_counter("lifeguard_explorer_records_visited_total")
            .with_description("Records visited by exploration runs")
            .build();

        let entries_skipped = meter
            .u64_counter("lifeguard_explorer_entries_skipped_total")
            .with_description("Queue entries skipped after a resolution error")
            .build();

        let run_duration = meter
            .f64_histogram("lifeguard_explorer_run_duration_seconds")
            .with_description("Duration of exploration runs")
            .build();

        Self {
            records_visited,
            entries_skipped,
            run_duration,
        }
    }
}

pub(crate) fn record_visit() {
    #[cfg(feature = "metrics")]
    METRICS.records_visited.add(1, &[]);
}

pub(crate) fn record_skip() {
    #[cfg(feature = "metrics")]
    METRICS.entries_skipped.add(1, &[]);
}

pub(crate) fn record_run(elapsed: Duration) {
    #[cfg(feature = "metrics")]
    METRICS.run_duration.record(elapsed.as_secs_f64(), &[]);
    #[cfg(not(feature = "metrics"))]
    let _ = elapsed;
}

#[cfg(feature = "tracing")]
pub(crate) mod tracing_helpers {
    /// Span covering one exploration run
    pub fn explore_span(seed_type: &str, seed_key: &str) -> tracing::Span {
        tracing::info_span!("explore", seed_type = %seed_type, seed_key = %seed_key)
    }
}
