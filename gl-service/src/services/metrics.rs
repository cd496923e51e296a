//! Prometheus metrics for gl-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Posting counter (success vs rejected vs failed).
pub static POSTINGS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gl_postings_total",
        "Total number of journal entries submitted for posting",
        &["status"] // ok, rejected, error
    )
    .expect("Failed to register postings_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gl_errors_total",
        "Total number of errors by type",
        &["error_type"] // db_error, validation_error, not_found, etc.
    )
    .expect("Failed to register errors_total")
});

/// Account counter by type.
pub static ACCOUNTS_CREATED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gl_accounts_created_total",
        "Total number of accounts created",
        &["account_type"]
    )
    .expect("Failed to register accounts_created")
});

/// Fiscal period state changes.
pub static PERIOD_STATE_CHANGES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gl_period_state_changes_total",
        "Total number of fiscal period close/reopen operations",
        &["action"] // close, reopen
    )
    .expect("Failed to register period_state_changes")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "gl_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&POSTINGS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&ACCOUNTS_CREATED);
    Lazy::force(&PERIOD_STATE_CHANGES);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
