use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec, register_int_gauge, Encoder, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // Save pipeline metrics
    pub static ref SAVES_DISPATCHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "attempt_saves_dispatched_total",
        "Total number of answer saves dispatched to the backend",
        &["outcome"]
    )
    .unwrap();

    pub static ref SAVES_COALESCED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "attempt_saves_coalesced_total",
        "Save triggers absorbed into an already pending snapshot",
        &["kind"]
    )
    .unwrap();

    // Attempt lifecycle metrics
    pub static ref ATTEMPTS_FINISHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "attempts_finished_total",
        "Total number of attempts driven to the results view",
        &["outcome"]
    )
    .unwrap();

    pub static ref FINALIZE_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "attempt_finalize_failures_total",
        "Finalize calls that failed and were treated as no score data",
        &["quiz_type"]
    )
    .unwrap();

    // Timer metrics
    pub static ref TIMERS_ACTIVE: IntGauge = register_int_gauge!(
        "attempt_timers_active",
        "Number of countdown streams currently running"
    )
    .unwrap();
}

pub fn record_save_outcome(success: bool) {
    let outcome = if success { "ok" } else { "error" };
    SAVES_DISPATCHED_TOTAL.with_label_values(&[outcome]).inc();
}

/// Render all registered metrics in the Prometheus text format.
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
