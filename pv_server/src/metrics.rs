//! Prometheus metrics for PV record activity.

use metrics::counter;

use crate::models::record::Status;

/// Initialize metrics exporter (Prometheus).
pub fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record a PV creation.
pub fn record_created() {
    counter!("pv_records_created_total").increment(1);
}

/// Record a status transition.
pub fn status_changed(status: Status) {
    counter!("pv_status_changes_total", "status" => status.as_str()).increment(1);
}

pub fn record_deleted() {
    counter!("pv_records_deleted_total").increment(1);
}

pub fn counter_updated() {
    counter!("pv_counter_updates_total").increment(1);
}

/// Record a login attempt and its outcome.
pub fn login_attempt(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("pv_logins_total", "result" => result).increment(1);
}
