use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Call once, from `main`.
pub fn init_metrics() -> Result<(), AppError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::InternalError(anyhow::anyhow!(
            "failed to install Prometheus recorder: {}",
            e
        ))
    })?;

    METRICS_HANDLE.set(handle).map_err(|_| {
        AppError::InternalError(anyhow::anyhow!(
            "failed to set metrics handle: already initialized"
        ))
    })
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Count one rendered redirect page.
pub fn record_redirect(outcome: &str) {
    counter!("relay_redirects_total", "outcome" => outcome.to_string()).increment(1);
}

/// Count one acknowledged webhook notification by classified kind.
pub fn record_webhook(kind: &str, processed: bool) {
    counter!(
        "relay_webhooks_total",
        "kind" => kind.to_string(),
        "processed" => processed.to_string()
    )
    .increment(1);
}

/// Count one finished merchant-order lookup by result (`ok` or an error kind).
pub fn record_lookup(result: &str) {
    counter!("relay_merchant_order_lookups_total", "result" => result.to_string()).increment(1);
}

pub fn set_lookups_in_flight(count: usize) {
    gauge!("relay_merchant_order_lookups_in_flight").set(count as f64);
}
