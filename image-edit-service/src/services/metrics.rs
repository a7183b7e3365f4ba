use crate::models::ErrorKind;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Call once from `main`.
pub fn init_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    if METRICS_HANDLE.set(handle).is_err() {
        anyhow::bail!("metrics recorder already initialized");
    }

    Ok(())
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Counts one `/api/edit` call by outcome (`success` or the failure kind).
pub fn record_edit_outcome(kind: Option<ErrorKind>) {
    let outcome = kind.map(|k| k.as_str()).unwrap_or("success");
    counter!("image_edit_requests_total", "outcome" => outcome).increment(1);
}
