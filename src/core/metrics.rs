use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!("http_requests_total", "Requests served, labeled by status code.");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "Request latency in seconds, labeled by status code."
    );
    metrics::describe_counter!(
        "correcoes_graded_total",
        "Correções persisted after a successful scan grading."
    );
    metrics::describe_counter!("omr_failures_total", "OMR script runs that failed or timed out.");
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
