use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_marks_saved(exam_name: &str, entries: usize) {
    metrics::counter!("marks_entries_saved_total", "exam" => exam_name.to_string())
        .increment(entries as u64);
}

pub(crate) fn record_gpa_saved(exam_name: &str, entries: usize) {
    metrics::counter!("gpa_entries_saved_total", "exam" => exam_name.to_string())
        .increment(entries as u64);
}

pub(crate) fn record_rejected_batch(kind: &'static str) {
    metrics::counter!("mark_batches_rejected_total", "kind" => kind).increment(1);
}
