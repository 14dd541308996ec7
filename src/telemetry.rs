// src/telemetry.rs
use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;

/// Prometheus recorder for a single batch run. Nothing listens on a port: after the
/// run the exposition text is dumped to a file for a node-exporter textfile collector.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global recorder. Call once, before the pipeline runs.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Atomically write the current exposition to `path`.
    pub async fn write_textfile(&self, path: &Path) -> Result<()> {
        crate::snapshot::write_atomic(path, self.render().as_bytes()).await
    }
}

/// Dump metrics to `path` (when both are set), then hand `result` back unchanged.
/// A failed run still leaves its counters on disk.
pub async fn flush_after<T>(
    metrics: Option<&Metrics>,
    path: Option<&Path>,
    result: Result<T>,
) -> Result<T> {
    if let (Some(m), Some(path)) = (metrics, path) {
        if let Err(e) = m.write_textfile(path).await {
            tracing::warn!(error = ?e, path = %path.display(), "metrics textfile not written");
        }
    }
    result
}
