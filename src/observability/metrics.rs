//! Metrics for the ingestion pipeline
//!
//! Recording goes through the `metrics` facade. When no recorder is installed
//! every call is a no-op, so library users pay nothing unless they opt in.

use std::fmt;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion
    SourcesLoaded,
    SourcesSkipped,
    IngestDuration,

    // Normalization
    RowsNormalized,
    RowsDroppedEmpty,

    // Derivation and quality gate
    RowsDerived,
    DataQualityFindings,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourcesLoaded => "tickets_sources_loaded_total",
            MetricName::SourcesSkipped => "tickets_sources_skipped_total",
            MetricName::IngestDuration => "tickets_ingest_duration_seconds",
            MetricName::RowsNormalized => "tickets_rows_normalized_total",
            MetricName::RowsDroppedEmpty => "tickets_rows_dropped_empty_total",
            MetricName::RowsDerived => "tickets_rows_derived_total",
            MetricName::DataQualityFindings => "tickets_data_quality_findings_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder. Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("Metrics handle was already set");
            }
            info!("Prometheus recorder installed");
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    }
}

/// Current metrics in Prometheus text format, if the recorder is installed
pub fn render() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

pub mod ingest {
    use super::MetricName;

    pub fn source_loaded(format: &'static str) {
        ::metrics::counter!(MetricName::SourcesLoaded.as_str(), "format" => format).increment(1);
    }

    pub fn source_skipped(reason: &'static str) {
        ::metrics::counter!(MetricName::SourcesSkipped.as_str(), "reason" => reason).increment(1);
    }

    pub fn duration_recorded(seconds: f64) {
        ::metrics::histogram!(MetricName::IngestDuration.as_str()).record(seconds);
    }
}

pub mod normalize {
    use super::MetricName;

    pub fn rows_normalized(count: usize) {
        ::metrics::counter!(MetricName::RowsNormalized.as_str()).increment(count as u64);
    }

    pub fn rows_dropped_empty(count: usize) {
        ::metrics::counter!(MetricName::RowsDroppedEmpty.as_str()).increment(count as u64);
    }
}

pub mod quality {
    use super::MetricName;

    pub fn rows_derived(count: usize) {
        ::metrics::counter!(MetricName::RowsDerived.as_str()).increment(count as u64);
    }

    pub fn finding_recorded(kind: &'static str) {
        ::metrics::counter!(MetricName::DataQualityFindings.as_str(), "kind" => kind).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        let names = [
            MetricName::SourcesLoaded,
            MetricName::SourcesSkipped,
            MetricName::IngestDuration,
            MetricName::RowsNormalized,
            MetricName::RowsDroppedEmpty,
            MetricName::RowsDerived,
            MetricName::DataQualityFindings,
        ];
        for name in names {
            assert!(name.to_string().starts_with("tickets_"));
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        ingest::source_loaded("csv");
        normalize::rows_normalized(3);
        quality::finding_recorded("negative_aging");
    }
}
