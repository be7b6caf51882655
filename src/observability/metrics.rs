//! Metric names and recording helpers for each pipeline phase.
//!
//! Recording is a no-op until a recorder is installed with [`init`].

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Sources metrics
    SourcesRequestsSuccess,
    SourcesRequestsError,
    SourcesRequestDuration,
    SourcesPayloadBytes,

    // Paginator metrics
    PaginatorPagesFetched,
    PaginatorRecordsCollected,
    PaginatorPageFailures,

    // Classifier metrics
    ClassifierBatches,
    ClassifierBatchFailures,
    ClassifierBatchDuration,
    ClassifierLabels,

    // Sink metrics
    SinkRowsWritten,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourcesRequestsSuccess => "listing_sources_requests_success_total",
            MetricName::SourcesRequestsError => "listing_sources_requests_error_total",
            MetricName::SourcesRequestDuration => "listing_sources_request_duration_seconds",
            MetricName::SourcesPayloadBytes => "listing_sources_payload_bytes",

            MetricName::PaginatorPagesFetched => "listing_paginator_pages_fetched_total",
            MetricName::PaginatorRecordsCollected => "listing_paginator_records_collected_total",
            MetricName::PaginatorPageFailures => "listing_paginator_page_failures_total",

            MetricName::ClassifierBatches => "listing_classifier_batches_total",
            MetricName::ClassifierBatchFailures => "listing_classifier_batch_failures_total",
            MetricName::ClassifierBatchDuration => "listing_classifier_batch_duration_seconds",
            MetricName::ClassifierLabels => "listing_classifier_labels_total",

            MetricName::SinkRowsWritten => "listing_sink_rows_written_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder. The handle renders a text snapshot on demand.
pub fn init() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    Ok(handle)
}

// ============================================================================
// Sources Metrics
// ============================================================================

pub mod sources {
    use super::MetricName;
    use crate::common::types::Source;

    pub fn request_success(source: Source) {
        ::metrics::counter!(MetricName::SourcesRequestsSuccess.as_str(), "source" => source.as_str()).increment(1);
    }

    pub fn request_error(source: Source) {
        ::metrics::counter!(MetricName::SourcesRequestsError.as_str(), "source" => source.as_str()).increment(1);
    }

    pub fn request_duration(source: Source, secs: f64) {
        ::metrics::histogram!(MetricName::SourcesRequestDuration.as_str(), "source" => source.as_str()).record(secs);
    }

    pub fn payload_bytes(source: Source, bytes: usize) {
        ::metrics::histogram!(MetricName::SourcesPayloadBytes.as_str(), "source" => source.as_str()).record(bytes as f64);
    }
}

// ============================================================================
// Paginator Metrics
// ============================================================================

pub mod paginator {
    use super::MetricName;
    use crate::common::types::Source;

    pub fn page_fetched(source: Source, records: usize) {
        ::metrics::counter!(MetricName::PaginatorPagesFetched.as_str(), "source" => source.as_str()).increment(1);
        ::metrics::counter!(MetricName::PaginatorRecordsCollected.as_str(), "source" => source.as_str())
            .increment(records as u64);
    }

    pub fn page_failure(source: Source) {
        ::metrics::counter!(MetricName::PaginatorPageFailures.as_str(), "source" => source.as_str()).increment(1);
    }
}

// ============================================================================
// Classifier Metrics
// ============================================================================

pub mod classifier {
    use super::MetricName;
    use crate::common::types::Classification;

    pub fn batch_done(secs: f64) {
        ::metrics::counter!(MetricName::ClassifierBatches.as_str()).increment(1);
        ::metrics::histogram!(MetricName::ClassifierBatchDuration.as_str()).record(secs);
    }

    pub fn batch_failed() {
        ::metrics::counter!(MetricName::ClassifierBatchFailures.as_str()).increment(1);
    }

    pub fn label(label: Classification) {
        ::metrics::counter!(MetricName::ClassifierLabels.as_str(), "label" => label.as_str()).increment(1);
    }
}

// ============================================================================
// Sink Metrics
// ============================================================================

pub mod sink {
    use super::MetricName;

    pub fn rows_written(rows: usize) {
        ::metrics::counter!(MetricName::SinkRowsWritten.as_str()).increment(rows as u64);
    }
}
