use super::classify::{BatchClassifier, ClassificationReport};
use super::normalize::normalize_all;
use super::paginator::{collect, StopReason};
use super::sink::write_csv;
use crate::apis::SourceAdapter;
use crate::common::error::Result;
use crate::common::types::{Filters, Listing, Source};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, info_span, warn, Instrument};

/// One adapter bound to its own query and filters
pub struct SourceRun {
    pub adapter: Box<dyn SourceAdapter>,
    pub query: String,
    pub filters: Filters,
}

impl SourceRun {
    pub fn new(adapter: Box<dyn SourceAdapter>, query: impl Into<String>, filters: Filters) -> Self {
        Self {
            adapter,
            query: query.into(),
            filters,
        }
    }
}

/// What one source contributed to a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source: Source,
    pub query: String,
    pub pages: u32,
    pub listings: usize,
    pub stop: StopReason,
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub per_source: Vec<SourceSummary>,
    pub total_listings: usize,
    pub classification: Option<ClassificationReport>,
    pub output_file: Option<PathBuf>,
}

/// Sources → paginator → normalizer → optional classifier → CSV
pub struct Pipeline {
    sources: Vec<SourceRun>,
    classifier: Option<BatchClassifier>,
    output_path: PathBuf,
}

impl Pipeline {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            sources: Vec::new(),
            classifier: None,
            output_path: output_path.into(),
        }
    }

    pub fn with_source(mut self, run: SourceRun) -> Self {
        self.sources.push(run);
        self
    }

    pub fn with_classifier(mut self, classifier: BatchClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Fetch and normalize every source in configuration order.
    ///
    /// Sources run one after another; a failing source keeps the listings it
    /// produced before failing and never affects the next one.
    pub async fn collect_listings(&self) -> (Vec<Listing>, Vec<SourceSummary>) {
        let mut listings = Vec::new();
        let mut summaries = Vec::with_capacity(self.sources.len());

        for run in &self.sources {
            let source = run.adapter.source();
            let span = info_span!("source", source = %source, query = %run.query);
            let collection = collect(run.adapter.as_ref(), &run.query, &run.filters)
                .instrument(span)
                .await;

            let normalized = normalize_all(&collection.records, source);
            match &collection.stop {
                StopReason::Exhausted => {
                    info!("{}: {} listings from {} pages", source, normalized.len(), collection.pages)
                }
                StopReason::Failed(reason) => warn!(
                    "{}: stopped early after {} pages ({} listings kept): {}",
                    source,
                    collection.pages,
                    normalized.len(),
                    reason
                ),
            }

            summaries.push(SourceSummary {
                source,
                query: run.query.clone(),
                pages: collection.pages,
                listings: normalized.len(),
                stop: collection.stop,
            });
            listings.extend(normalized);
        }

        (listings, summaries)
    }

    /// Run the whole pipeline and write the output file.
    ///
    /// Only writing the output can fail; source and classifier problems degrade
    /// the result instead.
    pub async fn run(&self) -> Result<PipelineResult> {
        info!("Starting pipeline with {} sources", self.sources.len());
        let (mut listings, per_source) = self.collect_listings().await;

        let classification = match &self.classifier {
            Some(classifier) if !listings.is_empty() => Some(classifier.classify(&mut listings).await),
            Some(_) => {
                info!("No listings to classify");
                None
            }
            None => None,
        };

        let output_file = write_csv(&listings, &self.output_path)?;

        Ok(PipelineResult {
            per_source,
            total_listings: listings.len(),
            classification,
            output_file,
        })
    }
}
