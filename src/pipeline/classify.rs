use crate::app::ports::ClassifierPort;
use crate::common::constants::{DEFAULT_BATCH_SIZE, DEFAULT_RUBRIC};
use crate::common::error::{Result, ScraperError};
use crate::common::types::{Classification, Listing};
use crate::observability::metrics;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Counts from one classification pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationReport {
    pub batches: usize,
    pub failed_batches: usize,
    pub relevant: usize,
    pub irrelevant: usize,
    pub unclassified: usize,
}

impl ClassificationReport {
    fn count(&mut self, label: Classification) {
        match label {
            Classification::Relevant => self.relevant += 1,
            Classification::Irrelevant => self.irrelevant += 1,
            Classification::Unclassified => self.unclassified += 1,
        }
    }
}

#[derive(Serialize)]
struct PromptEntry<'a> {
    title: &'a str,
    heading: Option<&'a str>,
}

/// Sends listings to an external classifier in fixed-size batches
pub struct BatchClassifier {
    client: Arc<dyn ClassifierPort>,
    batch_size: usize,
    rubric: String,
}

impl BatchClassifier {
    pub fn new(client: Arc<dyn ClassifierPort>) -> Self {
        Self {
            client,
            batch_size: DEFAULT_BATCH_SIZE,
            rubric: DEFAULT_RUBRIC.to_string(),
        }
    }

    /// Zero is read as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_rubric(mut self, rubric: impl Into<String>) -> Self {
        self.rubric = rubric.into();
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Label every listing in place, one batch at a time.
    ///
    /// A batch whose call fails or whose reply cannot be parsed is marked
    /// `Unclassified` as a whole; later batches are unaffected. Running the pass
    /// again overwrites earlier labels.
    #[instrument(skip(self, listings), fields(count = listings.len(), batch_size = self.batch_size))]
    pub async fn classify(&self, listings: &mut [Listing]) -> ClassificationReport {
        let mut report = ClassificationReport::default();
        let total_batches = listings.len().div_ceil(self.batch_size);

        for (index, batch) in listings.chunks_mut(self.batch_size).enumerate() {
            let started = Instant::now();
            report.batches += 1;

            let labels = match self.classify_batch(batch).await {
                Ok(labels) => labels,
                Err(e) => {
                    warn!(
                        "Batch {}/{} could not be classified by {}, marking {} listings unclassified: {}",
                        index + 1,
                        total_batches,
                        self.client.provider_name(),
                        batch.len(),
                        e
                    );
                    metrics::classifier::batch_failed();
                    report.failed_batches += 1;
                    HashMap::new()
                }
            };

            for listing in batch.iter_mut() {
                let label = labels
                    .get(&listing.title)
                    .copied()
                    .unwrap_or(Classification::Unclassified);
                listing.classification = Some(label);
                report.count(label);
                metrics::classifier::label(label);
            }

            metrics::classifier::batch_done(started.elapsed().as_secs_f64());
            info!("Classified batch {}/{} ({} listings)", index + 1, total_batches, batch.len());
        }

        report
    }

    async fn classify_batch(&self, batch: &[Listing]) -> Result<HashMap<String, Classification>> {
        let prompt = build_prompt(&self.rubric, batch)?;
        let reply = self.client.complete(&prompt).await?;
        parse_reply(&reply)
    }
}

/// Render one batch into the instruction prompt
pub fn build_prompt(rubric: &str, batch: &[Listing]) -> Result<String> {
    let entries: Vec<PromptEntry> = batch
        .iter()
        .map(|l| PromptEntry {
            title: &l.title,
            heading: l.heading.as_deref(),
        })
        .collect();
    let listings = serde_json::to_string_pretty(&entries)?;

    Ok(format!(
        "{rubric}\n\n\
         Classify each listing below as \"relevant\" or \"irrelevant\". \
         Reply with a single JSON object that maps each listing's exact title to its label, \
         and nothing else.\n\n\
         Listings:\n{listings}"
    ))
}

fn strip_code_fence(reply: &str) -> &str {
    reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse the classifier reply into title → label.
///
/// Accepts a bare object, a fenced object, or an object embedded in prose.
/// Values that are not strings map to `Unclassified`.
pub fn parse_reply(reply: &str) -> Result<HashMap<String, Classification>> {
    let stripped = strip_code_fence(reply);
    let value: Value = serde_json::from_str(stripped).or_else(|e| {
        match (stripped.find('{'), stripped.rfind('}')) {
            (Some(start), Some(end)) if start < end => serde_json::from_str(&stripped[start..=end]),
            _ => Err(e),
        }
    })?;

    let Value::Object(map) = value else {
        return Err(ScraperError::Classifier("reply is not a JSON object".into()));
    };

    Ok(map
        .into_iter()
        .map(|(title, label)| {
            let label = label
                .as_str()
                .map(Classification::from_label)
                .unwrap_or(Classification::Unclassified);
            (title, label)
        })
        .collect())
}
