use super::{build_url, get_ok, SourceAdapter};
use crate::app::ports::HttpClientPort;
use crate::common::constants::{FINN_JOBS_SEARCH_URL, PART_TIME_EXTENT_CODE};
use crate::common::error::Result;
use crate::common::types::{Filter, Filters, JobDoc, Page, RawRecord, Source};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// FINN job search JSON API
pub struct FinnJobsAdapter {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
}

impl FinnJobsAdapter {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            http,
            base_url: FINN_JOBS_SEARCH_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn page_url(&self, query: &str, page: u32, filters: &Filters) -> Result<String> {
        let mut params = vec![("q", query.to_string()), ("page", page.to_string())];
        for filter in filters.iter() {
            match filter {
                Filter::PartTimeOnly => params.push(("extent", PART_TIME_EXTENT_CODE.to_string())),
                Filter::Industry(code) => params.push(("industry", code.clone())),
                other => debug!("finn_jobs ignores filter {:?}", other),
            }
        }
        build_url(&self.base_url, &params)
    }
}

/// Read a string field, treating non-strings and blanks as absent
fn str_field(doc: &Value, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Read an epoch-milliseconds field. Floats are accepted when finite.
fn millis_field(doc: &Value, key: &str) -> Option<i64> {
    let value = doc.get(key)?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

impl JobDoc {
    pub fn from_value(doc: &Value) -> Self {
        JobDoc {
            job_title: str_field(doc, "job_title"),
            location: str_field(doc, "location"),
            company_name: str_field(doc, "company_name"),
            heading: str_field(doc, "heading"),
            canonical_url: str_field(doc, "canonical_url"),
            published_ms: millis_field(doc, "published"),
            deadline_ms: millis_field(doc, "deadline"),
        }
    }
}

/// Parse one search response body.
///
/// A body that is not JSON, or has no `docs` array, is read as the end of the
/// results: past the last page the API stops answering with JSON.
pub fn parse_job_page(body: &[u8]) -> Page {
    let data: Value = match serde_json::from_slice(body) {
        Ok(data) => data,
        Err(e) => {
            info!("Could not decode JSON, treating as last page: {}", e);
            return Page::exhausted();
        }
    };

    let Some(docs) = data.get("docs").and_then(|d| d.as_array()) else {
        info!("Response has no docs array, treating as last page");
        return Page::exhausted();
    };

    let records: Vec<RawRecord> = docs
        .iter()
        .filter(|doc| {
            let is_object = doc.is_object();
            if !is_object {
                warn!("Skipping non-object entry in docs: {}", doc);
            }
            is_object
        })
        .map(|doc| RawRecord::Job(JobDoc::from_value(doc)))
        .collect();

    Page {
        has_more: !docs.is_empty(),
        records,
    }
}

#[async_trait::async_trait]
impl SourceAdapter for FinnJobsAdapter {
    fn source(&self) -> Source {
        Source::FinnJobs
    }

    #[instrument(skip(self, filters), fields(source = "finn_jobs"))]
    async fn fetch_page(&self, query: &str, page: u32, filters: &Filters) -> Result<Page> {
        let url = self.page_url(query, page, filters)?;
        let response = get_ok(self.http.as_ref(), Source::FinnJobs, &url).await?;
        if !response.is_json() {
            warn!("Page {} came back as '{}' instead of JSON", page, response.content_type);
        }
        Ok(parse_job_page(&response.bytes))
    }
}
