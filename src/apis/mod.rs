pub mod finn_jobs;
pub mod finn_torget;

pub use finn_jobs::FinnJobsAdapter;
pub use finn_torget::FinnTorgetAdapter;

use crate::app::ports::{HttpClientPort, HttpGetResult};
use crate::common::error::{Result, ScraperError};
use crate::common::types::{Filters, Page, Source};
use crate::observability::metrics;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Core trait that every listing backend implements.
///
/// `fetch_page` issues exactly one request. Transport and parse failures come back
/// as errors and the caller treats them alike; reaching the end of the results is
/// a successful `Page` with `has_more == false`.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Provenance tag for listings produced by this adapter
    fn source(&self) -> Source;

    /// Fetch and parse page `page` (1-based) of `query`
    async fn fetch_page(&self, query: &str, page: u32, filters: &Filters) -> Result<Page>;
}

/// Build the adapter for a configured source
pub fn create_adapter(source: Source, http: Arc<dyn HttpClientPort>) -> Box<dyn SourceAdapter> {
    match source {
        Source::FinnJobs => Box::new(FinnJobsAdapter::new(http)),
        Source::FinnTorget => Box::new(FinnTorgetAdapter::new(http)),
    }
}

/// GET `url` and turn any non-2xx status into a page failure
pub(crate) async fn get_ok(http: &dyn HttpClientPort, source: Source, url: &str) -> Result<HttpGetResult> {
    let started = Instant::now();
    let result = http.get(url).await;
    metrics::sources::request_duration(source, started.elapsed().as_secs_f64());

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            metrics::sources::request_error(source);
            return Err(e);
        }
    };
    if !response.is_success() {
        metrics::sources::request_error(source);
        return Err(ScraperError::Status {
            status: response.status,
            url: url.to_string(),
        });
    }

    metrics::sources::request_success(source);
    metrics::sources::payload_bytes(source, response.bytes.len());
    Ok(response)
}

/// Append query parameters to a base URL
pub(crate) fn build_url(base: &str, params: &[(&str, String)]) -> Result<String> {
    let url = reqwest::Url::parse_with_params(base, params)
        .map_err(|e| ScraperError::Config(format!("invalid URL '{base}': {e}")))?;
    Ok(url.into())
}
