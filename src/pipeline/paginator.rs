use crate::apis::SourceAdapter;
use crate::common::types::{Filters, RawRecord};
use crate::observability::metrics;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Why pagination of one source stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The backend ran out of results
    Exhausted,
    /// A page failed; records from earlier pages were kept
    Failed(String),
}

/// Everything gathered for one adapter/query pair, in page order
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub records: Vec<RawRecord>,
    /// Number of pages that contributed records
    pub pages: u32,
    pub stop: StopReason,
}

/// Walk pages 1, 2, 3, ... until the backend is exhausted or a page fails.
///
/// There is no page limit and no retry: the first failure ends pagination and
/// whatever was collected before it is returned.
#[instrument(skip(adapter, filters), fields(source = %adapter.source()))]
pub async fn collect(adapter: &dyn SourceAdapter, query: &str, filters: &Filters) -> Collection {
    let source = adapter.source();
    let mut records = Vec::new();
    let mut page_num: u32 = 1;
    let mut pages = 0;

    info!("Beginning fetch...");
    let stop = loop {
        match adapter.fetch_page(query, page_num, filters).await {
            Ok(page) => {
                let count = page.records.len();
                if count > 0 {
                    pages += 1;
                    records.extend(page.records);
                    metrics::paginator::page_fetched(source, count);
                    info!("Found {} listings on page {}", count, page_num);
                }
                if count == 0 || !page.has_more {
                    info!("No more pages found. Stopped at page {}", pages);
                    break StopReason::Exhausted;
                }
                page_num += 1;
            }
            Err(e) => {
                metrics::paginator::page_failure(source);
                warn!("Failed to fetch page {}: {}. Stopping.", page_num, e);
                break StopReason::Failed(e.to_string());
            }
        }
    };

    Collection { records, pages, stop }
}
