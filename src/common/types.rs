use crate::common::constants::{FINN_JOBS_SOURCE, FINN_TORGET_SOURCE};
use crate::common::error::{Result, ScraperError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provenance tag carried by every listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    FinnJobs,
    FinnTorget,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::FinnJobs => FINN_JOBS_SOURCE,
            Source::FinnTorget => FINN_TORGET_SOURCE,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            FINN_JOBS_SOURCE => Ok(Source::FinnJobs),
            FINN_TORGET_SOURCE => Ok(Source::FinnTorget),
            other => Err(ScraperError::Config(format!("unknown source '{other}'"))),
        }
    }
}

/// Outcome of the enrichment stage for one listing.
///
/// `Unclassified` means classification was attempted but did not resolve;
/// a listing that never went through the stage has no classification at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Relevant,
    Irrelevant,
    Unclassified,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Relevant => "relevant",
            Classification::Irrelevant => "irrelevant",
            Classification::Unclassified => "unclassified",
        }
    }

    /// Map a free-text label from the classifier. Unknown labels do not resolve.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "relevant" => Classification::Relevant,
            "irrelevant" => Classification::Irrelevant,
            _ => Classification::Unclassified,
        }
    }
}

/// Deadline as either a parsed timestamp or the display text a source showed instead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Deadline {
    At(DateTime<Utc>),
    Text(String),
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deadline::At(ts) => f.write_str(&ts.to_rfc3339()),
            Deadline::Text(text) => f.write_str(text),
        }
    }
}

/// The unified record every source is normalized into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    pub location: String,
    pub organization: String,
    pub heading: Option<String>,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub deadline_at: Option<Deadline>,
    pub source: Source,
    pub classification: Option<Classification>,
}

/// One entry of the FINN job search `docs` array.
/// Every field is optional; a wrongly typed field reads as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobDoc {
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub company_name: Option<String>,
    pub heading: Option<String>,
    pub canonical_url: Option<String>,
    pub published_ms: Option<i64>,
    pub deadline_ms: Option<i64>,
}

/// One `article` from the FINN Torget search results page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketAd {
    pub title: String,
    pub url: String,
    pub display_text: Option<String>,
    pub location_badge: Option<String>,
    pub summary: Option<String>,
}

/// Backend-specific record before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Job(JobDoc),
    Market(MarketAd),
}

/// Named backend option. Adapters read the ones they understand and ignore the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "snake_case")]
pub enum Filter {
    PartTimeOnly,
    Industry(String),
    PriceTo(u32),
    ProductCategory(String),
    Location(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(pub Vec<Filter>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.0.push(filter);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One fetched page: the records it held and whether another page should be requested
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<RawRecord>,
    pub has_more: bool,
}

impl Page {
    pub fn exhausted() -> Self {
        Self {
            records: Vec::new(),
            has_more: false,
        }
    }
}
