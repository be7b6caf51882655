use crate::common::constants::{MISSING_URL, SUMMARY_LOCATION_DESCRIPTOR, UNKNOWN_LOCATION, UNTITLED};
use crate::common::types::{Deadline, JobDoc, Listing, MarketAd, RawRecord, Source};
use chrono::{DateTime, Utc};

/// Map one raw backend record into a `Listing`.
///
/// Pure and infallible: any missing field degrades to its sentinel or to `None`.
pub fn normalize(raw: &RawRecord, source: Source) -> Listing {
    match raw {
        RawRecord::Job(doc) => normalize_job(doc, source),
        RawRecord::Market(ad) => normalize_market(ad, source),
    }
}

pub fn normalize_all(records: &[RawRecord], source: Source) -> Vec<Listing> {
    records.iter().map(|raw| normalize(raw, source)).collect()
}

/// Epoch milliseconds to a point in time. Zero, missing and out-of-range all mean "no value".
pub fn millis_to_datetime(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.filter(|ms| *ms != 0).and_then(DateTime::<Utc>::from_timestamp_millis)
}

fn normalize_job(doc: &JobDoc, source: Source) -> Listing {
    Listing {
        title: doc.job_title.clone().unwrap_or_else(|| UNTITLED.to_string()),
        location: doc.location.clone().unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        organization: doc.company_name.clone().unwrap_or_default(),
        heading: doc.heading.clone(),
        url: doc.canonical_url.clone().unwrap_or_else(|| MISSING_URL.to_string()),
        published_at: millis_to_datetime(doc.published_ms),
        deadline_at: millis_to_datetime(doc.deadline_ms).map(Deadline::At),
        source,
        classification: None,
    }
}

/// Split a "label, company, location" summary positionally.
/// Returns `(organization, location)`; the location carries the summary descriptor.
fn split_summary(summary: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = summary
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    match tokens.as_slice() {
        [] => None,
        [location] => Some((String::new(), format!("{location}{SUMMARY_LOCATION_DESCRIPTOR}"))),
        [.., organization, location] => Some((
            organization.to_string(),
            format!("{location}{SUMMARY_LOCATION_DESCRIPTOR}"),
        )),
    }
}

fn normalize_market(ad: &MarketAd, source: Source) -> Listing {
    let (organization, location) = ad
        .summary
        .as_deref()
        .and_then(split_summary)
        .unwrap_or_else(|| {
            let location = ad
                .location_badge
                .clone()
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
            (String::new(), location)
        });

    let title = if ad.title.trim().is_empty() { UNTITLED.to_string() } else { ad.title.clone() };
    let url = if ad.url.trim().is_empty() { MISSING_URL.to_string() } else { ad.url.clone() };

    Listing {
        title,
        location,
        organization,
        heading: ad.display_text.clone(),
        url,
        published_at: None,
        deadline_at: ad.display_text.clone().map(Deadline::Text),
        source,
        classification: None,
    }
}
