use crate::common::constants::CSV_COLUMNS;
use crate::common::error::Result;
use crate::common::types::Listing;
use crate::observability::metrics;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

fn row(listing: &Listing) -> [String; 9] {
    [
        listing.title.clone(),
        listing
            .classification
            .map(|c| c.as_str().to_string())
            .unwrap_or_default(),
        listing.organization.clone(),
        listing.location.clone(),
        listing.heading.clone().unwrap_or_default(),
        listing.url.clone(),
        listing
            .published_at
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_default(),
        listing
            .deadline_at
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        listing.source.as_str().to_string(),
    ]
}

/// Write the header and one row per listing. Returns the number of rows written.
pub fn write_listings<W: Write>(listings: &[Listing], writer: W) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(CSV_COLUMNS)?;
    for listing in listings {
        csv_writer.write_record(row(listing))?;
    }
    csv_writer.flush()?;
    Ok(listings.len())
}

/// Persist listings to `path`. With no listings nothing is written and `None` is returned.
pub fn write_csv(listings: &[Listing], path: &Path) -> Result<Option<PathBuf>> {
    if listings.is_empty() {
        info!("No listings found, not writing {}", path.display());
        return Ok(None);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let rows = write_listings(listings, file)?;
    metrics::sink::rows_written(rows);
    info!("Saved {} listings to {}", rows, path.display());
    Ok(Some(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{Classification, Deadline, Source};
    use chrono::{TimeZone, Utc};

    fn sample() -> Listing {
        Listing {
            title: "Utvikler, deltid".into(),
            location: "Oslo".into(),
            organization: "Acme AS".into(),
            heading: None,
            url: "https://www.finn.no/job/ad/1".into(),
            published_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()),
            deadline_at: Some(Deadline::Text("Snarest".into())),
            source: Source::FinnJobs,
            classification: Some(Classification::Relevant),
        }
    }

    #[test]
    fn test_header_and_row_layout() {
        let mut out = Vec::new();
        let rows = write_listings(&[sample()], &mut out).unwrap();
        assert_eq!(rows, 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("title,classification,organization,location,heading,url,published_at,deadline_at,source")
        );
        assert_eq!(
            lines.next(),
            Some("\"Utvikler, deltid\",relevant,Acme AS,Oslo,,https://www.finn.no/job/ad/1,2025-03-01T12:00:00+00:00,Snarest,finn_jobs")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_no_listings_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert_eq!(write_csv(&[], &path).unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_write_csv_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let written = write_csv(&[sample()], &path).unwrap();
        assert_eq!(written.as_deref(), Some(path.as_path()));
        assert!(path.exists());
    }
}
