/// Source name constants to ensure consistency across the codebase.
/// These are the names accepted on the CLI, in `config.toml` and written to the `source` column.
pub const FINN_JOBS_SOURCE: &str = "finn_jobs";
pub const FINN_TORGET_SOURCE: &str = "finn_torget";

// Backend endpoints
pub const FINN_BASE_URL: &str = "https://www.finn.no";
pub const FINN_JOBS_SEARCH_URL: &str =
    "https://www.finn.no/job/job-search-page/api/search/SEARCH_ID_JOB_FULLTIME";
pub const FINN_TORGET_SEARCH_URL: &str = "https://www.finn.no/recommerce/forsale/search";

// FINN employment-extent code for part-time positions
pub const PART_TIME_EXTENT_CODE: &str = "3942";

// Sentinels substituted for missing fields
pub const UNKNOWN_LOCATION: &str = "unknown";
pub const UNTITLED: &str = "untitled";
pub const MISSING_URL: &str = "about:blank";
pub const HTML_MISSING_TITLE: &str = "Ingen tittel";
pub const HTML_MISSING_URL: &str = "Ingen URL";
pub const SUMMARY_LOCATION_DESCRIPTOR: &str = " (from summary)";

// Classifier defaults
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Relevance rubric sent with every classification batch unless overridden in config.
pub const DEFAULT_RUBRIC: &str = "You screen job listings for a junior software developer who is \
still studying and looks for part-time or entry-level work. A listing is \"relevant\" when it is \
a hands-on software, web, data or IT support role that does not demand several years of \
professional experience or senior/lead responsibility. Everything else, including sales, \
management, teaching and non-technical roles, is \"irrelevant\".";

// Output defaults
pub const DEFAULT_OUTPUT_PATH: &str = "listings.csv";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "LISTING_SCRAPER_CONFIG";
pub const DEFAULT_JOB_QUERY: &str = "utvikler";

/// Column order of the tabular output
pub const CSV_COLUMNS: [&str; 9] = [
    "title",
    "classification",
    "organization",
    "location",
    "heading",
    "url",
    "published_at",
    "deadline_at",
    "source",
];

/// Get all supported source names
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![FINN_JOBS_SOURCE, FINN_TORGET_SOURCE]
}
