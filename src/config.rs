use crate::common::constants::{
    CONFIG_PATH_ENV, DEFAULT_BATCH_SIZE, DEFAULT_CONFIG_PATH, DEFAULT_JOB_QUERY, DEFAULT_OUTPUT_PATH,
};
use crate::common::error::{Result, ScraperError};
use crate::common::types::{Filter, Filters, Source};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub output_path: PathBuf,
    pub batch_size: usize,
    pub log_dir: String,
    /// Overall per-request timeout for source fetches; none means wait indefinitely
    pub request_timeout_secs: Option<u64>,
    pub classifier: ClassifierConfig,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub enabled: bool,
    pub model: Option<String>,
    pub rubric: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub kind: Source,
    pub query: String,
    #[serde(default)]
    pub filters: Filters,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            batch_size: DEFAULT_BATCH_SIZE,
            log_dir: "logs".to_string(),
            request_timeout_secs: None,
            classifier: ClassifierConfig::default(),
            sources: vec![SourceConfig {
                kind: Source::FinnJobs,
                query: DEFAULT_JOB_QUERY.to_string(),
                filters: Filters::new().with(Filter::PartTimeOnly),
            }],
        }
    }
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub query: Option<String>,
    pub sources: Option<Vec<Source>>,
    pub part_time: bool,
    pub classify: bool,
    pub batch_size: Option<usize>,
    pub output_path: Option<PathBuf>,
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config file that `load` reads, if any.
    ///
    /// An explicit path is always returned. Otherwise `LISTING_SCRAPER_CONFIG` or
    /// `config.toml` is used when it exists.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let candidate = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        candidate.exists().then_some(candidate)
    }

    /// Load configuration from `resolve_path`, or built-in defaults when there is no file.
    ///
    /// Runs before logging is set up, so it does not log.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_path(explicit) else {
            return Ok(Self::default());
        };
        Self::load_file(&path)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ScraperError::Config("batch_size must be at least 1".into()));
        }
        if let Some(source) = self.sources.iter().find(|s| s.query.trim().is_empty()) {
            return Err(ScraperError::Config(format!("source {} has an empty query", source.kind)));
        }
        Ok(())
    }

    /// Apply CLI overrides.
    ///
    /// `sources` replaces the configured source list, reusing each kind's
    /// configured filters when the kind was configured. `query` applies to every source.
    pub fn apply(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(kinds) = overrides.sources {
            let default_query = overrides
                .query
                .clone()
                .or_else(|| self.sources.first().map(|s| s.query.clone()))
                .unwrap_or_else(|| DEFAULT_JOB_QUERY.to_string());
            self.sources = kinds
                .into_iter()
                .map(|kind| {
                    self.sources
                        .iter()
                        .find(|s| s.kind == kind)
                        .cloned()
                        .unwrap_or_else(|| SourceConfig {
                            kind,
                            query: default_query.clone(),
                            filters: Filters::new(),
                        })
                })
                .collect();
        }
        if let Some(query) = overrides.query {
            for source in &mut self.sources {
                source.query = query.clone();
            }
        }
        if overrides.part_time {
            for source in &mut self.sources {
                if !source.filters.iter().any(|f| *f == Filter::PartTimeOnly) {
                    source.filters.0.push(Filter::PartTimeOnly);
                }
            }
        }
        if overrides.classify {
            self.classifier.enabled = true;
        }
        if let Some(batch_size) = overrides.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(path) = overrides.output_path {
            self.output_path = path;
        }
        self.validate()?;
        Ok(self)
    }
}
