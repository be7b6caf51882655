use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Unexpected response shape: {0}")]
    Parse(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl ScraperError {
    /// True for errors that end pagination of one source without aborting the run.
    pub fn is_page_failure(&self) -> bool {
        matches!(
            self,
            ScraperError::Transport(_)
                | ScraperError::Status { .. }
                | ScraperError::Parse(_)
                | ScraperError::Json(_)
        )
    }
}

impl From<reqwest::Error> for ScraperError {
    fn from(err: reqwest::Error) -> Self {
        ScraperError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
