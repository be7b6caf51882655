use async_trait::async_trait;

use crate::common::error::Result;

// Ingest-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    /// Issue one GET request. Transport failures are errors; any status is returned as-is.
    async fn get(&self, url: &str) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// True when the server declared a JSON media type
    pub fn is_json(&self) -> bool {
        let essence = self.content_type.split(';').next().unwrap_or_default().trim();
        essence.eq_ignore_ascii_case("application/json") || essence.to_ascii_lowercase().ends_with("+json")
    }
}

// Enrichment-side port
#[async_trait]
pub trait ClassifierPort: Send + Sync {
    /// Send a free-text prompt, get the model's free-text reply back.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content_type: &str) -> HttpGetResult {
        HttpGetResult {
            status: 200,
            bytes: Vec::new(),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn test_json_content_types() {
        assert!(response("application/json").is_json());
        assert!(response("Application/JSON; charset=utf-8").is_json());
        assert!(response("application/problem+json").is_json());
        assert!(!response("text/html; charset=utf-8").is_json());
        assert!(!response("").is_json());
    }
}
