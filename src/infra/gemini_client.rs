use crate::app::ports::ClassifierPort;
use crate::common::constants::{DEFAULT_GEMINI_MODEL, GEMINI_API_BASE, GEMINI_API_KEY_ENV};
use crate::common::error::{Result, ScraperError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Gemini `generateContent` client. Requires an API key, normally from `GEMINI_API_KEY`.
pub struct GeminiClassifier {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClassifier {
    pub fn new(api_key: impl Into<String>, model: Option<&str>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ScraperError::Config(format!("{GEMINI_API_KEY_ENV} is empty")));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or(DEFAULT_GEMINI_MODEL).to_string(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Build from the `GEMINI_API_KEY` environment variable.
    pub fn from_env(model: Option<&str>) -> Result<Self> {
        Self::from_env_var(GEMINI_API_KEY_ENV, model)
    }

    /// Build with the API key read from `var`.
    pub fn from_env_var(var: &str, model: Option<&str>) -> Result<Self> {
        let api_key = std::env::var(var).inspect_err(|_| warn!("{} is not set", var))?;
        Self::new(api_key, model)
    }

    /// Point at a different endpoint (proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

const ERROR_EXCERPT_CHARS: usize = 300;

/// First `max_chars` characters of an error body
fn excerpt(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

/// Concatenate the text parts of the first candidate.
fn reply_text(body: &str) -> Result<String> {
    let parsed: GenerateResponse = serde_json::from_str(body)?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ScraperError::Classifier("reply has no text candidates".into()));
    }
    Ok(text)
}

#[async_trait]
impl ClassifierPort for GeminiClassifier {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScraperError::Classifier(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ScraperError::Classifier(e.to_string()))?;
        if !status.is_success() {
            return Err(ScraperError::Classifier(format!(
                "generateContent returned {}: {}",
                status.as_u16(),
                excerpt(&body, ERROR_EXCERPT_CHARS)
            )));
        }

        debug!("Classifier replied with {} bytes", body.len());
        reply_text(&body)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_text_joins_parts_of_first_candidate() {
        let body = json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"a\": "}, {"text": "\"relevant\"}"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        })
        .to_string();
        assert_eq!(reply_text(&body).unwrap(), "{\"a\": \"relevant\"}");
    }

    #[test]
    fn test_reply_without_candidates_is_an_error() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string();
        assert!(matches!(reply_text(&body), Err(ScraperError::Classifier(_))));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(GeminiClassifier::new("  ", None).is_err());
    }

    #[test]
    fn test_missing_key_variable_is_env_error() {
        let err = GeminiClassifier::from_env_var("LISTING_SCRAPER_TEST_UNSET_KEY", None).err();
        assert!(matches!(err, Some(ScraperError::Env(std::env::VarError::NotPresent))));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let body = format!("{}ø tail", "a".repeat(299));
        let cut = excerpt(&body, ERROR_EXCERPT_CHARS);
        assert_eq!(cut.chars().count(), 300);
        assert!(cut.ends_with('ø'));
        assert_eq!(excerpt("short", ERROR_EXCERPT_CHARS), "short");
    }

    async fn serve_once(status_line: &'static str, body: String) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            // Read headers plus the JSON body before answering
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: text/plain; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_error_body_with_multibyte_char_at_cutoff_does_not_panic() {
        let addr = serve_once("500 Internal Server Error", format!("{}ø tail", "a".repeat(299))).await;
        let client = GeminiClassifier::new("k", None)
            .unwrap()
            .with_base_url(format!("http://{addr}"));

        match client.complete("prompt").await {
            Err(ScraperError::Classifier(message)) => {
                assert!(message.contains("500"));
                assert!(message.ends_with('ø'));
            }
            other => panic!("expected classifier error, got {other:?}"),
        }
    }

    #[test]
    fn test_provider_name() {
        let client = GeminiClassifier::new("k", None).unwrap();
        assert_eq!(client.provider_name(), "gemini");
        assert_eq!(client.model(), DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_endpoint_uses_model() {
        let client = GeminiClassifier::new("k", Some("gemini-test"))
            .unwrap()
            .with_base_url("http://localhost:9/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-test:generateContent"
        );
    }
}
