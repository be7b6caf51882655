#![allow(dead_code)]

use async_trait::async_trait;
use listing_scraper::apis::SourceAdapter;
use listing_scraper::app::ports::{ClassifierPort, HttpClientPort, HttpGetResult};
use listing_scraper::common::error::{Result, ScraperError};
use listing_scraper::common::types::{Filters, JobDoc, Page, RawRecord, Source};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// HTTP port that replays canned responses in order and records requested URLs
pub struct FakeHttp {
    responses: Mutex<VecDeque<Result<HttpGetResult>>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl FakeHttp {
    pub fn new(responses: Vec<Result<HttpGetResult>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

pub fn ok(body: &str) -> Result<HttpGetResult> {
    status(200, body)
}

pub fn status(code: u16, body: &str) -> Result<HttpGetResult> {
    Ok(HttpGetResult {
        status: code,
        bytes: body.as_bytes().to_vec(),
        content_type: "text/plain".into(),
    })
}

#[async_trait]
impl HttpClientPort for FakeHttp {
    async fn get(&self, url: &str) -> Result<HttpGetResult> {
        self.requested.lock().await.push(url.to_string());
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ScraperError::Transport(format!("no canned response for {url}"))))
    }
}

/// Adapter that hands out scripted pages and records requested page numbers
pub struct ScriptedAdapter {
    source: Source,
    pages: Mutex<VecDeque<Result<Page>>>,
    pub requested: Arc<Mutex<Vec<u32>>>,
}

impl ScriptedAdapter {
    pub fn new(source: Source, pages: Vec<Result<Page>>) -> Self {
        Self {
            source,
            pages: Mutex::new(pages.into()),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch_page(&self, _query: &str, page: u32, _filters: &Filters) -> Result<Page> {
        self.requested.lock().await.push(page);
        self.pages.lock().await.pop_front().unwrap_or_else(|| Ok(Page::exhausted()))
    }
}

pub fn job(title: &str) -> RawRecord {
    RawRecord::Job(JobDoc {
        job_title: Some(title.to_string()),
        canonical_url: Some(format!("https://www.finn.no/job/{}", title.replace(' ', "-"))),
        ..Default::default()
    })
}

pub fn jobs_page(titles: &[&str]) -> Result<Page> {
    Ok(Page {
        records: titles.iter().map(|t| job(t)).collect(),
        has_more: true,
    })
}

pub fn job_titles(records: &[RawRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| match r {
            RawRecord::Job(doc) => doc.job_title.clone().unwrap_or_default(),
            RawRecord::Market(ad) => ad.title.clone(),
        })
        .collect()
}

/// Classifier that reads the titles back out of the prompt and labels them.
///
/// Calls listed in `malformed_calls` (0-based) get an unparseable reply,
/// titles in `omit` are left out of the reply.
pub struct EchoClassifier {
    pub calls: Arc<Mutex<usize>>,
    pub malformed_calls: Vec<usize>,
    pub omit: Vec<String>,
    pub labels: HashMap<String, String>,
}

impl EchoClassifier {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(0)),
            malformed_calls: Vec::new(),
            omit: Vec::new(),
            labels: HashMap::new(),
        }
    }

    fn titles_in(prompt: &str) -> Vec<String> {
        let start = prompt.find("Listings:\n").map(|i| i + "Listings:\n".len()).unwrap_or(0);
        let entries: Vec<serde_json::Value> = serde_json::from_str(&prompt[start..]).unwrap_or_default();
        entries
            .iter()
            .filter_map(|e| e["title"].as_str().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl ClassifierPort for EchoClassifier {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let call = {
            let mut calls = self.calls.lock().await;
            *calls += 1;
            *calls - 1
        };
        if self.malformed_calls.contains(&call) {
            return Ok("Sorry, I can't classify these right now.".to_string());
        }

        let reply: serde_json::Map<String, serde_json::Value> = Self::titles_in(prompt)
            .into_iter()
            .filter(|t| !self.omit.contains(t))
            .map(|t| {
                let label = self.labels.get(&t).cloned().unwrap_or_else(|| "relevant".to_string());
                (t, serde_json::Value::String(label))
            })
            .collect();
        Ok(format!("```json\n{}\n```", serde_json::Value::Object(reply)))
    }

    fn provider_name(&self) -> &'static str {
        "echo"
    }
}
