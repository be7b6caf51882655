use super::{build_url, get_ok, SourceAdapter};
use crate::app::ports::HttpClientPort;
use crate::common::constants::{
    FINN_BASE_URL, FINN_TORGET_SEARCH_URL, HTML_MISSING_TITLE, HTML_MISSING_URL,
};
use crate::common::error::{Result, ScraperError};
use crate::common::types::{Filter, Filters, MarketAd, Page, RawRecord, Source};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Results container candidates, most specific first
const RESULTS_CONTAINERS: [&str; 3] = ["#page-results", ".sf-search-results", "main"];
const ARTICLE: &str = "article.sf-search-ad";
const TITLE: &str = "h2.h4";
const LINK: &str = "a.sf-search-ad-link";
const DISPLAY_CONTAINER: &str = "div.font-bold";
const DISPLAY_TEXT: &str = "span";
const LOCATION_BADGE: &str = "span.whitespace-nowrap";
const SUMMARY: &str = ".s-text-subtle";

/// FINN Torget marketplace search, scraped from the rendered results page
pub struct FinnTorgetAdapter {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
}

impl FinnTorgetAdapter {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            http,
            base_url: FINN_TORGET_SEARCH_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn page_url(&self, query: &str, page: u32, filters: &Filters) -> Result<String> {
        let mut params = vec![("q", query.to_string()), ("page", page.to_string())];
        for filter in filters.iter() {
            match filter {
                Filter::PriceTo(max) => params.push(("price_to", max.to_string())),
                Filter::ProductCategory(code) => params.push(("product_category", code.clone())),
                Filter::Location(code) => params.push(("location", code.clone())),
                other => debug!("finn_torget ignores filter {:?}", other),
            }
        }
        build_url(&self.base_url, &params)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScraperError::Parse(format!("invalid selector '{css}': {e:?}")))
}

/// Trimmed text content with inner whitespace collapsed
fn element_text(element: &ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_text(element: &ElementRef, sel: &Selector) -> Option<String> {
    element
        .select(sel)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

fn absolute_url(href: &str) -> String {
    reqwest::Url::parse(FINN_BASE_URL)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

struct ArticleSelectors {
    title: Selector,
    link: Selector,
    display_container: Selector,
    display_text: Selector,
    location: Selector,
    summary: Selector,
}

impl ArticleSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            title: selector(TITLE)?,
            link: selector(LINK)?,
            display_container: selector(DISPLAY_CONTAINER)?,
            display_text: selector(DISPLAY_TEXT)?,
            location: selector(LOCATION_BADGE)?,
            summary: selector(SUMMARY)?,
        })
    }

    /// Extract one ad. Every sub-element is optional.
    fn extract(&self, article: &ElementRef) -> MarketAd {
        let title = first_text(article, &self.title).unwrap_or_else(|| HTML_MISSING_TITLE.to_string());

        let url = article
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(absolute_url)
            .unwrap_or_else(|| HTML_MISSING_URL.to_string());

        let display_text = article
            .select(&self.display_container)
            .next()
            .and_then(|container| first_text(&container, &self.display_text));

        MarketAd {
            title,
            url,
            display_text,
            location_badge: first_text(article, &self.location),
            summary: first_text(article, &self.summary),
        }
    }
}

/// Parse one results page
pub fn parse_market_page(html: &str) -> Result<Page> {
    let document = Html::parse_document(html);
    let article_selector = selector(ARTICLE)?;

    let mut container = None;
    for css in RESULTS_CONTAINERS {
        container = document.select(&selector(css)?).next();
        if container.is_some() {
            break;
        }
    }
    let Some(container) = container else {
        info!("No results container on page, treating as last page");
        return Ok(Page::exhausted());
    };

    let fields = ArticleSelectors::new()?;
    let records: Vec<RawRecord> = container
        .select(&article_selector)
        .map(|article| RawRecord::Market(fields.extract(&article)))
        .collect();

    debug!("Found {} article elements", records.len());
    Ok(Page {
        has_more: !records.is_empty(),
        records,
    })
}

#[async_trait::async_trait]
impl SourceAdapter for FinnTorgetAdapter {
    fn source(&self) -> Source {
        Source::FinnTorget
    }

    #[instrument(skip(self, filters), fields(source = "finn_torget"))]
    async fn fetch_page(&self, query: &str, page: u32, filters: &Filters) -> Result<Page> {
        let url = self.page_url(query, page, filters)?;
        let response = get_ok(self.http.as_ref(), Source::FinnTorget, &url).await?;
        parse_market_page(&response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="sf-search-results">
            <article class="sf-search-ad">
              <h2 class="h4"><a class="sf-search-ad-link" href="/recommerce/forsale/item/101">
                ThinkPad   T14 16GB
              </a></h2>
              <div class="font-bold"><span> 4 500 kr </span></div>
              <span class="whitespace-nowrap">Trondheim</span>
              <div class="s-text-subtle">Privat, Ola Nordmann, Trondheim</div>
            </article>
            <article class="sf-search-ad">
              <p>Annonsen mangler alt</p>
            </article>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_extracts_articles_and_sentinels() {
        let page = parse_market_page(PAGE).unwrap();
        assert!(page.has_more);
        assert_eq!(page.records.len(), 2);

        let RawRecord::Market(first) = &page.records[0] else { panic!("expected market ad") };
        assert_eq!(first.title, "ThinkPad T14 16GB");
        assert_eq!(first.url, "https://www.finn.no/recommerce/forsale/item/101");
        assert_eq!(first.display_text.as_deref(), Some("4 500 kr"));
        assert_eq!(first.location_badge.as_deref(), Some("Trondheim"));
        assert_eq!(first.summary.as_deref(), Some("Privat, Ola Nordmann, Trondheim"));

        let RawRecord::Market(second) = &page.records[1] else { panic!("expected market ad") };
        assert_eq!(second.title, HTML_MISSING_TITLE);
        assert_eq!(second.url, HTML_MISSING_URL);
        assert_eq!(second.display_text, None);
        assert_eq!(second.location_badge, None);
    }

    #[test]
    fn test_container_without_articles_is_last_page() {
        let page = parse_market_page(r#"<div class="sf-search-results"><p>Ingen treff</p></div>"#).unwrap();
        assert_eq!(page, Page::exhausted());
    }

    #[test]
    fn test_specific_container_wins_over_earlier_main() {
        let html = r#"
            <html><body>
              <main><p>Populære kategorier</p></main>
              <div id="page-results">
                <article class="sf-search-ad"><h2 class="h4">MacBook Air</h2></article>
              </div>
            </body></html>
        "#;
        let page = parse_market_page(html).unwrap();
        assert!(page.has_more);
        assert_eq!(page.records.len(), 1);
        let RawRecord::Market(ad) = &page.records[0] else { panic!("expected market ad") };
        assert_eq!(ad.title, "MacBook Air");
    }

    #[test]
    fn test_missing_container_is_last_page() {
        let page = parse_market_page("<html><body><div>maintenance</div></body></html>").unwrap();
        assert_eq!(page, Page::exhausted());
    }

    #[test]
    fn test_absolute_links_are_kept() {
        assert_eq!(absolute_url("https://example.org/a"), "https://example.org/a");
        assert_eq!(absolute_url("/item/7"), "https://www.finn.no/item/7");
    }
}
