use crate::constants::BROWSER_HEADERS;
use crate::error::{Result, ScraperError};
use crate::metrics::ParserMetrics;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Downloads the results page and hands back a parsed document.
///
/// One GET per call, no retries. The browser-like headers make the request
/// look like a mobile Chrome navigation.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(browser_headers())
            .build()
            .map_err(|e| ScraperError::RequestConstruction(e.to_string()))?;

        Ok(Self { client })
    }

    #[instrument(skip(self))]
    pub async fn fetch_document(&self, url: &str) -> Result<Html> {
        let url = Url::parse(url)
            .map_err(|e| ScraperError::RequestConstruction(format!("invalid URL '{}': {}", url, e)))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        info!("Response status: {}", status);

        if status == StatusCode::NOT_MODIFIED {
            return Err(ScraperError::NotModified);
        }
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus { status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScraperError::DocumentParse(format!("failed to read response body: {}", e)))?;

        debug!("Fetched body of length: {}", body.len());
        ParserMetrics::record_fetch_bytes(body.len());

        Ok(Html::parse_document(&body))
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for &(name, value) in BROWSER_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}
