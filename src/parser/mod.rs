//! Results page scraping: fetch, extract, convert.

pub mod extractor;
pub mod fetcher;
pub mod id_generator;
pub mod normalize;
pub mod processor;
mod selectors;

pub use extractor::extract_page;
pub use fetcher::PageFetcher;
pub use id_generator::IdGenerator;
pub use processor::{CandidateConverter, FightProcessor, ProcessorSettings, RecordConverter};

use crate::config::ScraperConfig;
use crate::error::Result;
use crate::metrics::ParserMetrics;
use crate::types::{ExtractedPage, FightRecord};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Scrapes one results page into fight records.
///
/// Meant to be built once and shared: the id generator inside lives as long as
/// the parser, so ids keep counting up across scrapes.
pub struct FightParser {
    source_url: String,
    fetcher: PageFetcher,
    processor: FightProcessor,
    ids: Arc<IdGenerator>,
}

impl FightParser {
    pub fn new(
        source_url: impl Into<String>,
        request_timeout: Duration,
        settings: ProcessorSettings,
    ) -> Result<Self> {
        Ok(Self {
            source_url: source_url.into(),
            fetcher: PageFetcher::new(request_timeout)?,
            processor: FightProcessor::new(settings),
            ids: Arc::new(IdGenerator::new()),
        })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        Self::new(
            config.source_url.clone(),
            config.request_timeout(),
            config.processor_settings(),
        )
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Fetch the page and convert every fight row on it.
    ///
    /// Errors only for fetch-level failures. An empty vector means nothing
    /// usable was found, whether because no rows matched or because every
    /// row failed conversion.
    #[instrument(skip(self), fields(url = %self.source_url))]
    pub async fn parse_fights(&self) -> Result<Vec<FightRecord>> {
        info!("Starting parse of fight data");
        let started = Instant::now();

        let page = match self.fetch_and_extract().await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to fetch HTML document: {}", e);
                ParserMetrics::record_scrape_error();
                return Err(e);
            }
        };

        if page.candidates.is_empty() {
            info!("No fight events found in the HTML document");
            ParserMetrics::record_scrape_success(0, started.elapsed().as_secs_f64());
            return Ok(Vec::new());
        }

        info!(
            "Found {} fight events, starting concurrent parsing",
            page.candidates.len()
        );

        let converter = Arc::new(RecordConverter::new(self.ids.clone(), page.context));
        let fights = self.processor.process_all(page.candidates, converter).await;

        info!("Successfully parsed {} fights", fights.len());
        ParserMetrics::record_scrape_success(fights.len(), started.elapsed().as_secs_f64());
        Ok(fights)
    }

    /// The document never outlives this call, so the caller's future stays
    /// `Send`.
    async fn fetch_and_extract(&self) -> Result<ExtractedPage> {
        let document = self.fetcher.fetch_document(&self.source_url).await?;
        Ok(extract_page(&document))
    }
}
