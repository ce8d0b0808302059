pub mod extract;

use std::time::Duration;

use async_trait::async_trait;
use browserless_client::{BrowserlessClient, BrowserlessError};
use tracing::{debug, info};
use truthlayer_common::{Config, ListingData, ScrapeError};

pub use extract::SiteFamily;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// URL in, normalized listing out. Single attempt per call.
#[async_trait]
pub trait ListingScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ListingData, ScrapeError>;
}

/// Transport that turns a URL into page HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Reject anything that is not an absolute http(s) URL.
pub fn validate_url(url: &str) -> Result<url::Url, ScrapeError> {
    let parsed = url::Url::parse(url).map_err(|e| ScrapeError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ScrapeError::InvalidUrl(format!(
            "{url}: unsupported scheme '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Page sources
// ---------------------------------------------------------------------------

/// Rendered page content through a Browserless instance.
pub struct BrowserlessPageSource {
    client: BrowserlessClient,
}

impl BrowserlessPageSource {
    pub fn new(client: BrowserlessClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for BrowserlessPageSource {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.client.content(url).await.map_err(|e| match e {
            BrowserlessError::Timeout(_) => ScrapeError::Timeout,
            other => ScrapeError::Navigation(other.to_string()),
        })
    }
}

/// Plain HTTP GET. Misses client-rendered content but needs no browser.
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )
            .build()
            .map_err(|e| ScrapeError::Navigation(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Timeout
            } else {
                ScrapeError::Navigation(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Navigation(format!("{url} returned {status}")));
        }

        resp.text().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::Timeout
            } else {
                ScrapeError::Navigation(e.to_string())
            }
        })
    }
}

// ---------------------------------------------------------------------------
// PageScraper
// ---------------------------------------------------------------------------

/// Fetches a page through a [`PageSource`] and runs the site extractor on it.
pub struct PageScraper {
    source: Box<dyn PageSource>,
}

impl PageScraper {
    pub fn new(source: Box<dyn PageSource>) -> Self {
        Self { source }
    }

    /// Browserless when configured, plain HTTP otherwise.
    pub fn from_config(config: &Config) -> Result<Self, ScrapeError> {
        let source: Box<dyn PageSource> = match config.browserless_url.as_deref() {
            Some(base_url) => {
                let client = BrowserlessClient::with_timeout(
                    base_url,
                    config.browserless_token.as_deref(),
                    config.http_timeout,
                )
                .map_err(|e| ScrapeError::Navigation(e.to_string()))?;
                info!("Scraping through Browserless");
                Box::new(BrowserlessPageSource::new(client))
            }
            None => {
                info!("BROWSERLESS_URL not set, scraping with plain HTTP");
                Box::new(HttpPageSource::new(config.http_timeout)?)
            }
        };
        Ok(Self::new(source))
    }
}

#[async_trait]
impl ListingScraper for PageScraper {
    async fn scrape(&self, url: &str) -> Result<ListingData, ScrapeError> {
        validate_url(url)?;

        let html = self.source.fetch(url).await?;
        let family = SiteFamily::from_url(url);
        let listing = extract::extract(url, &html);

        debug!(
            url,
            site = ?family,
            rent = ?listing.rent,
            bedrooms = ?listing.bedrooms,
            has_address = listing.address.is_some(),
            "Listing extracted"
        );
        Ok(listing)
    }
}
