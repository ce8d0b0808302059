// Test mocks for the investigation pipeline.
//
// One mock per trait boundary:
// - MockScraper (ListingScraper): HashMap-based URL -> ListingData
// - MockResearch (ResearchProvider): fixed per-query results, optional delay
// - RecordingDelivery (DeliveryBackend): captures payloads, can be told to fail
// - MockEmail (EmailNotifier) and MockFormFiller (FormFiller)
// - RecordingObserver (PipelineObserver): captures states and log entries
//
// Plus fixture builders for listings and research results.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use truthlayer_common::{
    AgentState, Confidence, DeliveryError, LandlordReport, ListingData, LogEntry,
    MarketComparison, MarketReport, NeighborhoodReport, Rating, ResearchBag, ResearchResult,
    ScamReport, ScamRiskLevel, ScrapeError, TruthReport, UserInfo,
};

use crate::actions::{ActionExecutor, DeliveryBackend, DeliveryTag, EmailNotifier, FormFiller};
use crate::pipeline::PipelineObserver;
use crate::research::ResearchProvider;
use crate::scrape::ListingScraper;

// ---------------------------------------------------------------------------
// MockScraper
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered URLs. Builder: `.on_listing()`.
#[derive(Default)]
pub struct MockScraper {
    listings: HashMap<String, ListingData>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_listing(mut self, listing: ListingData) -> Self {
        self.listings.insert(listing.url.clone(), listing);
        self
    }
}

#[async_trait]
impl ListingScraper for MockScraper {
    async fn scrape(&self, url: &str) -> Result<ListingData, ScrapeError> {
        self.listings
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Navigation(format!("MockScraper: no listing registered for {url}")))
    }
}

// ---------------------------------------------------------------------------
// MockResearch
// ---------------------------------------------------------------------------

/// Fixed results per query. Anything not set fails with "not mocked".
pub struct MockResearch {
    neighborhood: ResearchResult<NeighborhoodReport>,
    landlord: ResearchResult<LandlordReport>,
    market: ResearchResult<MarketReport>,
    scam: ResearchResult<ScamReport>,
    scam_delay: Option<Duration>,
    synthetic: bool,
}

impl Default for MockResearch {
    fn default() -> Self {
        Self {
            neighborhood: ResearchResult::failed("not mocked"),
            landlord: ResearchResult::failed("not mocked"),
            market: ResearchResult::failed("not mocked"),
            scam: ResearchResult::failed("not mocked"),
            scam_delay: None,
            synthetic: false,
        }
    }
}

impl MockResearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query succeeds with the given bag's results.
    pub fn from_bag(bag: ResearchBag) -> Self {
        Self {
            neighborhood: bag.neighborhood,
            landlord: bag.landlord,
            market: bag.market,
            scam: bag.scam,
            scam_delay: None,
            synthetic: bag.synthetic,
        }
    }

    pub fn with_neighborhood(mut self, result: ResearchResult<NeighborhoodReport>) -> Self {
        self.neighborhood = result;
        self
    }

    pub fn with_landlord(mut self, result: ResearchResult<LandlordReport>) -> Self {
        self.landlord = result;
        self
    }

    pub fn with_market(mut self, result: ResearchResult<MarketReport>) -> Self {
        self.market = result;
        self
    }

    pub fn with_scam(mut self, result: ResearchResult<ScamReport>) -> Self {
        self.scam = result;
        self
    }

    /// Make the scam query sleep before answering.
    pub fn with_scam_delay(mut self, delay: Duration) -> Self {
        self.scam_delay = Some(delay);
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }
}

#[async_trait]
impl ResearchProvider for MockResearch {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    async fn neighborhood(&self, _listing: &ListingData) -> ResearchResult<NeighborhoodReport> {
        self.neighborhood.clone()
    }

    async fn landlord(&self, _listing: &ListingData) -> ResearchResult<LandlordReport> {
        self.landlord.clone()
    }

    async fn market(&self, _listing: &ListingData) -> ResearchResult<MarketReport> {
        self.market.clone()
    }

    async fn scam(&self, _listing: &ListingData) -> ResearchResult<ScamReport> {
        if let Some(delay) = self.scam_delay {
            tokio::time::sleep(delay).await;
        }
        self.scam.clone()
    }
}

// ---------------------------------------------------------------------------
// RecordingDelivery
// ---------------------------------------------------------------------------

/// Captures every delivered payload. `failing()` rejects everything.
#[derive(Default)]
pub struct RecordingDelivery {
    delivered: Mutex<Vec<(DeliveryTag, Value)>>,
    fail: bool,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn delivered(&self) -> Vec<(DeliveryTag, Value)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn tags(&self) -> Vec<DeliveryTag> {
        self.delivered().into_iter().map(|(tag, _)| tag).collect()
    }
}

#[async_trait]
impl DeliveryBackend for RecordingDelivery {
    async fn deliver(&self, tag: DeliveryTag, data: &Value) -> Result<Value, DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Http {
                status: 500,
                message: "RecordingDelivery: configured to fail".to_string(),
            });
        }
        self.delivered.lock().unwrap().push((tag, data.clone()));
        Ok(json!({ "success": true, "stored": "recorded" }))
    }
}

// ---------------------------------------------------------------------------
// MockEmail / MockFormFiller
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockEmail {
    configured: bool,
    fail: bool,
    sent: Mutex<Vec<String>>,
}

impl MockEmail {
    pub fn configured() -> Self {
        Self {
            configured: true,
            ..Default::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            configured: true,
            fail: true,
            ..Default::default()
        }
    }

    /// URLs of listings an alert was sent for.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailNotifier for MockEmail {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send_listing_alert(
        &self,
        listing: &ListingData,
        _report: &TruthReport,
    ) -> anyhow::Result<()> {
        if !self.configured || self.fail {
            anyhow::bail!("MockEmail: cannot send");
        }
        self.sent.lock().unwrap().push(listing.url.clone());
        Ok(())
    }
}

pub struct MockFormFiller {
    succeed: bool,
    calls: Mutex<Vec<(String, UserInfo)>>,
}

impl MockFormFiller {
    pub fn succeeding() -> Self {
        Self {
            succeed: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, UserInfo)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormFiller for MockFormFiller {
    async fn fill_contact_form(&self, url: &str, user: &UserInfo) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), user.clone()));
        self.succeed
    }
}

/// Executor wired to the given delivery with no email and a failing form filler.
pub fn executor_with(delivery: Arc<RecordingDelivery>) -> ActionExecutor {
    ActionExecutor::new(
        delivery,
        Arc::new(MockEmail::default()),
        Arc::new(MockFormFiller::failing()),
    )
}

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingObserver {
    pub states: Vec<AgentState>,
    pub logs: Vec<LogEntry>,
}

impl PipelineObserver for RecordingObserver {
    fn state_changed(&mut self, state: AgentState) {
        self.states.push(state);
    }

    fn log(&mut self, entry: &LogEntry) {
        self.logs.push(entry.clone());
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const TEST_URL: &str = "https://sfbay.craigslist.org/apa/d/sunny-2br/123.html";

pub fn test_listing(url: &str) -> ListingData {
    ListingData {
        title: Some("Sunny 2BR near the park".to_string()),
        address: Some("123 Main St, San Francisco, CA".to_string()),
        rent: Some(3400),
        bedrooms: Some(2),
        bathrooms: Some(1.0),
        sqft: Some(900),
        description: Some("Bright two bedroom with bay windows.".to_string()),
        ..ListingData::new(url)
    }
}

pub fn test_user() -> UserInfo {
    UserInfo {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: Some("555-0100".to_string()),
        message: None,
    }
}

pub fn neighborhood(safety: f64, noise_level: f64) -> ResearchResult<NeighborhoodReport> {
    ResearchResult::completed(
        NeighborhoodReport {
            safety_score: Some(safety),
            crime_summary: Some("Quiet residential blocks".to_string()),
            noise_level: Some(noise_level),
            neighborhood_vibe: None,
            recent_incidents: Vec::new(),
        },
        Confidence::High,
        3,
    )
}

pub fn landlord(satisfaction: f64) -> ResearchResult<LandlordReport> {
    ResearchResult::completed(
        LandlordReport {
            landlord_reputation: Some(Rating::Good),
            building_maintenance: Some(Rating::Good),
            tenant_satisfaction: Some(satisfaction),
            red_flags: Vec::new(),
            positive_aspects: Vec::new(),
        },
        Confidence::High,
        2,
    )
}

pub fn market(comparison: Option<MarketComparison>, fair_rent: f64) -> ResearchResult<MarketReport> {
    ResearchResult::completed(
        MarketReport {
            market_comparison: comparison,
            estimated_fair_rent: Some(fair_rent),
            ..Default::default()
        },
        Confidence::Medium,
        2,
    )
}

pub fn scam(level: ScamRiskLevel) -> ResearchResult<ScamReport> {
    ResearchResult::completed(
        ScamReport {
            scam_risk_level: Some(level),
            authenticity_score: Some(8.0),
            ..Default::default()
        },
        Confidence::High,
        1,
    )
}

/// A bag where all four queries succeeded.
pub fn full_bag(
    neighborhood: ResearchResult<NeighborhoodReport>,
    landlord: ResearchResult<LandlordReport>,
    market: ResearchResult<MarketReport>,
    scam: ResearchResult<ScamReport>,
) -> ResearchBag {
    ResearchBag {
        neighborhood,
        landlord,
        market,
        scam,
        synthetic: false,
    }
}
