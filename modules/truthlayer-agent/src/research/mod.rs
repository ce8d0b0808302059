pub mod parallel;
pub mod synthetic;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};
use truthlayer_common::{
    Config, LandlordReport, ListingData, MarketReport, NeighborhoodReport, PipelineError,
    ResearchBag, ResearchResult, ScamReport, ScamRisk,
};

pub use parallel::ParallelResearch;
pub use synthetic::SyntheticResearch;

/// Extra time on top of a provider's own polling budget before a query is
/// abandoned.
const QUERY_TIMEOUT_SLACK: Duration = Duration::from_secs(15);

/// One research backend. Each query reports its own outcome; transport and
/// parse failures come back as unsuccessful results, never as errors.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_synthetic(&self) -> bool {
        false
    }

    /// Longest a single query may legitimately take.
    fn max_wait(&self) -> Duration {
        Duration::from_secs(30)
    }

    async fn neighborhood(&self, listing: &ListingData) -> ResearchResult<NeighborhoodReport>;
    async fn landlord(&self, listing: &ListingData) -> ResearchResult<LandlordReport>;
    async fn market(&self, listing: &ListingData) -> ResearchResult<MarketReport>;
    async fn scam(&self, listing: &ListingData) -> ResearchResult<ScamReport>;
}

/// Fans a listing out to four concurrent research queries and merges the
/// outcomes into one bag. A failed or timed-out query never affects the others.
pub struct ResearchAggregator {
    provider: Arc<dyn ResearchProvider>,
    fallback: Arc<dyn ResearchProvider>,
    query_timeout: Duration,
}

impl ResearchAggregator {
    pub fn new(provider: Arc<dyn ResearchProvider>) -> Self {
        let query_timeout = provider.max_wait() + QUERY_TIMEOUT_SLACK;
        Self {
            provider,
            fallback: Arc::new(SyntheticResearch::new()),
            query_timeout,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn ResearchProvider>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Real research when `PARALLEL_API_KEY` is set, synthetic otherwise.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let parallel = ParallelResearch::from_config(config)
            .map_err(|e| PipelineError::Setup(format!("research client: {e}")))?;
        Ok(match parallel {
            Some(parallel) => {
                info!("Research provider: parallel");
                Self::new(Arc::new(parallel))
            }
            None => {
                info!("PARALLEL_API_KEY not set, research will be synthetic");
                Self::new(Arc::new(SyntheticResearch::new()))
            }
        })
    }

    /// Whether a real provider is configured.
    pub fn is_live(&self) -> bool {
        !self.provider.is_synthetic()
    }

    pub async fn investigate(&self, listing: &ListingData) -> ResearchBag {
        let provider = if self.is_live() && listing.address.is_none() {
            warn!(url = %listing.url, "Listing has no address, using synthetic research");
            &self.fallback
        } else {
            &self.provider
        };

        let (neighborhood, landlord, market, scam) = tokio::join!(
            bounded("neighborhood", self.query_timeout, provider.neighborhood(listing)),
            bounded("landlord", self.query_timeout, provider.landlord(listing)),
            bounded("market", self.query_timeout, provider.market(listing)),
            bounded("scam", self.query_timeout, provider.scam(listing)),
        );

        let bag = ResearchBag {
            neighborhood,
            landlord,
            market,
            scam,
            synthetic: provider.is_synthetic(),
        };

        info!(
            provider = provider.name(),
            succeeded = bag.succeeded(),
            synthetic = bag.synthetic,
            "Research complete"
        );
        bag
    }
}

async fn bounded<T, F>(query: &'static str, limit: Duration, fut: F) -> ResearchResult<T>
where
    F: Future<Output = ResearchResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(query, timeout_secs = limit.as_secs_f64(), "Research query timed out");
            ResearchResult::failed(format!("{query} research timed out"))
        }
    }
}

/// Red flags worth surfacing right after research, before scoring.
pub fn potential_issues(bag: &ResearchBag) -> Vec<&'static str> {
    let mut issues = Vec::new();

    if bag
        .neighborhood
        .ok()
        .and_then(|n| n.safety_score)
        .is_some_and(|s| s < 7.0)
    {
        issues.push("safety concerns");
    }
    if bag
        .scam
        .ok()
        .and_then(|s| s.scam_risk_level)
        .is_some_and(|level| ScamRisk::from(level) == ScamRisk::High)
    {
        issues.push("scam indicators");
    }
    if bag
        .market
        .ok()
        .and_then(|m| m.market_comparison)
        .is_some_and(|c| c.is_overpriced())
    {
        issues.push("overpriced");
    }

    issues
}
