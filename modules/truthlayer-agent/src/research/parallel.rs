use std::time::Duration;

use async_trait::async_trait;
use parallel_client::{
    json_schema_for, CitationConfidence, FieldBasis, ParallelClient, ParallelError, Processor,
    TaskRequest,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use truthlayer_common::{
    Config, Confidence, LandlordReport, ListingData, MarketReport, NeighborhoodReport,
    ResearchResult, ScamReport,
};

use super::ResearchProvider;

/// Research backed by the Parallel task API. Each query is one task run with
/// a strict JSON output schema derived from the report type.
pub struct ParallelResearch {
    client: ParallelClient,
}

impl ParallelResearch {
    pub fn new(client: ParallelClient) -> Self {
        Self { client }
    }

    /// `Ok(None)` when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, ParallelError> {
        let Some(api_key) = config.parallel_api_key.clone() else {
            return Ok(None);
        };
        let client = ParallelClient::with_timeout(api_key, config.http_timeout)?
            .with_base_url(&config.parallel_base_url)
            .with_polling(Duration::from_secs(5), config.research_max_wait);
        Ok(Some(Self::new(client)))
    }

    async fn run<T>(&self, query: &'static str, input: String) -> ResearchResult<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let request = TaskRequest::json(input, json_schema_for::<T>(), Processor::Core);

        let output = match self.client.run_task(&request).await {
            Ok(output) => output,
            Err(e) => {
                warn!(query, error = %e, "Research task failed");
                return ResearchResult::failed(e.to_string());
            }
        };

        let confidence = overall_confidence(&output.basis);
        let citations = output.basis.iter().map(|b| b.citations.len()).sum();

        match serde_json::from_value::<T>(output.content) {
            Ok(data) => {
                info!(query, ?confidence, citations, "Research task completed");
                ResearchResult::completed(data, confidence, citations)
            }
            Err(e) => {
                warn!(query, error = %e, "Research output did not match schema");
                ResearchResult::failed(format!("Malformed research output: {e}"))
            }
        }
    }
}

#[async_trait]
impl ResearchProvider for ParallelResearch {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn max_wait(&self) -> Duration {
        self.client.max_wait()
    }

    async fn neighborhood(&self, listing: &ListingData) -> ResearchResult<NeighborhoodReport> {
        self.run("neighborhood", neighborhood_prompt(listing)).await
    }

    async fn landlord(&self, listing: &ListingData) -> ResearchResult<LandlordReport> {
        self.run("landlord", landlord_prompt(listing)).await
    }

    async fn market(&self, listing: &ListingData) -> ResearchResult<MarketReport> {
        self.run("market", market_prompt(listing)).await
    }

    async fn scam(&self, listing: &ListingData) -> ResearchResult<ScamReport> {
        self.run("scam", scam_prompt(listing)).await
    }
}

/// Collapse per-field confidence labels into one rating: more than 60% high
/// is high, more than 60% high-or-medium is medium, anything else is low.
pub fn overall_confidence(basis: &[FieldBasis]) -> Confidence {
    if basis.is_empty() {
        return Confidence::Low;
    }

    let total = basis.len() as f64;
    let high = basis
        .iter()
        .filter(|b| b.confidence == Some(CitationConfidence::High))
        .count() as f64;
    let medium = basis
        .iter()
        .filter(|b| b.confidence == Some(CitationConfidence::Medium))
        .count() as f64;

    if high / total > 0.6 {
        Confidence::High
    } else if (high + medium) / total > 0.6 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn address(listing: &ListingData) -> &str {
    listing.address.as_deref().unwrap_or(&listing.url)
}

pub fn neighborhood_prompt(listing: &ListingData) -> String {
    format!(
        "Research the safety, noise levels, and general neighborhood characteristics for {}. \
         Look for crime statistics, noise complaints, construction activity, and community \
         discussions about this area.",
        address(listing)
    )
}

pub fn landlord_prompt(listing: &ListingData) -> String {
    let landlord = listing
        .contact_info
        .as_ref()
        .and_then(|c| c.name.as_deref());
    match landlord {
        Some(name) => format!(
            "Research landlord \"{name}\" and building at {} for reputation, reviews, \
             complaints, and maintenance issues",
            address(listing)
        ),
        None => format!(
            "Research the building management and landlord reputation for {}, including \
             tenant reviews, maintenance complaints, and management quality",
            address(listing)
        ),
    }
}

pub fn market_prompt(listing: &ListingData) -> String {
    let mut prompt = format!(
        "Analyze the rental value for {} at ${}/month",
        address(listing),
        listing.rent.unwrap_or(0)
    );
    if let Some(bedrooms) = listing.bedrooms {
        prompt.push_str(&format!(" with {bedrooms} bedrooms"));
    }
    if let Some(sqft) = listing.sqft {
        prompt.push_str(&format!(" and {sqft} sqft"));
    }
    prompt.push_str(
        ". Compare to similar properties in the area and identify any typical hidden fees \
         or additional costs.",
    );
    prompt
}

pub fn scam_prompt(listing: &ListingData) -> String {
    format!(
        "Analyze this rental listing for potential scam indicators:\n\n\
         Address: {}\nRent: ${}\nListing Description: {}\n\n\
         Check for common rental scam patterns, unrealistic pricing, suspicious language, \
         and authenticity issues.",
        address(listing),
        listing.rent.unwrap_or(0),
        listing.description.as_deref().unwrap_or("")
    )
}
