use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use truthlayer_common::{
    Confidence, LandlordReport, ListingData, MarketComparison, MarketReport, NeighborhoodReport,
    Rating, ResearchResult, ScamReport, ScamRiskLevel,
};

use super::ResearchProvider;

const DEFAULT_RENT: f64 = 3000.0;

/// Plausible stand-in research used when no real provider can run. Results
/// are clearly flagged as synthetic in the research bag.
pub struct SyntheticResearch {
    rng: Mutex<StdRng>,
}

impl SyntheticResearch {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible output for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn sample(&self, low: f64, high: f64) -> f64 {
        let value = match self.rng.lock() {
            Ok(mut rng) => rng.random_range(low..high),
            Err(poisoned) => poisoned.into_inner().random_range(low..high),
        };
        (value * 10.0).round() / 10.0
    }
}

impl Default for SyntheticResearch {
    fn default() -> Self {
        Self::new()
    }
}

fn rent_of(listing: &ListingData) -> f64 {
    listing.rent.map(f64::from).unwrap_or(DEFAULT_RENT)
}

#[async_trait]
impl ResearchProvider for SyntheticResearch {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn is_synthetic(&self) -> bool {
        true
    }

    async fn neighborhood(&self, _listing: &ListingData) -> ResearchResult<NeighborhoodReport> {
        let safety = self.sample(6.0, 9.0);
        let noise = self.sample(2.0, 8.0);

        let crime_summary = if safety > 7.0 {
            "Low crime area with recent improvements"
        } else {
            "Moderate crime levels, stay aware"
        };
        let recent_incidents = if noise > 6.0 {
            vec![
                "Construction permit active nearby".to_string(),
                "Late-night venue complaints".to_string(),
            ]
        } else {
            Vec::new()
        };

        ResearchResult::completed(
            NeighborhoodReport {
                safety_score: Some(safety),
                crime_summary: Some(crime_summary.to_string()),
                noise_level: Some(noise),
                neighborhood_vibe: Some("Young professionals and families".to_string()),
                recent_incidents,
            },
            Confidence::Medium,
            0,
        )
    }

    async fn landlord(&self, _listing: &ListingData) -> ResearchResult<LandlordReport> {
        ResearchResult::completed(
            LandlordReport {
                landlord_reputation: Some(Rating::Good),
                building_maintenance: Some(Rating::Fair),
                tenant_satisfaction: Some(6.5),
                red_flags: Vec::new(),
                positive_aspects: vec!["Responsive to maintenance requests".to_string()],
            },
            Confidence::Medium,
            0,
        )
    }

    async fn market(&self, listing: &ListingData) -> ResearchResult<MarketReport> {
        let rent = rent_of(listing);
        let comparison = if rent > 3500.0 {
            MarketComparison::AboveMarket
        } else if rent < 2800.0 {
            MarketComparison::BelowMarket
        } else {
            MarketComparison::FairMarketValue
        };
        let factor = self.sample(0.9, 1.1);

        ResearchResult::completed(
            MarketReport {
                market_comparison: Some(comparison),
                estimated_fair_rent: Some((rent * factor).round()),
                price_per_sqft: None,
                hidden_fees_common: Vec::new(),
                value_assessment: Some("Typical for the area".to_string()),
            },
            Confidence::Medium,
            0,
        )
    }

    async fn scam(&self, _listing: &ListingData) -> ResearchResult<ScamReport> {
        ResearchResult::completed(
            ScamReport {
                scam_risk_level: Some(ScamRiskLevel::Low),
                scam_indicators: Vec::new(),
                authenticity_score: Some(8.0),
                recommendations: vec!["Verify identity during tour".to_string()],
            },
            Confidence::High,
            0,
        )
    }
}
