//! Truth report synthesis.
//!
//! `score` is a pure function of the listing, the research bag and the user's
//! priorities. Missing research never fails scoring: every component has a
//! default, and evidence is only emitted for categories whose query succeeded.

use truthlayer_common::{
    ActionRecommendation, Evidence, EvidenceCategory, ListingData, MarketComparison, MarketReport,
    Priorities, ResearchBag, ScamRisk, ScoreCard, Sentiment, TruthReport, UserPreferences,
    Verdict,
};

const DEFAULT_SAFETY: f64 = 7.0;
const DEFAULT_NOISE_LEVEL: f64 = 3.0;
const COMMUTE_NOT_ASSESSED: &str = "Not assessed";

/// Value tier derived from market research.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueAssessment {
    pub score: f64,
    pub label: &'static str,
    pub sentiment: Sentiment,
}

impl ValueAssessment {
    const UNKNOWN: Self = Self::tier(5.0, "Unknown", Sentiment::Neutral);
    const GREAT_DEAL: Self = Self::tier(9.0, "Great Deal", Sentiment::Positive);
    const GOOD_VALUE: Self = Self::tier(7.0, "Good Value", Sentiment::Positive);
    const FAIR_PRICE: Self = Self::tier(5.0, "Fair Price", Sentiment::Neutral);
    const OVERPRICED: Self = Self::tier(3.0, "Overpriced", Sentiment::Negative);
    const VERY_OVERPRICED: Self = Self::tier(1.0, "Very Overpriced", Sentiment::Negative);

    const fn tier(score: f64, label: &'static str, sentiment: Sentiment) -> Self {
        Self {
            score,
            label,
            sentiment,
        }
    }
}

/// Finite 0-10 axis value, or `None` for garbage.
fn axis(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 10.0))
}

/// Scam bucket. An absent scam query is Medium: unknown is not safe.
pub fn scam_risk(bag: &ResearchBag) -> ScamRisk {
    match bag.scam.ok() {
        None => ScamRisk::Medium,
        Some(report) => report
            .scam_risk_level
            .map(ScamRisk::from)
            .unwrap_or(ScamRisk::Low),
    }
}

/// Value tier for a listing. A market comparison label wins over the numeric
/// deviation from the estimated fair rent.
pub fn assess_value(market: Option<&MarketReport>, rent: Option<u32>) -> ValueAssessment {
    let Some(market) = market else {
        return ValueAssessment::UNKNOWN;
    };

    if let Some(label) = market.market_comparison {
        return match label {
            MarketComparison::SignificantlyUnderpriced => ValueAssessment::GREAT_DEAL,
            MarketComparison::BelowMarket => ValueAssessment::GOOD_VALUE,
            MarketComparison::FairMarketValue => ValueAssessment::FAIR_PRICE,
            MarketComparison::AboveMarket => ValueAssessment::OVERPRICED,
            MarketComparison::SignificantlyOverpriced => ValueAssessment::VERY_OVERPRICED,
        };
    }

    let diff = percent_diff(rent.map(f64::from), market.estimated_fair_rent);
    value_tier(diff)
}

/// Percent deviation of rent from fair rent. A missing or non-positive fair
/// rent means the listing rent is taken as fair.
pub fn percent_diff(rent: Option<f64>, fair_rent: Option<f64>) -> f64 {
    let Some(rent) = rent else {
        return 0.0;
    };
    match fair_rent.filter(|f| f.is_finite() && *f > 0.0) {
        Some(fair) => (rent - fair) / fair * 100.0,
        None => 0.0,
    }
}

pub fn value_tier(percent_diff: f64) -> ValueAssessment {
    if percent_diff < -10.0 {
        ValueAssessment::GREAT_DEAL
    } else if percent_diff < -5.0 {
        ValueAssessment::GOOD_VALUE
    } else if percent_diff.abs() <= 5.0 {
        ValueAssessment::FAIR_PRICE
    } else if percent_diff > 5.0 {
        ValueAssessment::OVERPRICED
    } else {
        ValueAssessment::VERY_OVERPRICED
    }
}

/// Weighted 0-100 score. Scam risk always carries weight 1. Only the weighted
/// sum is rounded; the quotient stays fractional so thresholds see the real
/// value.
pub fn overall_score(
    safety: f64,
    noise: f64,
    scam: ScamRisk,
    value: f64,
    priorities: &Priorities,
) -> f64 {
    let w_safety = Priorities::weight(priorities.safety);
    let w_noise = Priorities::weight(priorities.quietness);
    let w_value = Priorities::weight(priorities.value);

    let numerator = (safety * w_safety * 10.0
        + noise * w_noise * 10.0
        + scam.component() * 10.0
        + value * w_value * 10.0)
        .round();
    let score = numerator / (w_safety + w_noise + w_value + 1.0);

    score.clamp(0.0, 100.0)
}

pub fn verdict(scam: ScamRisk, safety: f64, overall: f64) -> Verdict {
    if scam == ScamRisk::High || safety < 4.0 {
        Verdict::Avoid
    } else if overall < 60.0 || scam == ScamRisk::Medium || safety < 6.0 {
        Verdict::Caution
    } else {
        Verdict::Recommended
    }
}

pub fn recommend(verdict: Verdict, overall: f64) -> ActionRecommendation {
    match verdict {
        Verdict::Avoid => ActionRecommendation::Blacklist,
        Verdict::Recommended if overall > 80.0 => ActionRecommendation::ScheduleTour,
        _ => ActionRecommendation::Shortlist,
    }
}

pub fn score(listing: &ListingData, bag: &ResearchBag, prefs: &UserPreferences) -> TruthReport {
    let neighborhood = bag.neighborhood.ok();
    let landlord = bag.landlord.ok();
    let market = bag.market.ok();

    let safety = axis(neighborhood.and_then(|n| n.safety_score)).unwrap_or(DEFAULT_SAFETY);
    let noise_level =
        axis(neighborhood.and_then(|n| n.noise_level)).unwrap_or(DEFAULT_NOISE_LEVEL);
    let noise = 10.0 - noise_level;
    let scam = scam_risk(bag);
    let value = assess_value(market, listing.rent);

    let overall = overall_score(safety, noise, scam, value.score, &prefs.priorities);
    let verdict = verdict(scam, safety, overall);

    let mut evidence = Vec::new();

    if let Some(n) = neighborhood {
        evidence.push(Evidence {
            category: EvidenceCategory::Safety,
            points: vec![
                format!("Safety score: {safety}/10"),
                n.crime_summary
                    .clone()
                    .unwrap_or_else(|| "Crime data analyzed".to_string()),
            ],
            sentiment: Sentiment::from_score(safety),
        });

        let mut points = vec![format!("Noise level: {noise_level}/10")];
        points.extend(n.recent_incidents.iter().cloned());
        evidence.push(Evidence {
            category: EvidenceCategory::Noise,
            points,
            sentiment: Sentiment::from_score(noise),
        });
    }

    if let Some(l) = landlord {
        let reputation = l
            .landlord_reputation
            .map(|r| r.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let mut points = vec![format!("Reputation: {reputation}")];
        points.extend(l.red_flags.iter().cloned());

        let satisfied = l.tenant_satisfaction.is_some_and(|s| s >= 7.0);
        evidence.push(Evidence {
            category: EvidenceCategory::Landlord,
            points,
            sentiment: if satisfied {
                Sentiment::Positive
            } else {
                Sentiment::Neutral
            },
        });
    }

    if let Some(m) = market {
        let comparison = m
            .market_comparison
            .unwrap_or(MarketComparison::FairMarketValue);
        let fair_rent = m
            .estimated_fair_rent
            .filter(|f| f.is_finite() && *f > 0.0)
            .or(listing.rent.map(f64::from));
        let fair_rent_point = match fair_rent {
            Some(f) => format!("Estimated fair rent: ${f:.0}"),
            None => "Estimated fair rent: not available".to_string(),
        };
        evidence.push(Evidence {
            category: EvidenceCategory::Value,
            points: vec![format!("Market comparison: {comparison}"), fair_rent_point],
            sentiment: value.sentiment,
        });
    }

    let mut highlights = Vec::new();
    if safety >= 7.0 {
        highlights.push("safe area");
    }
    if noise >= 7.0 {
        highlights.push("quiet location");
    }
    if scam == ScamRisk::Low {
        highlights.push("legitimate listing");
    }
    if value.sentiment == Sentiment::Positive {
        highlights.push("good value");
    }
    let summary = if highlights.is_empty() {
        "Mixed signals found - review details carefully.".to_string()
    } else {
        format!("This property offers {}.", highlights.join(", "))
    };

    TruthReport {
        verdict,
        verdict_title: verdict.title().to_string(),
        overall_score: overall,
        scores: ScoreCard {
            scam_risk: scam,
            safety,
            noise,
            value: value.label.to_string(),
            commute: COMMUTE_NOT_ASSESSED.to_string(),
        },
        evidence,
        summary,
        action_recommendation: recommend(verdict, overall),
    }
}
