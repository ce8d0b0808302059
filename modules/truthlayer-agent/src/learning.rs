//! Persistent source-reliability weights and listing history.
//!
//! The whole store is one JSON document. Every mutation flushes it to disk via
//! a temp file and rename, so a crash never leaves a half-written record.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use truthlayer_common::{
    Confidence, FeedbackHints, FeedbackKind, ResearchBag, Sentiment, SourceWeight, StoreError,
    Trend, TruthReport, Verdict,
};

pub const HISTORY_LIMIT: usize = 100;

const ACCURATE_DELTA: i16 = 5;
const INACCURATE_DELTA: i16 = -10;
const UNKNOWN_SOURCE_RELIABILITY: u8 = 50;

pub const CITY_RECORDS: &str = "City Records";
pub const OFFICIAL_LISTING: &str = "Official Listing";
pub const REDDIT_COMMUNITY: &str = "Reddit Community";
pub const GOOGLE_REVIEWS: &str = "Google Reviews";

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWeight {
    reliability: u8,
    trend: Trend,
    last_updated: DateTime<Utc>,
}

impl StoredWeight {
    fn new(reliability: u8, trend: Trend) -> Self {
        Self {
            reliability,
            trend,
            last_updated: Utc::now(),
        }
    }
}

/// Multipliers nudged by feedback hints. Stored for future tuning; scoring
/// does not read them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreferenceMultipliers {
    pub safety: f64,
    pub noise: f64,
    pub value: f64,
    pub commute: f64,
}

impl Default for PreferenceMultipliers {
    fn default() -> Self {
        Self {
            safety: 1.0,
            noise: 1.0,
            value: 1.0,
            commute: 1.0,
        }
    }
}

impl PreferenceMultipliers {
    fn apply(&mut self, hints: &FeedbackHints) {
        if hints.safety_too_high {
            self.safety *= 0.9;
        }
        if hints.noise_too_low {
            self.noise *= 1.1;
        }
        if hints.value_too_strict {
            self.value *= 0.9;
        }
        if hints.commute_too_important {
            self.commute *= 0.9;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingOutcome {
    Recommended,
    Caution,
    Avoid,
    Shortlisted,
    Blacklisted,
}

impl From<Verdict> for ListingOutcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Recommended => ListingOutcome::Recommended,
            Verdict::Caution => ListingOutcome::Caution,
            Verdict::Avoid => ListingOutcome::Avoid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserFeedback {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub url: String,
    pub verdict: ListingOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<UserFeedback>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnedPatterns {
    /// False-positive descriptions from negative feedback.
    #[serde(default)]
    pub scam_indicators: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Memory {
    source_weights: BTreeMap<String, StoredWeight>,
    #[serde(default)]
    user_preference_multipliers: PreferenceMultipliers,
    #[serde(default)]
    listing_history: Vec<HistoryEntry>,
    #[serde(default)]
    learned_patterns: LearnedPatterns,
}

impl Default for Memory {
    fn default() -> Self {
        let source_weights = [
            (CITY_RECORDS, 95, Trend::Stable),
            (OFFICIAL_LISTING, 80, Trend::Down),
            (REDDIT_COMMUNITY, 65, Trend::Up),
            (GOOGLE_REVIEWS, 70, Trend::Stable),
        ]
        .into_iter()
        .map(|(name, reliability, trend)| (name.to_string(), StoredWeight::new(reliability, trend)))
        .collect();

        Self {
            source_weights,
            user_preference_multipliers: PreferenceMultipliers::default(),
            listing_history: Vec::new(),
            learned_patterns: LearnedPatterns::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// LearningStore
// ---------------------------------------------------------------------------

/// What a feedback call changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackOutcome {
    /// Sources penalized as contributors to a false positive.
    pub penalized: Vec<SourceWeight>,
    pub false_positives: Vec<String>,
}

pub struct LearningStore {
    path: PathBuf,
    memory: Memory,
}

impl LearningStore {
    /// Open the store at `path`. A missing file yields the default weights.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let memory = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No learning store yet, starting from defaults");
                Memory::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, memory })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.memory)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn weights(&self) -> Vec<SourceWeight> {
        self.memory
            .source_weights
            .iter()
            .map(|(source, w)| SourceWeight {
                source: source.clone(),
                reliability: w.reliability,
                trend: w.trend,
            })
            .collect()
    }

    pub fn weight(&self, source: &str) -> Option<SourceWeight> {
        self.memory.source_weights.get(source).map(|w| SourceWeight {
            source: source.to_string(),
            reliability: w.reliability,
            trend: w.trend,
        })
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.memory.listing_history
    }

    pub fn multipliers(&self) -> &PreferenceMultipliers {
        &self.memory.user_preference_multipliers
    }

    pub fn learned_patterns(&self) -> &LearnedPatterns {
        &self.memory.learned_patterns
    }

    /// +5 for accurate (cap 100), -10 for inaccurate (floor 0).
    pub fn record_outcome(&mut self, source: &str, accurate: bool) -> Result<SourceWeight, StoreError> {
        let updated = self.apply_outcome(source, accurate);
        self.flush()?;
        Ok(updated)
    }

    fn apply_outcome(&mut self, source: &str, accurate: bool) -> SourceWeight {
        let entry = self
            .memory
            .source_weights
            .entry(source.to_string())
            .or_insert_with(|| StoredWeight::new(UNKNOWN_SOURCE_RELIABILITY, Trend::Stable));

        let delta = if accurate { ACCURATE_DELTA } else { INACCURATE_DELTA };
        let old = entry.reliability;
        let new = (i16::from(old) + delta).clamp(0, 100) as u8;

        entry.reliability = new;
        entry.trend = match new.cmp(&old) {
            std::cmp::Ordering::Greater => Trend::Up,
            std::cmp::Ordering::Less => Trend::Down,
            std::cmp::Ordering::Equal => Trend::Stable,
        };
        entry.last_updated = Utc::now();

        debug!(source, old, new, trend = %entry.trend, "Source reliability updated");
        SourceWeight {
            source: source.to_string(),
            reliability: new,
            trend: entry.trend,
        }
    }

    /// Learn from research confidence: a successful query whose confidence is
    /// high counts as accurate for its source. Synthetic research teaches nothing.
    pub fn learn_from_research(&mut self, bag: &ResearchBag) -> Result<Vec<SourceWeight>, StoreError> {
        if bag.synthetic {
            debug!("Skipping learning from synthetic research");
            return Ok(Vec::new());
        }

        let mut updated = Vec::new();
        if bag.neighborhood.success {
            let accurate = bag.neighborhood.confidence == Some(Confidence::High);
            updated.push(self.apply_outcome(CITY_RECORDS, accurate));
        }
        if bag.landlord.success {
            let accurate = bag.landlord.confidence == Some(Confidence::High);
            updated.push(self.apply_outcome(GOOGLE_REVIEWS, accurate));
        }

        if !updated.is_empty() {
            self.flush()?;
        }
        Ok(updated)
    }

    /// Record a listing outcome in history, replacing any earlier entry for the URL.
    pub fn record_listing(&mut self, url: &str, outcome: ListingOutcome) -> Result<(), StoreError> {
        self.push_history(url, outcome, None);
        self.flush()
    }

    fn push_history(&mut self, url: &str, verdict: ListingOutcome, feedback: Option<UserFeedback>) {
        let history = &mut self.memory.listing_history;
        history.retain(|h| h.url != url);
        history.push(HistoryEntry {
            url: url.to_string(),
            verdict,
            user_feedback: feedback,
            timestamp: Utc::now(),
        });
        if history.len() > HISTORY_LIMIT {
            let excess = history.len() - HISTORY_LIMIT;
            history.drain(..excess);
        }
    }

    /// Apply thumbs up/down on a report. Thumbs down on a RECOMMENDED verdict
    /// penalizes every source behind a positive evidence category.
    pub fn record_feedback(
        &mut self,
        url: &str,
        kind: FeedbackKind,
        hints: &FeedbackHints,
        report: &TruthReport,
    ) -> Result<FeedbackOutcome, StoreError> {
        if !hints.is_empty() {
            self.memory.user_preference_multipliers.apply(hints);
        }

        let feedback = match kind {
            FeedbackKind::ThumbsUp => UserFeedback::Positive,
            FeedbackKind::ThumbsDown => UserFeedback::Negative,
        };
        self.push_history(url, report.verdict.into(), Some(feedback));

        let mut outcome = FeedbackOutcome::default();
        if kind == FeedbackKind::ThumbsDown && report.verdict == Verdict::Recommended {
            for evidence in report
                .evidence
                .iter()
                .filter(|e| e.sentiment == Sentiment::Positive)
            {
                let source = evidence.category.source();
                outcome.penalized.push(self.apply_outcome(source, false));

                let pattern = format!(
                    "False positive: {} - {}",
                    evidence.category,
                    evidence.points.first().map(String::as_str).unwrap_or("")
                );
                warn!(url, source, pattern = %pattern, "Candidate false positive");
                self.memory
                    .learned_patterns
                    .scam_indicators
                    .push(pattern.clone());
                outcome.false_positives.push(pattern);
            }
        }

        self.flush()?;
        info!(
            url,
            feedback = ?kind,
            penalized = outcome.penalized.len(),
            "Feedback recorded"
        );
        Ok(outcome)
    }
}
