use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ActionTransitionError;

// --- Listing ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Normalized attributes of a rental listing. Every field except `url` is
/// best-effort: extraction failures leave the field unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingData {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqft: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
}

impl ListingData {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Short human label used in log lines and action descriptions.
    pub fn label(&self) -> &str {
        self.address
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or(&self.url)
    }
}

// --- Research payloads ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Excellent => write!(f, "Excellent"),
            Rating::Good => write!(f, "Good"),
            Rating::Fair => write!(f, "Fair"),
            Rating::Poor => write!(f, "Poor"),
            Rating::VeryPoor => write!(f, "Very Poor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MarketComparison {
    #[serde(rename = "Significantly Underpriced")]
    SignificantlyUnderpriced,
    #[serde(rename = "Below Market")]
    BelowMarket,
    #[serde(rename = "Fair Market Value")]
    FairMarketValue,
    #[serde(rename = "Above Market")]
    AboveMarket,
    #[serde(rename = "Significantly Overpriced")]
    SignificantlyOverpriced,
}

impl MarketComparison {
    pub fn is_overpriced(&self) -> bool {
        matches!(
            self,
            MarketComparison::AboveMarket | MarketComparison::SignificantlyOverpriced
        )
    }
}

impl fmt::Display for MarketComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MarketComparison::SignificantlyUnderpriced => "Significantly Underpriced",
            MarketComparison::BelowMarket => "Below Market",
            MarketComparison::FairMarketValue => "Fair Market Value",
            MarketComparison::AboveMarket => "Above Market",
            MarketComparison::SignificantlyOverpriced => "Significantly Overpriced",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ScamRiskLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

/// Neighborhood safety and noise research.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NeighborhoodReport {
    /// Safety score from 1-10 based on crime data, police reports, and community feedback
    #[serde(default)]
    pub safety_score: Option<f64>,
    /// Brief summary of recent crime activity in the area
    #[serde(default)]
    pub crime_summary: Option<String>,
    /// Noise level from 1-10 based on construction, traffic, and community complaints
    #[serde(default)]
    pub noise_level: Option<f64>,
    /// Description of the neighborhood character and demographics
    #[serde(default)]
    pub neighborhood_vibe: Option<String>,
    /// List of notable recent incidents or concerns in the area
    #[serde(default)]
    pub recent_incidents: Vec<String>,
}

/// Landlord reputation and building history research.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LandlordReport {
    /// Overall landlord reputation based on reviews and complaints
    #[serde(default)]
    pub landlord_reputation: Option<Rating>,
    /// Building maintenance quality based on tenant feedback
    #[serde(default)]
    pub building_maintenance: Option<Rating>,
    /// Tenant satisfaction score from 1-10
    #[serde(default)]
    pub tenant_satisfaction: Option<f64>,
    /// Concerning issues found about the landlord or building
    #[serde(default)]
    pub red_flags: Vec<String>,
    /// Positive aspects mentioned in reviews
    #[serde(default)]
    pub positive_aspects: Vec<String>,
}

/// Market pricing research.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MarketReport {
    /// How this listing compares to market rates
    #[serde(default)]
    pub market_comparison: Option<MarketComparison>,
    /// Estimated fair market rent for this property
    #[serde(default)]
    pub estimated_fair_rent: Option<f64>,
    /// Price per square foot if available
    #[serde(default)]
    pub price_per_sqft: Option<f64>,
    /// Common hidden fees or additional costs for similar properties in this area
    #[serde(default)]
    pub hidden_fees_common: Vec<String>,
    /// Overall value assessment and recommendation
    #[serde(default)]
    pub value_assessment: Option<String>,
}

/// Scam-risk research.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScamReport {
    /// Overall scam risk assessment
    #[serde(default)]
    pub scam_risk_level: Option<ScamRiskLevel>,
    /// Potential scam warning signs found
    #[serde(default)]
    pub scam_indicators: Vec<String>,
    /// Authenticity score from 1-10
    #[serde(default)]
    pub authenticity_score: Option<f64>,
    /// Recommendations for verifying this listing
    #[serde(default)]
    pub recommendations: Vec<String>,
}

// --- Research bag ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Outcome of one research query. `data` and `confidence` are only set on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub citations: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ResearchResult<T> {
    pub fn completed(data: T, confidence: Confidence, citations: usize) -> Self {
        Self {
            success: true,
            data: Some(data),
            confidence: Some(confidence),
            citations,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            confidence: None,
            citations: 0,
            error: Some(error.into()),
        }
    }

    /// The payload, only when the query succeeded.
    pub fn ok(&self) -> Option<&T> {
        if self.success {
            self.data.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchBag {
    pub neighborhood: ResearchResult<NeighborhoodReport>,
    pub landlord: ResearchResult<LandlordReport>,
    pub market: ResearchResult<MarketReport>,
    pub scam: ResearchResult<ScamReport>,
    /// Set when the bag came from the fallback generator rather than real research.
    #[serde(default)]
    pub synthetic: bool,
}

impl ResearchBag {
    /// A bag where every query failed with the same reason.
    pub fn unavailable(reason: &str) -> Self {
        Self {
            neighborhood: ResearchResult::failed(reason),
            landlord: ResearchResult::failed(reason),
            market: ResearchResult::failed(reason),
            scam: ResearchResult::failed(reason),
            synthetic: false,
        }
    }

    pub fn succeeded(&self) -> usize {
        [
            self.neighborhood.success,
            self.landlord.success,
            self.market.success,
            self.scam.success,
        ]
        .iter()
        .filter(|s| **s)
        .count()
    }
}

// --- Truth report ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Recommended,
    Caution,
    Avoid,
}

impl Verdict {
    pub fn title(&self) -> &'static str {
        match self {
            Verdict::Recommended => "👍 Worth pursuing",
            Verdict::Caution => "⚠️ Proceed with caution",
            Verdict::Avoid => "🚫 Avoid this listing",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Recommended => write!(f, "RECOMMENDED"),
            Verdict::Caution => write!(f, "CAUTION"),
            Verdict::Avoid => write!(f, "AVOID"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScamRisk {
    Low,
    Medium,
    High,
}

impl ScamRisk {
    /// Contribution of the always-on scam term, on the 0-10 axis scale.
    pub fn component(&self) -> f64 {
        match self {
            ScamRisk::Low => 9.0,
            ScamRisk::Medium => 6.0,
            ScamRisk::High => 3.0,
        }
    }
}

impl From<ScamRiskLevel> for ScamRisk {
    fn from(level: ScamRiskLevel) -> Self {
        match level {
            ScamRiskLevel::VeryLow | ScamRiskLevel::Low => ScamRisk::Low,
            ScamRiskLevel::Medium => ScamRisk::Medium,
            ScamRiskLevel::High | ScamRiskLevel::VeryHigh => ScamRisk::High,
        }
    }
}

impl fmt::Display for ScamRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScamRisk::Low => write!(f, "Low"),
            ScamRisk::Medium => write!(f, "Medium"),
            ScamRisk::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvidenceCategory {
    Safety,
    Noise,
    Landlord,
    Value,
}

impl EvidenceCategory {
    /// The information source whose reliability backs this category.
    pub fn source(&self) -> &'static str {
        match self {
            EvidenceCategory::Safety => "City Records",
            EvidenceCategory::Noise => "Reddit Community",
            EvidenceCategory::Landlord => "Google Reviews",
            EvidenceCategory::Value => "Official Listing",
        }
    }
}

impl fmt::Display for EvidenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvidenceCategory::Safety => write!(f, "Safety"),
            EvidenceCategory::Noise => write!(f, "Noise"),
            EvidenceCategory::Landlord => write!(f, "Landlord"),
            EvidenceCategory::Value => write!(f, "Value"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Shared 0-10 axis thresholds: >=7 positive, >=5 neutral, else negative.
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            Sentiment::Positive
        } else if score >= 5.0 {
            Sentiment::Neutral
        } else {
            Sentiment::Negative
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub category: EvidenceCategory,
    pub points: Vec<String>,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
    pub scam_risk: ScamRisk,
    pub safety: f64,
    pub noise: f64,
    pub value: String,
    pub commute: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionRecommendation {
    Shortlist,
    Blacklist,
    ScheduleTour,
    Avoid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TruthReport {
    pub verdict: Verdict,
    pub verdict_title: String,
    /// Unrounded 0-100 score; round only for display.
    pub overall_score: f64,
    pub scores: ScoreCard,
    pub evidence: Vec<Evidence>,
    pub summary: String,
    pub action_recommendation: ActionRecommendation,
}

// --- Actions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    ApiCall,
    BrowserInteraction,
    Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

impl ActionStatus {
    fn rank(&self) -> u8 {
        match self {
            ActionStatus::Pending => 0,
            ActionStatus::Executing => 1,
            ActionStatus::Completed | ActionStatus::Failed => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Pending => write!(f, "PENDING"),
            ActionStatus::Executing => write!(f, "EXECUTING"),
            ActionStatus::Completed => write!(f, "COMPLETED"),
            ActionStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Shortlist,
    Blacklist,
    Notify,
    ScheduleTour,
    FormFill,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Shortlist => write!(f, "shortlist"),
            ActionKind::Blacklist => write!(f, "blacklist"),
            ActionKind::Notify => write!(f, "notify"),
            ActionKind::ScheduleTour => write!(f, "schedule_tour"),
            ActionKind::FormFill => write!(f, "form_fill"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTransition {
    pub status: ActionStatus,
    pub at: DateTime<Utc>,
}

/// One side-effecting operation in the action ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    pub id: String,
    pub kind: ActionKind,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub description: String,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub transitions: Vec<ActionTransition>,
}

impl AgentAction {
    pub fn new(kind: ActionKind, action_type: ActionType, description: impl Into<String>) -> Self {
        Self {
            id: format!("{kind}_{}", Uuid::new_v4().simple()),
            kind,
            action_type,
            description: description.into(),
            status: ActionStatus::Pending,
            detail: None,
            result: None,
            transitions: vec![ActionTransition {
                status: ActionStatus::Pending,
                at: Utc::now(),
            }],
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Move to `next`. Only forward moves are allowed and a terminal action
    /// never changes again. Transition timestamps never go backwards.
    pub fn advance(&mut self, next: ActionStatus) -> Result<(), ActionTransitionError> {
        if self.status.is_terminal() || next.rank() <= self.status.rank() {
            return Err(ActionTransitionError {
                from: self.status,
                to: next,
            });
        }

        let now = Utc::now();
        let at = match self.transitions.last() {
            Some(last) if last.at > now => last.at,
            _ => now,
        };
        self.status = next;
        self.transitions.push(ActionTransition { status: next, at });
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), ActionTransitionError> {
        self.advance(ActionStatus::Executing)
    }

    /// Record success. The result is only kept when the transition is valid.
    pub fn complete(&mut self, result: serde_json::Value) -> Result<(), ActionTransitionError> {
        self.advance(ActionStatus::Completed)?;
        self.result = Some(result);
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), ActionTransitionError> {
        self.advance(ActionStatus::Failed)?;
        self.result = Some(serde_json::json!({ "error": error.into() }));
        Ok(())
    }
}

// --- Learning ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceWeight {
    pub source: String,
    pub reliability: u8,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    ThumbsUp,
    ThumbsDown,
}

/// Optional structured hints that accompany thumbs up/down feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackHints {
    #[serde(default)]
    pub safety_too_high: bool,
    #[serde(default)]
    pub noise_too_low: bool,
    #[serde(default)]
    pub value_too_strict: bool,
    #[serde(default)]
    pub commute_too_important: bool,
}

impl FeedbackHints {
    pub fn is_empty(&self) -> bool {
        !(self.safety_too_high
            || self.noise_too_low
            || self.value_too_strict
            || self.commute_too_important)
    }
}

// --- User input ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priorities {
    pub safety: u8,
    pub commute: u8,
    pub quietness: u8,
    pub value: u8,
}

impl Priorities {
    /// Scoring weight for a 1-5 priority. Out-of-range values are clamped.
    pub fn weight(priority: u8) -> f64 {
        f64::from(priority.clamp(1, 5)) / 5.0
    }
}

impl Default for Priorities {
    fn default() -> Self {
        Self {
            safety: 3,
            commute: 3,
            quietness: 3,
            value: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub city: String,
    pub budget: u32,
    pub priorities: Priorities,
}

/// Requester details for tour requests and contact-form auto-fill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserCommand {
    Shortlist,
    Blacklist,
    ScheduleTour,
    Share,
}

impl fmt::Display for UserCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserCommand::Shortlist => write!(f, "shortlist"),
            UserCommand::Blacklist => write!(f, "blacklist"),
            UserCommand::ScheduleTour => write!(f, "schedule_tour"),
            UserCommand::Share => write!(f, "share"),
        }
    }
}

// --- Pipeline state + log ---

/// Phases of one listing investigation. `Idle` is both the start and the
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    Idle,
    Scraping,
    Investigating,
    Analyzing,
    Acting,
    Learning,
}

impl AgentState {
    pub fn next(&self) -> AgentState {
        match self {
            AgentState::Idle => AgentState::Scraping,
            AgentState::Scraping => AgentState::Investigating,
            AgentState::Investigating => AgentState::Analyzing,
            AgentState::Analyzing => AgentState::Acting,
            AgentState::Acting => AgentState::Learning,
            AgentState::Learning => AgentState::Idle,
        }
    }

    /// Forward by one phase, or back to `Idle` from anywhere (abort).
    pub fn can_transition_to(&self, to: AgentState) -> bool {
        to == self.next() || (to == AgentState::Idle && *self != AgentState::Idle)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentState::Idle => write!(f, "IDLE"),
            AgentState::Scraping => write!(f, "SCRAPING"),
            AgentState::Investigating => write!(f, "INVESTIGATING"),
            AgentState::Analyzing => write!(f, "ANALYZING"),
            AgentState::Acting => write!(f, "ACTING"),
            AgentState::Learning => write!(f, "LEARNING"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    System,
    Scraper,
    Research,
    Scoring,
    Actions,
    Learning,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::System => write!(f, "SYSTEM"),
            LogSource::Scraper => write!(f, "SCRAPER"),
            LogSource::Research => write!(f, "RESEARCH"),
            LogSource::Scoring => write!(f, "SCORING"),
            LogSource::Actions => write!(f, "ACTIONS"),
            LogSource::Learning => write!(f, "LEARNING"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source: LogSource,
    pub message: String,
    pub level: LogLevel,
}

impl LogEntry {
    pub fn new(source: LogSource, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source,
            message: message.into(),
            level,
        }
    }
}
