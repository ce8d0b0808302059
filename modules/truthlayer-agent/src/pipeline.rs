//! Five-phase listing investigation.
//!
//! SCRAPING -> INVESTIGATING -> ANALYZING -> ACTING -> LEARNING -> IDLE.
//! Phases run strictly in order and each consumes the previous one's output.
//! Cancellation is checked between phases only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use truthlayer_common::{
    ActionKind, ActionStatus, AgentAction, AgentState, Config, FeedbackHints, FeedbackKind,
    ListingData, LogEntry, LogLevel, LogSource, PipelineError, ResearchBag, SourceWeight,
    TruthReport, UserCommand, UserInfo, UserPreferences,
};

use crate::actions::ActionExecutor;
use crate::learning::{FeedbackOutcome, LearningStore, ListingOutcome};
use crate::research::{self, ResearchAggregator};
use crate::scoring;
use crate::scrape::{ListingScraper, PageScraper};

/// Receives phase transitions and log entries as they happen.
pub trait PipelineObserver: Send {
    fn state_changed(&mut self, _state: AgentState) {}
    fn log(&mut self, _entry: &LogEntry) {}
}

pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Everything a successful run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub listing: ListingData,
    pub research: ResearchBag,
    pub report: TruthReport,
    pub actions: Vec<AgentAction>,
    pub weights: Vec<SourceWeight>,
    pub logs: Vec<LogEntry>,
}

/// A run that stopped early. Output of phases that completed is kept.
#[derive(Debug, thiserror::Error)]
#[error("{error} (during {phase})")]
pub struct PipelineFailure {
    #[source]
    pub error: PipelineError,
    pub phase: AgentState,
    pub listing: Option<ListingData>,
    pub research: Option<ResearchBag>,
    pub report: Option<TruthReport>,
    pub actions: Vec<AgentAction>,
    pub logs: Vec<LogEntry>,
}

// ---------------------------------------------------------------------------
// Run bookkeeping
// ---------------------------------------------------------------------------

struct RunContext<'a> {
    observer: &'a mut dyn PipelineObserver,
    state: AgentState,
    logs: Vec<LogEntry>,
    listing: Option<ListingData>,
    research: Option<ResearchBag>,
    report: Option<TruthReport>,
    actions: Vec<AgentAction>,
}

impl<'a> RunContext<'a> {
    fn new(observer: &'a mut dyn PipelineObserver) -> Self {
        Self {
            observer,
            state: AgentState::Idle,
            logs: Vec::new(),
            listing: None,
            research: None,
            report: None,
            actions: Vec::new(),
        }
    }

    fn enter(&mut self, next: AgentState) {
        debug_assert!(self.state.can_transition_to(next), "{} -> {next}", self.state);
        self.state = next;
        self.observer.state_changed(next);
    }

    fn log(&mut self, source: LogSource, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::new(source, level, message);
        match level {
            LogLevel::Info | LogLevel::Success => info!(source = %source, "{}", entry.message),
            LogLevel::Warning => warn!(source = %source, "{}", entry.message),
            LogLevel::Error => error!(source = %source, "{}", entry.message),
        }
        self.observer.log(&entry);
        self.logs.push(entry);
    }

    fn fail(mut self, error: PipelineError) -> PipelineFailure {
        let phase = self.state;
        self.log(LogSource::System, LogLevel::Error, format!("Agent error: {error}"));
        if self.state != AgentState::Idle {
            self.enter(AgentState::Idle);
        }
        PipelineFailure {
            error,
            phase,
            listing: self.listing,
            research: self.research,
            report: self.report,
            actions: self.actions,
            logs: self.logs,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    scraper: Arc<dyn ListingScraper>,
    research: ResearchAggregator,
    executor: ActionExecutor,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(
        scraper: Arc<dyn ListingScraper>,
        research: ResearchAggregator,
        executor: ActionExecutor,
    ) -> Self {
        Self {
            scraper,
            research,
            executor,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let scraper = PageScraper::from_config(config)?;
        Ok(Self::new(
            Arc::new(scraper),
            ResearchAggregator::from_config(config)?,
            ActionExecutor::from_config(config)
                .map_err(|e| PipelineError::Setup(format!("action delivery: {e}")))?,
        ))
    }

    /// Set the returned flag to stop the current run before its next phase.
    /// The flag stays set until the caller clears it.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn check_cancelled(&self, next: AgentState) -> Result<(), PipelineError> {
        if self.cancel.load(Ordering::SeqCst) {
            Err(PipelineError::Cancelled(next))
        } else {
            Ok(())
        }
    }

    pub async fn run(
        &self,
        url: &str,
        prefs: &UserPreferences,
        store: &mut LearningStore,
        observer: &mut dyn PipelineObserver,
    ) -> Result<PipelineOutcome, PipelineFailure> {
        let mut ctx = RunContext::new(observer);

        // --- Scraping ---
        if let Err(e) = self.check_cancelled(AgentState::Scraping) {
            return Err(ctx.fail(e));
        }
        ctx.enter(AgentState::Scraping);
        ctx.log(
            LogSource::Scraper,
            LogLevel::Info,
            "Navigating to listing URL and extracting listing details...",
        );
        let listing = match self.scraper.scrape(url).await {
            Ok(listing) => listing,
            Err(e) => return Err(ctx.fail(e.into())),
        };
        ctx.log(
            LogSource::Scraper,
            LogLevel::Success,
            format!(
                "Extracted: {}/month, {} at {}",
                listing
                    .rent
                    .map(|r| format!("${r}"))
                    .unwrap_or_else(|| "rent unknown".to_string()),
                listing
                    .bedrooms
                    .map(|b| format!("{b}BR"))
                    .unwrap_or_else(|| "bedrooms unknown".to_string()),
                listing.address.as_deref().unwrap_or("unknown address"),
            ),
        );
        ctx.listing = Some(listing.clone());

        // --- Investigating ---
        if let Err(e) = self.check_cancelled(AgentState::Investigating) {
            return Err(ctx.fail(e));
        }
        ctx.enter(AgentState::Investigating);
        ctx.log(
            LogSource::Research,
            LogLevel::Info,
            "Cross-referencing with crime databases and community reports...",
        );
        let bag = self.research.investigate(&listing).await;
        log_research(&mut ctx, &bag, self.research.is_live());
        ctx.research = Some(bag.clone());

        // --- Analyzing ---
        if let Err(e) = self.check_cancelled(AgentState::Analyzing) {
            return Err(ctx.fail(e));
        }
        ctx.enter(AgentState::Analyzing);
        ctx.log(
            LogSource::Scoring,
            LogLevel::Info,
            format!(
                "Synthesizing evidence against user priorities (Safety: {}/5)...",
                prefs.priorities.safety
            ),
        );
        let report = scoring::score(&listing, &bag, prefs);
        ctx.log(
            LogSource::Scoring,
            LogLevel::Success,
            format!(
                "Analysis complete - {} with {:.0}/100 confidence",
                report.verdict, report.overall_score
            ),
        );
        ctx.report = Some(report.clone());

        // --- Acting ---
        if let Err(e) = self.check_cancelled(AgentState::Acting) {
            return Err(ctx.fail(e));
        }
        ctx.enter(AgentState::Acting);
        ctx.log(
            LogSource::Actions,
            LogLevel::Info,
            "Executing autonomous workflows based on verdict...",
        );
        let actions = self.executor.act(&listing, &report, prefs).await;
        for action in &actions {
            log_action(&mut ctx, action);
        }
        if actions.is_empty() {
            ctx.log(
                LogSource::Actions,
                LogLevel::Info,
                format!("No automatic actions for a {} verdict", report.verdict),
            );
        }
        ctx.actions = actions.clone();

        // --- Learning ---
        if let Err(e) = self.check_cancelled(AgentState::Learning) {
            return Err(ctx.fail(e));
        }
        ctx.enter(AgentState::Learning);
        ctx.log(
            LogSource::Learning,
            LogLevel::Info,
            "Updating source weights and learning patterns...",
        );
        if bag.synthetic {
            ctx.log(
                LogSource::Learning,
                LogLevel::Info,
                "Synthetic research, source weights left unchanged",
            );
        }
        if let Err(e) = learn(store, &listing, &bag, &report, &actions) {
            return Err(ctx.fail(e.into()));
        }
        let weights = store.weights();

        ctx.enter(AgentState::Idle);
        ctx.log(LogSource::System, LogLevel::Success, "Investigation complete");

        Ok(PipelineOutcome {
            listing,
            research: bag,
            report,
            actions,
            weights,
            logs: ctx.logs,
        })
    }

    /// Run a user-initiated action on a previously investigated listing and
    /// record completed shortlist/blacklist outcomes in history.
    pub async fn execute_user_command(
        &self,
        command: UserCommand,
        listing: &ListingData,
        report: &TruthReport,
        user: Option<&UserInfo>,
        store: &mut LearningStore,
    ) -> Result<Vec<AgentAction>, PipelineError> {
        let actions = self
            .executor
            .act_on_user_command(command, listing, report, user)
            .await;

        if let Some(outcome) = final_outcome(&actions) {
            store.record_listing(&listing.url, outcome)?;
        }
        Ok(actions)
    }

    pub fn process_feedback(
        &self,
        url: &str,
        kind: FeedbackKind,
        hints: &FeedbackHints,
        report: &TruthReport,
        store: &mut LearningStore,
    ) -> Result<FeedbackOutcome, PipelineError> {
        Ok(store.record_feedback(url, kind, hints, report)?)
    }
}

fn log_research(ctx: &mut RunContext<'_>, bag: &ResearchBag, live: bool) {
    if bag.synthetic {
        let reason = if live {
            "Listing has no address - using fallback research"
        } else {
            "Research provider not configured - using fallback research"
        };
        ctx.log(LogSource::Research, LogLevel::Warning, reason);
        return;
    }

    let failures = [
        ("neighborhood", bag.neighborhood.error.as_deref()),
        ("landlord", bag.landlord.error.as_deref()),
        ("market", bag.market.error.as_deref()),
        ("scam", bag.scam.error.as_deref()),
    ];
    for (query, error) in failures {
        if let Some(error) = error {
            ctx.log(
                LogSource::Research,
                LogLevel::Warning,
                format!("{query} research failed: {error}"),
            );
        }
    }

    let issues = research::potential_issues(bag);
    if issues.is_empty() {
        ctx.log(
            LogSource::Research,
            LogLevel::Success,
            "Background checks completed - no major red flags detected",
        );
    } else {
        ctx.log(
            LogSource::Research,
            LogLevel::Warning,
            format!("Found potential issues: {}", issues.join(", ")),
        );
    }
}

fn log_action(ctx: &mut RunContext<'_>, action: &AgentAction) {
    let level = match action.status {
        ActionStatus::Completed => LogLevel::Success,
        _ => LogLevel::Error,
    };
    ctx.log(
        LogSource::Actions,
        level,
        format!("{} [{}]", action.description, action.status),
    );
}

/// The strongest history outcome a set of actions produced, if any.
fn final_outcome(actions: &[AgentAction]) -> Option<ListingOutcome> {
    let completed = |kind: ActionKind| {
        actions
            .iter()
            .any(|a| a.kind == kind && a.status == ActionStatus::Completed)
    };
    if completed(ActionKind::Blacklist) {
        Some(ListingOutcome::Blacklisted)
    } else if completed(ActionKind::Shortlist) {
        Some(ListingOutcome::Shortlisted)
    } else {
        None
    }
}

fn learn(
    store: &mut LearningStore,
    listing: &ListingData,
    bag: &ResearchBag,
    report: &TruthReport,
    actions: &[AgentAction],
) -> Result<(), truthlayer_common::StoreError> {
    store.learn_from_research(bag)?;
    let outcome = final_outcome(actions).unwrap_or_else(|| report.verdict.into());
    store.record_listing(&listing.url, outcome)
}
