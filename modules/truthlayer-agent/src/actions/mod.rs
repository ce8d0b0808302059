pub mod delivery;
pub mod email;
pub mod form;

use std::sync::Arc;

use browserless_client::BrowserlessClient;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use truthlayer_common::{
    ActionKind, ActionStatus, ActionTransitionError, ActionType, AgentAction, Config,
    DeliveryError, ListingData, TruthReport, UserCommand, UserInfo, UserPreferences, Verdict,
};

pub use delivery::{DeliveryBackend, DeliveryTag, LocalDelivery, WebhookDelivery};
pub use email::{EmailJs, EmailNotifier, NoopEmail};
pub use form::{BrowserlessFormFiller, FormFiller, NoFormFiller};

/// Score an automatic shortlist needs to beat.
const AUTO_SHORTLIST_SCORE: f64 = 75.0;

const AUTO_BLACKLIST_REASON: &str = "High risk/scam detected";
const USER_BLACKLIST_REASON: &str = "User blacklisted";
const FORM_FILL_FAILED: &str = "Form auto-fill failed - manual entry required";

/// Turns verdicts and user commands into side effects, recording each one as
/// an [`AgentAction`] that always ends COMPLETED or FAILED.
pub struct ActionExecutor {
    delivery: Arc<dyn DeliveryBackend>,
    email: Arc<dyn EmailNotifier>,
    forms: Arc<dyn FormFiller>,
}

impl ActionExecutor {
    pub fn new(
        delivery: Arc<dyn DeliveryBackend>,
        email: Arc<dyn EmailNotifier>,
        forms: Arc<dyn FormFiller>,
    ) -> Self {
        Self {
            delivery,
            email,
            forms,
        }
    }

    /// Webhook when `WEBHOOK_URL` is set, local JSONL otherwise. Email and form
    /// fill are enabled by their own settings.
    pub fn from_config(config: &Config) -> Result<Self, DeliveryError> {
        let delivery: Arc<dyn DeliveryBackend> = match config.webhook_url.clone() {
            Some(url) => Arc::new(WebhookDelivery::new(url, config.http_timeout)?),
            None => {
                info!(dir = %config.data_dir.display(), "WEBHOOK_URL not set, storing actions locally");
                Arc::new(LocalDelivery::new(&config.data_dir))
            }
        };

        let email: Arc<dyn EmailNotifier> = match EmailJs::from_config(config)? {
            Some(emailjs) => Arc::new(emailjs),
            None => Arc::new(NoopEmail),
        };

        let forms: Arc<dyn FormFiller> = match config.browserless_url.as_deref() {
            Some(base_url) => match BrowserlessClient::with_timeout(
                base_url,
                config.browserless_token.as_deref(),
                config.http_timeout,
            ) {
                Ok(client) => Arc::new(BrowserlessFormFiller::new(client)),
                Err(e) => {
                    warn!(error = %e, "Browserless client unavailable, form auto-fill disabled");
                    Arc::new(NoFormFiller)
                }
            },
            None => Arc::new(NoFormFiller),
        };

        Ok(Self::new(delivery, email, forms))
    }

    /// Automatic policy: strong RECOMMENDED listings are shortlisted and
    /// announced, AVOID listings are blacklisted, CAUTION does nothing.
    pub async fn act(
        &self,
        listing: &ListingData,
        report: &TruthReport,
        prefs: &UserPreferences,
    ) -> Vec<AgentAction> {
        debug!(
            url = %listing.url,
            verdict = %report.verdict,
            score = report.overall_score,
            budget = prefs.budget,
            "Applying automatic action policy"
        );

        match report.verdict {
            Verdict::Recommended if report.overall_score > AUTO_SHORTLIST_SCORE => {
                let (shortlisted, notified) = futures::join!(
                    self.shortlist(listing, report, "Auto-shortlisted high-quality listing"),
                    self.notify(listing, report, "Sent high-priority listing notification"),
                );
                vec![shortlisted, notified]
            }
            Verdict::Avoid => {
                vec![
                    self.blacklist(
                        listing,
                        AUTO_BLACKLIST_REASON,
                        "Auto-blacklisted high-risk listing",
                    )
                    .await,
                ]
            }
            _ => Vec::new(),
        }
    }

    pub async fn act_on_user_command(
        &self,
        command: UserCommand,
        listing: &ListingData,
        report: &TruthReport,
        user: Option<&UserInfo>,
    ) -> Vec<AgentAction> {
        info!(url = %listing.url, %command, "Executing user command");

        match command {
            UserCommand::Shortlist => {
                let description = format!("Adding listing to shortlist: {}", listing.label());
                vec![self.shortlist(listing, report, &description).await]
            }
            UserCommand::Blacklist => {
                let description = format!("Blacklisting listing: {USER_BLACKLIST_REASON}");
                vec![
                    self.blacklist(listing, USER_BLACKLIST_REASON, &description)
                        .await,
                ]
            }
            UserCommand::ScheduleTour => {
                // Form fill is independent of the tour request; neither blocks the other.
                let (form, tour) = futures::join!(
                    self.fill_form(listing, user),
                    self.schedule_tour(listing, user),
                );
                vec![form, tour]
            }
            UserCommand::Share => {
                vec![
                    self.notify(listing, report, "Sending high_priority notification")
                        .await,
                ]
            }
        }
    }

    // -----------------------------------------------------------------------
    // Individual actions
    // -----------------------------------------------------------------------

    async fn deliver(&self, mut action: AgentAction, tag: DeliveryTag, data: Value) -> AgentAction {
        log_transition(action.start(), &action);
        match self.delivery.deliver(tag, &data).await {
            Ok(receipt) => log_transition(action.complete(receipt), &action),
            Err(e) => {
                warn!(action = %action.kind, error = %e, "Action delivery failed");
                log_transition(action.fail(e.to_string()), &action);
            }
        }
        log_outcome(&action);
        action
    }

    async fn shortlist(
        &self,
        listing: &ListingData,
        report: &TruthReport,
        description: &str,
    ) -> AgentAction {
        let action = AgentAction::new(ActionKind::Shortlist, ActionType::ApiCall, description)
            .with_detail("POST /shortlist");
        let data = json!({
            "listing": listing,
            "report": report,
            "addedAt": Utc::now().to_rfc3339(),
            "status": "active",
        });
        self.deliver(action, DeliveryTag::Shortlist, data).await
    }

    async fn blacklist(&self, listing: &ListingData, reason: &str, description: &str) -> AgentAction {
        let action = AgentAction::new(ActionKind::Blacklist, ActionType::ApiCall, description)
            .with_detail("POST /blacklist");
        let data = json!({
            "listing": listing,
            "reason": reason,
            "blacklistedAt": Utc::now().to_rfc3339(),
        });
        self.deliver(action, DeliveryTag::Blacklist, data).await
    }

    async fn notify(&self, listing: &ListingData, report: &TruthReport, description: &str) -> AgentAction {
        let mut action =
            AgentAction::new(ActionKind::Notify, ActionType::Notification, description)
                .with_detail("Webhook + email notification");
        log_transition(action.start(), &action);

        let notification = json!({
            "type": "high_priority",
            "listing": {
                "address": listing.address,
                "rent": listing.rent,
                "url": listing.url,
            },
            "summary": report.summary,
            "overallScore": report.overall_score,
            "verdict": report.verdict,
            "timestamp": Utc::now().to_rfc3339(),
        });

        let email_configured = self.email.is_configured();
        let email_sent = match self.email.send_listing_alert(listing, report).await {
            Ok(()) => true,
            Err(e) => {
                if email_configured {
                    warn!(url = %listing.url, error = %e, "Email alert failed");
                }
                false
            }
        };

        let step = match self.delivery.deliver(DeliveryTag::Notify, &notification).await {
            Ok(receipt) => action.complete(json!({
                "delivery": receipt,
                "notification": notification,
                "emailSent": email_sent,
                "emailConfigured": email_configured,
            })),
            Err(e) => {
                warn!(url = %listing.url, error = %e, "Notification delivery failed");
                action.fail(e.to_string())
            }
        };
        log_transition(step, &action);

        log_outcome(&action);
        action
    }

    async fn schedule_tour(&self, listing: &ListingData, user: Option<&UserInfo>) -> AgentAction {
        let action = AgentAction::new(
            ActionKind::ScheduleTour,
            ActionType::ApiCall,
            format!("Preparing tour request for {}", listing.label()),
        )
        .with_detail("POST /schedule_tour");

        let message = user
            .and_then(|u| u.message.clone())
            .unwrap_or_else(|| tour_message(listing));
        let data = json!({
            "listing": listing,
            "requester": user,
            "message": message,
            "requestedAt": Utc::now().to_rfc3339(),
            "status": "pending_contact",
        });
        self.deliver(action, DeliveryTag::ScheduleTour, data).await
    }

    async fn fill_form(&self, listing: &ListingData, user: Option<&UserInfo>) -> AgentAction {
        let mut action = AgentAction::new(
            ActionKind::FormFill,
            ActionType::BrowserInteraction,
            "Auto-fill contact form",
        )
        .with_detail("Browser: auto-fill contact form");
        log_transition(action.start(), &action);

        let filled = match user {
            Some(user) => self.forms.fill_contact_form(&listing.url, user).await,
            None => false,
        };

        let step = if filled {
            action.description = "Contact form pre-filled successfully".to_string();
            action.complete(json!({ "filled": true }))
        } else {
            action.description = FORM_FILL_FAILED.to_string();
            action.fail(FORM_FILL_FAILED)
        };
        log_transition(step, &action);

        log_outcome(&action);
        action
    }
}

fn tour_message(listing: &ListingData) -> String {
    format!(
        "Hi, I'm interested in viewing this property. I'm looking for a {} bedroom apartment \
         in this area. When would be a good time for a tour?",
        listing.bedrooms.unwrap_or(1)
    )
}

/// The executor only drives PENDING -> EXECUTING -> terminal, so a rejected
/// transition is an executor bug. Surface it instead of dropping it.
fn log_transition(step: Result<(), ActionTransitionError>, action: &AgentAction) {
    if let Err(e) = step {
        warn!(id = %action.id, kind = %action.kind, error = %e, "Rejected action transition");
    }
}

fn log_outcome(action: &AgentAction) {
    match action.status {
        ActionStatus::Completed => {
            info!(id = %action.id, kind = %action.kind, "Action completed")
        }
        status => warn!(id = %action.id, kind = %action.kind, %status, "Action did not complete"),
    }
}
