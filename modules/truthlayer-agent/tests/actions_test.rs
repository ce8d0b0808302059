//! Action execution tests.
//!
//! Verdicts and user commands go in; the recorded `AgentAction` ledger and
//! the delivered payloads come out. Every action must finish COMPLETED or
//! FAILED whatever the backends do.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use truthlayer_agent::actions::{
    ActionExecutor, DeliveryBackend, DeliveryTag, EmailJs, EmailNotifier, LocalDelivery,
    WebhookDelivery,
};
use truthlayer_agent::scoring::score;
use truthlayer_agent::testing::{
    executor_with, full_bag, landlord, market, neighborhood, scam, test_listing, test_user,
    MockEmail, MockFormFiller, RecordingDelivery, TEST_URL,
};
use truthlayer_common::{
    ActionKind, ActionStatus, ActionType, AgentAction, Config, DeliveryError, ListingData,
    MarketComparison, ScamRiskLevel, TruthReport, UserCommand, UserPreferences, Verdict,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn report_for(
    listing: &ListingData,
    safety: f64,
    noise_level: f64,
    level: ScamRiskLevel,
    comparison: MarketComparison,
) -> TruthReport {
    let bag = full_bag(
        neighborhood(safety, noise_level),
        landlord(7.0),
        market(Some(comparison), 3400.0),
        scam(level),
    );
    score(listing, &bag, &UserPreferences::default())
}

/// Scores 90.
fn excellent(listing: &ListingData) -> TruthReport {
    report_for(
        listing,
        9.0,
        1.0,
        ScamRiskLevel::VeryLow,
        MarketComparison::SignificantlyUnderpriced,
    )
}

/// Scores exactly 75: recommended, but not strongly enough to act on.
fn borderline(listing: &ListingData) -> TruthReport {
    report_for(listing, 8.0, 3.0, ScamRiskLevel::Low, MarketComparison::FairMarketValue)
}

fn scam_listing(listing: &ListingData) -> TruthReport {
    report_for(
        listing,
        8.0,
        3.0,
        ScamRiskLevel::VeryHigh,
        MarketComparison::SignificantlyUnderpriced,
    )
}

fn assert_terminal(actions: &[AgentAction]) {
    for action in actions {
        assert!(
            action.status.is_terminal(),
            "{} ended {}",
            action.kind,
            action.status
        );
        let statuses: Vec<_> = action.transitions.iter().map(|t| t.status).collect();
        assert_eq!(statuses.first(), Some(&ActionStatus::Pending));
        assert_eq!(statuses.last(), Some(&action.status));
        assert!(action
            .transitions
            .windows(2)
            .all(|w| w[0].at <= w[1].at));
    }
}

fn prefs() -> UserPreferences {
    UserPreferences::default()
}

// ---------------------------------------------------------------------------
// Automatic policy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn strong_recommendation_is_shortlisted_and_announced() {
    let listing = test_listing(TEST_URL);
    let report = excellent(&listing);
    assert_eq!(report.verdict, Verdict::Recommended);
    assert!(report.overall_score > 75.0);

    let delivery = Arc::new(RecordingDelivery::new());
    let actions = executor_with(delivery.clone()).act(&listing, &report, &prefs()).await;

    let kinds: Vec<_> = actions.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![ActionKind::Shortlist, ActionKind::Notify]);
    assert!(actions.iter().all(|a| a.status == ActionStatus::Completed));
    assert_terminal(&actions);

    let tags = delivery.tags();
    assert_eq!(tags.len(), 2);
    assert!(tags.contains(&DeliveryTag::Shortlist));
    assert!(tags.contains(&DeliveryTag::Notify));

    let (_, shortlisted) = delivery
        .delivered()
        .into_iter()
        .find(|(tag, _)| *tag == DeliveryTag::Shortlist)
        .unwrap();
    assert_eq!(shortlisted["listing"]["url"], TEST_URL);
    assert_eq!(shortlisted["report"]["verdict"], "RECOMMENDED");
    assert_eq!(shortlisted["status"], "active");
}

#[tokio::test]
async fn borderline_recommendation_takes_no_action() {
    let listing = test_listing(TEST_URL);
    let report = borderline(&listing);
    assert_eq!(report.verdict, Verdict::Recommended);
    assert_eq!(report.overall_score, 75.0);

    let delivery = Arc::new(RecordingDelivery::new());
    let actions = executor_with(delivery.clone()).act(&listing, &report, &prefs()).await;

    assert!(actions.is_empty());
    assert!(delivery.delivered().is_empty());
}

#[tokio::test]
async fn fractional_score_over_75_is_acted_on() {
    let listing = test_listing(TEST_URL);
    let mut prefs = prefs();
    prefs.priorities.safety = 4;
    let bag = full_bag(
        neighborhood(8.0, 3.0),
        landlord(7.0),
        market(Some(MarketComparison::FairMarketValue), 3400.0),
        scam(ScamRiskLevel::Low),
    );
    // 226 over 3.0
    let report = score(&listing, &bag, &prefs);
    assert!(report.overall_score > 75.0 && report.overall_score < 75.5);

    let delivery = Arc::new(RecordingDelivery::new());
    let actions = executor_with(delivery.clone()).act(&listing, &report, &prefs).await;

    let kinds: Vec<_> = actions.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![ActionKind::Shortlist, ActionKind::Notify]);
    assert_eq!(delivery.tags().len(), 2);
}

#[tokio::test]
async fn fractional_score_under_75_takes_no_action() {
    let listing = test_listing(TEST_URL);
    // 209 over 2.8
    let report = report_for(
        &listing,
        8.0,
        3.1,
        ScamRiskLevel::Low,
        MarketComparison::FairMarketValue,
    );
    assert_eq!(report.verdict, Verdict::Recommended);
    assert!(report.overall_score > 74.5 && report.overall_score < 75.0);

    let delivery = Arc::new(RecordingDelivery::new());
    let actions = executor_with(delivery.clone()).act(&listing, &report, &prefs()).await;

    assert!(actions.is_empty());
    assert!(delivery.delivered().is_empty());
}

#[tokio::test]
async fn score_just_under_sixty_takes_no_action() {
    let listing = test_listing(TEST_URL);
    // 167 over 2.8
    let report = report_for(
        &listing,
        6.0,
        8.17,
        ScamRiskLevel::Low,
        MarketComparison::FairMarketValue,
    );
    assert_eq!(report.verdict, Verdict::Caution);

    let delivery = Arc::new(RecordingDelivery::new());
    let actions = executor_with(delivery).act(&listing, &report, &prefs()).await;
    assert!(actions.is_empty());
}

#[tokio::test]
async fn avoid_is_blacklisted() {
    let listing = test_listing(TEST_URL);
    let report = scam_listing(&listing);
    assert_eq!(report.verdict, Verdict::Avoid);

    let delivery = Arc::new(RecordingDelivery::new());
    let actions = executor_with(delivery.clone()).act(&listing, &report, &prefs()).await;

    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].kind, ActionKind::Blacklist);
    assert_eq!(actions[0].action_type, ActionType::ApiCall);
    assert_eq!(actions[0].status, ActionStatus::Completed);

    let delivered = delivery.delivered();
    assert_eq!(delivered[0].0, DeliveryTag::Blacklist);
    assert_eq!(delivered[0].1["reason"], "High risk/scam detected");
}

#[tokio::test]
async fn caution_takes_no_action() {
    let listing = test_listing(TEST_URL);
    let report = report_for(
        &listing,
        5.0,
        3.0,
        ScamRiskLevel::Medium,
        MarketComparison::AboveMarket,
    );
    assert_eq!(report.verdict, Verdict::Caution);

    let delivery = Arc::new(RecordingDelivery::new());
    let actions = executor_with(delivery).act(&listing, &report, &prefs()).await;
    assert!(actions.is_empty());
}

#[tokio::test]
async fn failing_delivery_marks_actions_failed() {
    let listing = test_listing(TEST_URL);
    let report = excellent(&listing);

    let delivery = Arc::new(RecordingDelivery::failing());
    let actions = executor_with(delivery).act(&listing, &report, &prefs()).await;

    assert_eq!(actions.len(), 2);
    assert!(actions.iter().all(|a| a.status == ActionStatus::Failed));
    assert_terminal(&actions);
    assert!(actions[0].result.as_ref().unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("500"));
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notify_reports_email_status() {
    let listing = test_listing(TEST_URL);
    let report = excellent(&listing);
    let email = Arc::new(MockEmail::configured());
    let executor = ActionExecutor::new(
        Arc::new(RecordingDelivery::new()),
        email.clone(),
        Arc::new(MockFormFiller::failing()),
    );

    let actions = executor
        .act_on_user_command(UserCommand::Share, &listing, &report, None)
        .await;

    assert_eq!(actions.len(), 1);
    let result = actions[0].result.as_ref().unwrap();
    assert_eq!(result["emailSent"], true);
    assert_eq!(result["emailConfigured"], true);
    assert_eq!(result["notification"]["type"], "high_priority");
    assert_eq!(result["notification"]["overallScore"], 90.0);
    assert_eq!(email.sent(), vec![TEST_URL.to_string()]);
}

#[tokio::test]
async fn broken_email_does_not_fail_the_notification() {
    let listing = test_listing(TEST_URL);
    let report = excellent(&listing);
    let executor = ActionExecutor::new(
        Arc::new(RecordingDelivery::new()),
        Arc::new(MockEmail::broken()),
        Arc::new(MockFormFiller::failing()),
    );

    let actions = executor
        .act_on_user_command(UserCommand::Share, &listing, &report, None)
        .await;

    assert_eq!(actions[0].kind, ActionKind::Notify);
    assert_eq!(actions[0].action_type, ActionType::Notification);
    assert_eq!(actions[0].status, ActionStatus::Completed);
    let result = actions[0].result.as_ref().unwrap();
    assert_eq!(result["emailSent"], false);
    assert_eq!(result["emailConfigured"], true);
}

#[tokio::test]
async fn emailjs_sends_template_params() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/email/send"))
        .and(body_partial_json(json!({
            "service_id": "svc",
            "template_id": "tpl",
            "user_id": "pk",
            "template_params": {
                "to_email": "renter@example.com",
                "listing_rent": "$3,400",
                "truth_score": "90/100",
                "verdict_text": "RECOMMENDED"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let email = EmailJs::new(
        "svc".to_string(),
        "tpl".to_string(),
        "pk".to_string(),
        "renter@example.com".to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
    .with_endpoint(&format!("{}/email/send", server.uri()));
    assert!(email.is_configured());

    let listing = test_listing(TEST_URL);
    email
        .send_listing_alert(&listing, &excellent(&listing))
        .await
        .unwrap();
}

#[tokio::test]
async fn emailjs_rejection_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("The user ID is invalid"))
        .mount(&server)
        .await;

    let email = EmailJs::new(
        "svc".to_string(),
        "tpl".to_string(),
        "bad".to_string(),
        "renter@example.com".to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
    .with_endpoint(&server.uri());

    let listing = test_listing(TEST_URL);
    assert!(email
        .send_listing_alert(&listing, &excellent(&listing))
        .await
        .is_err());
}

// ---------------------------------------------------------------------------
// User commands
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_blacklist_uses_user_reason() {
    let listing = test_listing(TEST_URL);
    let report = excellent(&listing);
    let delivery = Arc::new(RecordingDelivery::new());

    let actions = executor_with(delivery.clone())
        .act_on_user_command(UserCommand::Blacklist, &listing, &report, None)
        .await;

    assert_eq!(actions[0].description, "Blacklisting listing: User blacklisted");
    assert_eq!(delivery.delivered()[0].1["reason"], "User blacklisted");
}

#[tokio::test]
async fn user_shortlist_names_the_listing() {
    let listing = test_listing(TEST_URL);
    let report = borderline(&listing);
    let delivery = Arc::new(RecordingDelivery::new());

    let actions = executor_with(delivery.clone())
        .act_on_user_command(UserCommand::Shortlist, &listing, &report, None)
        .await;

    assert_eq!(
        actions[0].description,
        "Adding listing to shortlist: 123 Main St, San Francisco, CA"
    );
    assert_eq!(delivery.tags(), vec![DeliveryTag::Shortlist]);
}

#[tokio::test]
async fn schedule_tour_survives_form_fill_failure() {
    let listing = test_listing(TEST_URL);
    let report = excellent(&listing);
    let delivery = Arc::new(RecordingDelivery::new());
    let forms = Arc::new(MockFormFiller::failing());
    let executor =
        ActionExecutor::new(delivery.clone(), Arc::new(MockEmail::default()), forms.clone());
    let user = test_user();

    let actions = executor
        .act_on_user_command(UserCommand::ScheduleTour, &listing, &report, Some(&user))
        .await;

    assert_eq!(actions.len(), 2);
    let (form, tour) = (&actions[0], &actions[1]);

    assert_eq!(form.kind, ActionKind::FormFill);
    assert_eq!(form.action_type, ActionType::BrowserInteraction);
    assert_eq!(form.status, ActionStatus::Failed);
    assert_eq!(form.description, "Form auto-fill failed - manual entry required");

    assert_eq!(tour.kind, ActionKind::ScheduleTour);
    assert_eq!(tour.status, ActionStatus::Completed);
    assert_terminal(&actions);

    assert_eq!(forms.calls().len(), 1);
    assert_eq!(forms.calls()[0].0, TEST_URL);

    let (_, request) = &delivery.delivered()[0];
    assert_eq!(request["requester"]["email"], "ada@example.com");
    assert_eq!(request["status"], "pending_contact");
    assert!(request["message"]
        .as_str()
        .unwrap()
        .contains("2 bedroom apartment"));
}

#[tokio::test]
async fn schedule_tour_with_working_form() {
    let listing = test_listing(TEST_URL);
    let report = excellent(&listing);
    let executor = ActionExecutor::new(
        Arc::new(RecordingDelivery::new()),
        Arc::new(MockEmail::default()),
        Arc::new(MockFormFiller::succeeding()),
    );
    let mut user = test_user();
    user.message = Some("Can I see it Saturday?".to_string());

    let actions = executor
        .act_on_user_command(UserCommand::ScheduleTour, &listing, &report, Some(&user))
        .await;

    assert_eq!(actions[0].status, ActionStatus::Completed);
    assert_eq!(actions[0].description, "Contact form pre-filled successfully");
    assert_eq!(actions[1].status, ActionStatus::Completed);
}

#[tokio::test]
async fn schedule_tour_without_contact_details_skips_the_form() {
    let listing = test_listing(TEST_URL);
    let report = excellent(&listing);
    let forms = Arc::new(MockFormFiller::succeeding());
    let executor = ActionExecutor::new(
        Arc::new(RecordingDelivery::new()),
        Arc::new(MockEmail::default()),
        forms.clone(),
    );

    let actions = executor
        .act_on_user_command(UserCommand::ScheduleTour, &listing, &report, None)
        .await;

    assert_eq!(actions[0].status, ActionStatus::Failed);
    assert_eq!(actions[1].status, ActionStatus::Completed);
    assert!(forms.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Delivery backends
// ---------------------------------------------------------------------------

#[tokio::test]
async fn webhook_receives_action_and_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({
            "action": "shortlist",
            "data": { "listing": { "url": TEST_URL } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "id": 17 })))
        .expect(1)
        .mount(&server)
        .await;

    let webhook =
        WebhookDelivery::new(format!("{}/hook", server.uri()), Duration::from_secs(5)).unwrap();
    let executor = ActionExecutor::new(
        Arc::new(webhook),
        Arc::new(MockEmail::default()),
        Arc::new(MockFormFiller::failing()),
    );
    let listing = test_listing(TEST_URL);

    let actions = executor
        .act_on_user_command(UserCommand::Shortlist, &listing, &borderline(&listing), None)
        .await;

    assert_eq!(actions[0].status, ActionStatus::Completed);
    assert_eq!(actions[0].result, Some(json!({ "ok": true, "id": 17 })));
}

#[tokio::test]
async fn webhook_error_status_fails_the_action() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let webhook = WebhookDelivery::new(server.uri(), Duration::from_secs(5)).unwrap();
    let err = webhook
        .deliver(DeliveryTag::Blacklist, &json!({ "reason": "x" }))
        .await
        .unwrap_err();
    assert!(
        matches!(err, DeliveryError::Http { status: 503, ref message } if message == "maintenance"),
        "got {err:?}"
    );

    let executor = ActionExecutor::new(
        Arc::new(WebhookDelivery::new(server.uri(), Duration::from_secs(5)).unwrap()),
        Arc::new(MockEmail::default()),
        Arc::new(MockFormFiller::failing()),
    );
    let listing = test_listing(TEST_URL);
    let actions = executor.act(&listing, &scam_listing(&listing), &prefs()).await;

    assert_eq!(actions[0].status, ActionStatus::Failed);
}

#[tokio::test]
async fn executor_from_config_uses_the_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({ "action": "blacklist" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        webhook_url: Some(format!("{}/hook", server.uri())),
        http_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let executor = ActionExecutor::from_config(&config).unwrap();
    let listing = test_listing(TEST_URL);

    let actions = executor
        .act_on_user_command(UserCommand::Blacklist, &listing, &borderline(&listing), None)
        .await;

    assert_eq!(actions[0].status, ActionStatus::Completed);
}

#[tokio::test]
async fn slow_webhook_is_cut_off_by_the_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let webhook = WebhookDelivery::new(server.uri(), Duration::from_millis(100)).unwrap();
    let started = std::time::Instant::now();
    let err = webhook
        .deliver(DeliveryTag::Notify, &json!({ "type": "high_priority" }))
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::Network(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn local_delivery_records_every_action() {
    let dir = tempfile::tempdir().unwrap();
    let local = LocalDelivery::new(dir.path());
    assert!(local.is_local());

    let executor = ActionExecutor::new(
        Arc::new(LocalDelivery::new(dir.path())),
        Arc::new(MockEmail::default()),
        Arc::new(MockFormFiller::failing()),
    );
    let listing = test_listing(TEST_URL);
    let report = excellent(&listing);

    let first = executor.act(&listing, &report, &prefs()).await;
    let second = executor
        .act_on_user_command(UserCommand::Shortlist, &listing, &report, None)
        .await;
    assert_terminal(&first);
    assert_eq!(second[0].result, Some(json!({ "success": true, "stored": "locally" })));

    let shortlist = std::fs::read_to_string(local.path_for(DeliveryTag::Shortlist)).unwrap();
    let lines: Vec<Value> = shortlist
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l["listing"]["url"] == TEST_URL));

    assert!(local.path_for(DeliveryTag::Notify).ends_with("notifications.jsonl"));
    assert!(local.path_for(DeliveryTag::Notify).exists());
}
