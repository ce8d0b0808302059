use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};
use truthlayer_common::{Config, DeliveryError, ListingData, Sentiment, TruthReport, Verdict};

const EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Email side channel for listing alerts. Sending is best-effort.
#[async_trait]
pub trait EmailNotifier: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn send_listing_alert(
        &self,
        listing: &ListingData,
        report: &TruthReport,
    ) -> anyhow::Result<()>;
}

/// Reports "not configured" and sends nothing.
pub struct NoopEmail;

#[async_trait]
impl EmailNotifier for NoopEmail {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send_listing_alert(
        &self,
        listing: &ListingData,
        _report: &TruthReport,
    ) -> anyhow::Result<()> {
        info!(url = %listing.url, "Email not configured, skipping listing alert");
        anyhow::bail!("email not configured")
    }
}

/// EmailJS REST API.
pub struct EmailJs {
    http: reqwest::Client,
    endpoint: String,
    service_id: String,
    template_id: String,
    public_key: String,
    to_email: String,
}

impl EmailJs {
    pub fn new(
        service_id: String,
        template_id: String,
        public_key: String,
        to_email: String,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: EMAILJS_ENDPOINT.to_string(),
            service_id,
            template_id,
            public_key,
            to_email,
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// `Ok(None)` unless every EmailJS setting is present.
    pub fn from_config(config: &Config) -> Result<Option<Self>, DeliveryError> {
        let (Some(service_id), Some(template_id), Some(public_key), Some(to_email)) = (
            config.emailjs_service_id.clone(),
            config.emailjs_template_id.clone(),
            config.emailjs_public_key.clone(),
            config.user_email.clone(),
        ) else {
            return Ok(None);
        };
        Self::new(service_id, template_id, public_key, to_email, config.http_timeout).map(Some)
    }

    fn template_params(&self, listing: &ListingData, report: &TruthReport) -> Value {
        let emoji = verdict_emoji(report.verdict);
        json!({
            "to_email": self.to_email,
            "subject": format!("{emoji} TruthLayer Alert: High-Quality Listing Found"),
            "listing_address": listing.label(),
            "listing_rent": listing.rent.map(format_dollars).unwrap_or_else(|| "n/a".to_string()),
            "listing_url": listing.url,
            "truth_score": format!("{:.0}/100", report.overall_score),
            "verdict_emoji": emoji,
            "verdict_text": report.verdict.to_string(),
            "summary": report.summary,
            "evidence_points": evidence_digest(report),
            "action_recommendation": action_text(report.verdict),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[async_trait]
impl EmailNotifier for EmailJs {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send_listing_alert(
        &self,
        listing: &ListingData,
        report: &TruthReport,
    ) -> anyhow::Result<()> {
        let body = json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.public_key,
            "template_params": self.template_params(listing, report),
        });

        let resp = self.http.post(&self.endpoint).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "EmailJS returned non-success");
            anyhow::bail!("EmailJS returned {status}");
        }

        info!(url = %listing.url, "Listing alert emailed");
        Ok(())
    }
}

fn verdict_emoji(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Recommended => "✅",
        Verdict::Caution => "⚠️",
        Verdict::Avoid => "🚫",
    }
}

fn action_text(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Recommended => "Consider shortlisting and scheduling a tour",
        Verdict::Caution => "Review carefully before proceeding",
        Verdict::Avoid => "Recommended to skip this listing",
    }
}

fn format_dollars(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("${out}")
}

/// At most four categories, two points each.
fn evidence_digest(report: &TruthReport) -> String {
    if report.evidence.is_empty() {
        return "No specific evidence found.".to_string();
    }
    report
        .evidence
        .iter()
        .take(4)
        .map(|e| {
            let marker = match e.sentiment {
                Sentiment::Positive => "✅",
                Sentiment::Negative => "❌",
                Sentiment::Neutral => "⚪",
            };
            let points = e.points.iter().take(2).cloned().collect::<Vec<_>>().join(", ");
            format!("{marker} {}: {points}", e.category)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollars_get_thousands_separators() {
        assert_eq!(format_dollars(950), "$950");
        assert_eq!(format_dollars(3000), "$3,000");
        assert_eq!(format_dollars(1234567), "$1,234,567");
    }
}
