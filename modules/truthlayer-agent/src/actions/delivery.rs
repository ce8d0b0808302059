use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use truthlayer_common::{DeliveryError, StoreError};

/// What is being delivered. Doubles as the webhook `action` field and picks
/// the local collection file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryTag {
    Shortlist,
    Blacklist,
    Notify,
    ScheduleTour,
}

impl DeliveryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryTag::Shortlist => "shortlist",
            DeliveryTag::Blacklist => "blacklist",
            DeliveryTag::Notify => "notify",
            DeliveryTag::ScheduleTour => "schedule_tour",
        }
    }

    pub fn collection(&self) -> &'static str {
        match self {
            DeliveryTag::Shortlist => "shortlist",
            DeliveryTag::Blacklist => "blacklist",
            DeliveryTag::Notify => "notifications",
            DeliveryTag::ScheduleTour => "tour_requests",
        }
    }
}

/// Where action payloads end up.
#[async_trait]
pub trait DeliveryBackend: Send + Sync {
    /// Deliver one payload and return a receipt for the action ledger.
    async fn deliver(&self, tag: DeliveryTag, data: &Value) -> Result<Value, DeliveryError>;

    /// True for the local durable fallback.
    fn is_local(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// POSTs `{action, data}` to a single webhook URL.
pub struct WebhookDelivery {
    webhook_url: String,
    http: reqwest::Client,
}

impl WebhookDelivery {
    pub fn new(webhook_url: String, timeout: Duration) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Network(e.to_string()))?;
        Ok(Self { webhook_url, http })
    }
}

#[async_trait]
impl DeliveryBackend for WebhookDelivery {
    async fn deliver(&self, tag: DeliveryTag, data: &Value) -> Result<Value, DeliveryError> {
        let payload = json!({ "action": tag.as_str(), "data": data });

        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            warn!(action = tag.as_str(), status = %status, "Webhook returned non-success");
            return Err(DeliveryError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;
        debug!(action = tag.as_str(), "Webhook delivered");

        // Webhook receivers are free to answer with anything; keep JSON when we get it.
        Ok(serde_json::from_str(&body)
            .unwrap_or_else(|_| json!({ "success": true, "status": status.as_u16() })))
    }
}

// ---------------------------------------------------------------------------
// LocalDelivery
// ---------------------------------------------------------------------------

/// Appends each payload as one JSON line to `<dir>/<collection>.jsonl`.
pub struct LocalDelivery {
    dir: PathBuf,
}

impl LocalDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, tag: DeliveryTag) -> PathBuf {
        self.dir.join(format!("{}.jsonl", tag.collection()))
    }

    async fn append(&self, tag: DeliveryTag, data: &Value) -> Result<PathBuf, StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut line = serde_json::to_string(data)?;
        line.push('\n');

        let path = self.path_for(tag);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(path)
    }
}

#[async_trait]
impl DeliveryBackend for LocalDelivery {
    async fn deliver(&self, tag: DeliveryTag, data: &Value) -> Result<Value, DeliveryError> {
        let path = self.append(tag, data).await?;
        debug!(action = tag.as_str(), path = %path.display(), "Stored locally");
        Ok(json!({ "success": true, "stored": "locally" }))
    }

    fn is_local(&self) -> bool {
        true
    }
}
