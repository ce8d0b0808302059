pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Body for the `/function` endpoint: a puppeteer module plus the context
/// object handed to it as its second argument.
#[derive(Debug, Serialize)]
struct FunctionRequest<'a, C: Serialize> {
    code: &'a str,
    context: &'a C,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let mut endpoint = format!("{}/{}", self.base_url, path);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    /// Fetch fully-rendered HTML content for a URL via Browserless /content endpoint.
    pub async fn content(&self, url: &str) -> Result<String> {
        let body = serde_json::json!({
            "url": url,
            "gotoOptions": { "waitUntil": "networkidle2", "timeout": 30000 },
        });

        let resp = self
            .client
            .post(self.endpoint("content"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let html = resp.text().await?;
        debug!(url, bytes = html.len(), "Rendered content fetched");
        Ok(html)
    }

    /// Run a puppeteer function on the Browserless /function endpoint and
    /// return its JSON result.
    pub async fn function<C: Serialize>(&self, code: &str, context: &C) -> Result<Value> {
        let resp = self
            .client
            .post(self.endpoint("function"))
            .header("Content-Type", "application/json")
            .json(&FunctionRequest { code, context })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| BrowserlessError::Parse(e.to_string()))
    }
}
