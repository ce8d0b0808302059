use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_PARALLEL_BASE_URL: &str = "https://api.parallel.ai/v1";

/// Runtime configuration loaded from environment variables.
///
/// Every integration is optional: a missing key disables that integration and
/// the pipeline falls back (plain HTTP fetch, synthetic research, local
/// delivery, no email).
#[derive(Debug, Clone)]
pub struct Config {
    // Research
    pub parallel_api_key: Option<String>,
    pub parallel_base_url: String,
    pub research_max_wait: Duration,

    // Browser automation
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,

    // Delivery
    pub webhook_url: Option<String>,
    pub emailjs_service_id: Option<String>,
    pub emailjs_template_id: Option<String>,
    pub emailjs_public_key: Option<String>,
    pub user_email: Option<String>,

    // Local state
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallel_api_key: None,
            parallel_base_url: DEFAULT_PARALLEL_BASE_URL.to_string(),
            research_max_wait: Duration::from_secs(300),
            browserless_url: None,
            browserless_token: None,
            webhook_url: None,
            emailjs_service_id: None,
            emailjs_template_id: None,
            emailjs_public_key: None,
            user_email: None,
            data_dir: PathBuf::from(".truthlayer"),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load `.env` from the working directory when present, then read the
    /// environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_process_env()
    }

    /// Load a specific env file, then read the environment. Variables already
    /// set in the process take precedence over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, dotenvy::Error> {
        dotenvy::from_path(path.as_ref())?;
        Ok(Self::from_process_env())
    }

    fn from_process_env() -> Self {
        let defaults = Self::default();
        Self {
            parallel_api_key: optional_env("PARALLEL_API_KEY"),
            parallel_base_url: optional_env("PARALLEL_BASE_URL")
                .unwrap_or(defaults.parallel_base_url),
            research_max_wait: secs_env("RESEARCH_MAX_WAIT_SECS")
                .unwrap_or(defaults.research_max_wait),
            browserless_url: optional_env("BROWSERLESS_URL"),
            browserless_token: optional_env("BROWSERLESS_TOKEN"),
            webhook_url: optional_env("WEBHOOK_URL"),
            emailjs_service_id: optional_env("EMAILJS_SERVICE_ID"),
            emailjs_template_id: optional_env("EMAILJS_TEMPLATE_ID"),
            emailjs_public_key: optional_env("EMAILJS_PUBLIC_KEY"),
            user_email: optional_env("USER_EMAIL"),
            data_dir: optional_env("TRUTHLAYER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            http_timeout: secs_env("HTTP_TIMEOUT_SECS").unwrap_or(defaults.http_timeout),
        }
    }

    /// EmailJS needs all three identifiers plus a recipient.
    pub fn email_enabled(&self) -> bool {
        self.emailjs_service_id.is_some()
            && self.emailjs_template_id.is_some()
            && self.emailjs_public_key.is_some()
            && self.user_email.is_some()
    }

    /// Log which integrations are active without printing secrets.
    pub fn log_redacted(&self) {
        tracing::info!(
            parallel = self.parallel_api_key.is_some(),
            parallel_base_url = %self.parallel_base_url,
            research_max_wait_secs = self.research_max_wait.as_secs(),
            browserless = self.browserless_url.is_some(),
            webhook = self.webhook_url.is_some(),
            email = self.email_enabled(),
            data_dir = %self.data_dir.display(),
            "Configuration loaded"
        );
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn secs_env(key: &str) -> Option<Duration> {
    let raw = optional_env(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring non-numeric duration");
            None
        }
    }
}
