pub mod error;
pub mod schema;
pub mod types;

pub use error::{ParallelError, Result};
pub use schema::json_schema_for;
pub use types::{
    Citation, CitationConfidence, FieldBasis, OutputSchema, Processor, RunStatus, TaskOutput,
    TaskRequest, TaskResult, TaskRun, TaskSpec,
};

use std::time::Duration;

use reqwest::StatusCode;

const BASE_URL: &str = "https://api.parallel.ai/v1";

/// Delay between result polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// 60 polls at 5s = 5 minutes max wait per task.
const DEFAULT_MAX_POLLS: u32 = 60;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ParallelClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl ParallelClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_timeout(api_key, REQUEST_TIMEOUT)
    }

    /// Client whose individual HTTP requests are bounded by `timeout`.
    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Poll every `interval`, giving up after `max_wait` in total.
    pub fn with_polling(mut self, interval: Duration, max_wait: Duration) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        self.poll_interval = interval;
        self.max_polls = (max_wait.as_millis() / interval.as_millis()).max(1) as u32;
        self
    }

    /// Upper bound on how long `run_task` can spend polling.
    pub fn max_wait(&self) -> Duration {
        self.poll_interval * self.max_polls
    }

    /// Create a task run. Returns immediately with run metadata.
    pub async fn create_run(&self, request: &TaskRequest) -> Result<TaskRun> {
        let url = format!("{}/tasks/runs", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ParallelError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Poll the run's result endpoint until it completes, fails, or the poll
    /// budget runs out. Non-success responses other than auth failures are
    /// treated as "not ready yet".
    pub async fn wait_for_result(&self, run_id: &str) -> Result<TaskResult> {
        let url = format!("{}/tasks/runs/{}/result", self.base_url, run_id);

        for attempt in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;

            let resp = match self
                .client
                .get(&url)
                .header("x-api-key", &self.api_key)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(run_id, attempt, error = %e, "Result poll failed, retrying");
                    continue;
                }
            };

            let status = resp.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                let body = resp.text().await.unwrap_or_default();
                return Err(ParallelError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }
            if !status.is_success() {
                tracing::debug!(run_id, attempt, status = status.as_u16(), "Result not ready");
                continue;
            }

            let text = resp.text().await?;
            let result: TaskResult = serde_json::from_str(&text)?;
            match result.run.status {
                RunStatus::Completed => return Ok(result),
                RunStatus::Failed => return Err(ParallelError::RunFailed(run_id.to_string())),
                _ => {
                    tracing::debug!(run_id, attempt, status = ?result.run.status, "Run still in progress");
                }
            }
        }

        Err(ParallelError::TimedOut {
            run_id: run_id.to_string(),
            attempts: self.max_polls,
        })
    }

    /// Run a task end-to-end: create, poll, return the completed output.
    pub async fn run_task(&self, request: &TaskRequest) -> Result<TaskOutput> {
        let run = self.create_run(request).await?;
        tracing::info!(run_id = %run.run_id, "Task run created, polling for completion");

        let result = self.wait_for_result(&run.run_id).await?;
        let output = result
            .output
            .ok_or_else(|| ParallelError::Parse(format!("run {} completed without output", run.run_id)))?;

        tracing::info!(
            run_id = %run.run_id,
            basis_fields = output.basis.len(),
            "Task run completed"
        );
        Ok(output)
    }
}
