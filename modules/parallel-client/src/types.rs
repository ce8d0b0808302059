use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Request types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Processor {
    Base,
    Core,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub json_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskSpec {
    pub output_schema: OutputSchema,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskRequest {
    pub task_spec: TaskSpec,
    pub input: String,
    pub processor: Processor,
}

impl TaskRequest {
    /// Build a request whose output must conform to `json_schema`.
    pub fn json(input: impl Into<String>, json_schema: Value, processor: Processor) -> Self {
        Self {
            task_spec: TaskSpec {
                output_schema: OutputSchema {
                    kind: "json".to_string(),
                    json_schema,
                },
            },
            input: input.into(),
            processor,
        }
    }
}

// --- Response types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskRun {
    pub run_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    #[serde(default)]
    pub processor: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default)]
    pub excerpts: Vec<String>,
}

/// Per-field justification returned alongside the task output.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldBasis {
    pub field: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub confidence: Option<CitationConfidence>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskOutput {
    pub content: Value,
    #[serde(default)]
    pub basis: Vec<FieldBasis>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskResult {
    pub run: TaskRun,
    pub output: Option<TaskOutput>,
}
