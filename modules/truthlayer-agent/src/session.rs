use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use truthlayer_common::{AgentAction, ListingData, StoreError, TruthReport};

use crate::pipeline::PipelineOutcome;

const LAST_RUN_FILE: &str = "last_run.json";

/// The most recent investigation, kept so follow-up commands (act, feedback)
/// can refer back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastRun {
    pub listing: ListingData,
    pub report: TruthReport,
    pub actions: Vec<AgentAction>,
    pub saved_at: DateTime<Utc>,
}

impl LastRun {
    pub fn from_outcome(outcome: &PipelineOutcome) -> Self {
        Self {
            listing: outcome.listing.clone(),
            report: outcome.report.clone(),
            actions: outcome.actions.clone(),
            saved_at: Utc::now(),
        }
    }
}

pub fn last_run_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LAST_RUN_FILE)
}

pub fn save(data_dir: &Path, run: &LastRun) -> Result<(), StoreError> {
    fs::create_dir_all(data_dir)?;
    let path = last_run_path(data_dir);
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(run)?)?;
    fs::rename(&tmp, &path)?;
    Ok(())
}

pub fn load(data_dir: &Path) -> Result<Option<LastRun>, StoreError> {
    match fs::read_to_string(last_run_path(data_dir)) {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
