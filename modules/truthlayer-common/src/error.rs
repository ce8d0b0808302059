use thiserror::Error;

use crate::types::{ActionStatus, AgentState};

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid listing URL: {0}")]
    InvalidUrl(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Page load timed out")]
    Timeout,
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Webhook returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    #[error("Form auto-fill failed: {0}")]
    Form(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Scraping failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Learning store error: {0}")]
    Store(#[from] StoreError),

    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Cancelled during {0}")]
    Cancelled(AgentState),

    #[error("No listing has been investigated yet")]
    NoActiveListing,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid action transition {from} -> {to}")]
pub struct ActionTransitionError {
    pub from: ActionStatus,
    pub to: ActionStatus,
}
