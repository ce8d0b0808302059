pub mod actions;
pub mod learning;
pub mod pipeline;
pub mod research;
pub mod scoring;
pub mod scrape;
pub mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use actions::ActionExecutor;
pub use learning::LearningStore;
pub use pipeline::{Orchestrator, PipelineFailure, PipelineObserver, PipelineOutcome};
pub use research::ResearchAggregator;
pub use scoring::score;
pub use scrape::{ListingScraper, PageScraper};
