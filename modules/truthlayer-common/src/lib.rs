pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{
    ActionTransitionError, DeliveryError, PipelineError, ScrapeError, StoreError,
};
pub use types::*;
