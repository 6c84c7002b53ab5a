pub mod config;
pub mod error;
pub mod fetcher;
pub mod market_data;
pub mod persist;
pub mod pipeline;
pub mod reconcile;
pub mod telemetry;
pub mod updater;

pub use error::{PipelineError, PipelineResult};
