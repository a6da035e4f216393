pub mod analysis;
pub mod chunk_plan;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod page_count;
pub mod queue;
pub mod store;
pub mod types;
pub mod util;

pub use error::{Error, Result};
