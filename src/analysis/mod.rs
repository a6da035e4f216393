pub mod command;
pub mod types;

use crate::types::JobId;
use anyhow::Result;

pub use types::{AnalysisRequest, CorrelationTag, SubmitOut};

/// Asynchronous document analysis backend. `submit` returns as soon as the
/// job is accepted; completion is reported to the request's notification
/// target.
pub trait AnalysisService {
    fn submit(&self, req: &AnalysisRequest) -> Result<JobId>;
}
