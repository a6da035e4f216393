use crate::{
    analysis::{AnalysisRequest, AnalysisService, CorrelationTag},
    chunk_plan::ChunkRange,
    error::{Error, Result},
    queue::OutboundQueue,
    types::{DispatchRecord, DocumentRef, JobId, NotificationTarget},
    util::now_rfc3339,
};
use tracing::{debug, error, warn};

/// Submits single chunks to the analysis service and publishes one
/// correlation record per accepted job. Never retries.
pub struct ChunkDispatcher<A: AnalysisService, Q: OutboundQueue> {
    analysis: A,
    queue: Q,
    notification_target: NotificationTarget,
    feature_types: Vec<String>,
}

impl<A: AnalysisService, Q: OutboundQueue> ChunkDispatcher<A, Q> {
    pub fn new(
        analysis: A,
        queue: Q,
        notification_target: NotificationTarget,
        feature_types: Vec<String>,
    ) -> Self {
        Self {
            analysis,
            queue,
            notification_target,
            feature_types,
        }
    }

    pub fn dispatch(&self, doc: &DocumentRef, chunk: ChunkRange) -> Result<JobId> {
        let req = AnalysisRequest {
            document: doc.clone(),
            page_ranges: vec![chunk.to_service()],
            correlation_tag: CorrelationTag::for_chunk(chunk),
            notification_target: self.notification_target.clone(),
            feature_types: self.feature_types.clone(),
        };
        debug!(?req, "submitting chunk");

        let job_id = self.analysis.submit(&req).map_err(|source| {
            warn!(
                "submission failed for {} pages [{}, {}): {:#}",
                doc,
                chunk.start_page(),
                chunk.end_page(),
                source
            );
            Error::Dispatch {
                start_page: chunk.start_page(),
                end_page: chunk.end_page(),
                source,
            }
        })?;

        let record = DispatchRecord::new(job_id.clone(), doc.clone(), chunk, now_rfc3339());
        self.queue.publish(&record).map_err(|source| {
            error!(
                "job {} for {} pages [{}, {}) is orphaned: {:#}",
                job_id,
                doc,
                chunk.start_page(),
                chunk.end_page(),
                source
            );
            Error::CorrelationPublish {
                job_id: job_id.to_string(),
                start_page: chunk.start_page(),
                end_page: chunk.end_page(),
                source,
            }
        })?;

        Ok(job_id)
    }
}
