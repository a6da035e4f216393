use crate::{
    analysis::AnalysisService,
    chunk_plan::ChunkPlan,
    config::Config,
    dispatcher::ChunkDispatcher,
    error::{Error, Result},
    page_count::PageCounter,
    queue::OutboundQueue,
    store::{DocumentStore, LocalDocument},
    types::DocumentRef,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Success,
    Failure,
}

/// Terminal result of one invocation. On failure `chunk_count` is the number
/// of chunks dispatched before the run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    status: Status,
    chunk_count: usize,
    planned_chunks: Option<usize>,
    error: Option<String>,
}

impl Outcome {
    fn success(chunk_count: usize) -> Self {
        Self {
            status: Status::Success,
            chunk_count,
            planned_chunks: Some(chunk_count),
            error: None,
        }
    }

    /// Failure before any document was processed, e.g. unusable configuration.
    pub fn rejected(err: impl Into<anyhow::Error>) -> Self {
        Self::failure(0, None, err.into())
    }

    fn failure(dispatched: usize, planned: Option<usize>, err: anyhow::Error) -> Self {
        let message = format!("{err:#}");
        let error = match planned {
            Some(planned) if dispatched < planned => format!(
                "dispatched {dispatched} of {planned} chunks before failing: {message}"
            ),
            _ => message,
        };
        Self {
            status: Status::Failure,
            chunk_count: dispatched,
            planned_chunks: planned,
            error: Some(error),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Size of the plan, if the run got far enough to make one.
    pub fn planned_chunks(&self) -> Option<usize> {
        self.planned_chunks
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn into_response(self) -> InvocationResponse {
        match self.status {
            Status::Success => InvocationResponse {
                status_code: 200,
                body: ResponseBody::Success {
                    message: format!("Started processing {} chunks", self.chunk_count),
                    total_chunks: self.chunk_count,
                },
            },
            Status::Failure => InvocationResponse {
                status_code: 500,
                body: ResponseBody::Error {
                    error: self.error.unwrap_or_else(|| "unknown error".into()),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub container: String,
    pub object_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Success { message: String, total_chunks: usize },
    Error { error: String },
}

/// Where a failed run stopped.
struct RunFailure {
    dispatched: usize,
    planned: Option<usize>,
    error: Error,
}

impl From<Error> for RunFailure {
    fn from(error: Error) -> Self {
        Self {
            dispatched: 0,
            planned: None,
            error,
        }
    }
}

pub struct Orchestrator<S, P, A, Q>
where
    S: DocumentStore,
    P: PageCounter,
    A: AnalysisService,
    Q: OutboundQueue,
{
    store: S,
    counter: P,
    dispatcher: ChunkDispatcher<A, Q>,
    max_chunk_size: u32,
    work_dir: PathBuf,
}

impl<S, P, A, Q> Orchestrator<S, P, A, Q>
where
    S: DocumentStore,
    P: PageCounter,
    A: AnalysisService,
    Q: OutboundQueue,
{
    pub fn new(cfg: &Config, store: S, counter: P, analysis: A, queue: Q) -> Self {
        Self {
            store,
            counter,
            dispatcher: ChunkDispatcher::new(
                analysis,
                queue,
                cfg.dispatch.notification_target.clone(),
                cfg.analysis.feature_types.clone(),
            ),
            max_chunk_size: cfg.dispatch.max_chunk_size,
            work_dir: PathBuf::from(&cfg.paths.work_dir),
        }
    }

    /// Handles a raw `{container, object_key}` invocation.
    pub fn handle(&self, req: &InvocationRequest) -> InvocationResponse {
        let outcome = match DocumentRef::new(req.container.as_str(), req.object_key.as_str()) {
            Ok(doc) => self.run(&doc),
            Err(err) => {
                error!("rejected invocation: {err}");
                Outcome::rejected(err)
            }
        };
        outcome.into_response()
    }

    /// Fetches, plans and dispatches `doc`. Every error ends up in the
    /// returned outcome.
    pub fn run(&self, doc: &DocumentRef) -> Outcome {
        let started = Instant::now();
        match self.try_run(doc) {
            Ok(n) => {
                info!(
                    "dispatched {} chunks for {} in {:?}",
                    n,
                    doc,
                    started.elapsed()
                );
                Outcome::success(n)
            }
            Err(f) => {
                let kind = f.error.kind();
                let outcome = Outcome::failure(f.dispatched, f.planned, f.error.into());
                error!(
                    kind,
                    "processing {} failed: {}",
                    doc,
                    outcome.error().unwrap_or_default()
                );
                outcome
            }
        }
    }

    fn try_run(&self, doc: &DocumentRef) -> std::result::Result<usize, RunFailure> {
        // Dropping `local` removes the temporary copy on every path out of here.
        let local = LocalDocument::fetch(&self.store, doc, &self.work_dir)?;
        info!("fetched {} ({} bytes)", doc, local.bytes());

        let plan = self.plan(&local)?;
        info!(
            "planned {} chunks for {} pages (max {} per chunk)",
            plan.len(),
            plan.page_count,
            plan.max_chunk_size
        );

        if plan.is_empty() {
            return Ok(0);
        }

        for (i, chunk) in plan.chunks.iter().enumerate() {
            match self.dispatcher.dispatch(doc, *chunk) {
                Ok(job_id) => info!(
                    "chunk {} pages [{}, {}) job_id={}",
                    i,
                    chunk.start_page(),
                    chunk.end_page(),
                    job_id
                ),
                Err(error) => {
                    if i > 0 {
                        warn!("{} chunks already dispatched for {} remain in flight", i, doc);
                    }
                    return Err(RunFailure {
                        dispatched: i,
                        planned: Some(plan.len()),
                        error,
                    });
                }
            }
        }

        Ok(plan.len())
    }

    fn plan(&self, local: &LocalDocument) -> Result<ChunkPlan> {
        let pages = self.counter.count_pages(local.path())?;
        ChunkPlan::from_page_count(pages, self.max_chunk_size)
    }
}
