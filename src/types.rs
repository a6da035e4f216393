use crate::{
    chunk_plan::ChunkRange,
    error::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a source document in the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub container: String,
    pub object_key: String,
}

impl DocumentRef {
    pub fn new(container: impl Into<String>, object_key: impl Into<String>) -> Result<Self> {
        let container = container.into();
        let object_key = object_key.into();
        if container.trim().is_empty() {
            return Err(Error::invalid_argument("document container must not be empty"));
        }
        if object_key.trim().is_empty() {
            return Err(Error::invalid_argument("document object key must not be empty"));
        }
        Ok(Self {
            container,
            object_key,
        })
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.object_key)
    }
}

/// Opaque job identifier handed out by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(Error::invalid_argument("job id must not be empty"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the analysis service reports job completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTarget {
    pub topic: String,
    pub role: String,
}

impl Default for NotificationTarget {
    fn default() -> Self {
        Self {
            topic: "analysis-completions".into(),
            role: "".into(),
        }
    }
}

/// Tracking payload published once per successfully submitted chunk.
///
/// Pages are zero-based and half-open, matching the planner's ranges, so the
/// downstream aggregator can order results without translating back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    job_id: JobId,
    #[serde(flatten)]
    document: DocumentRef,
    start_page: u32,
    end_page: u32,
    dispatched_at: String,
}

impl DispatchRecord {
    pub fn new(
        job_id: JobId,
        document: DocumentRef,
        chunk: ChunkRange,
        dispatched_at: impl Into<String>,
    ) -> Self {
        Self {
            job_id,
            document,
            start_page: chunk.start_page(),
            end_page: chunk.end_page(),
            dispatched_at: dispatched_at.into(),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    pub fn start_page(&self) -> u32 {
        self.start_page
    }

    pub fn end_page(&self) -> u32 {
        self.end_page
    }

    pub fn dispatched_at(&self) -> &str {
        &self.dispatched_at
    }
}
