use crate::{
    chunk_plan::{ChunkRange, ServicePageRange},
    types::{DocumentRef, NotificationTarget},
};
use anyhow::{Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^chunk_(\d+)_(\d+)$").expect("valid correlation tag regex"));

/// Tag attached to a submission so its completion notification can be
/// matched back to the chunk without a lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationTag(String);

impl CorrelationTag {
    pub fn for_chunk(chunk: ChunkRange) -> Self {
        Self(format!("chunk_{}_{}", chunk.start_page(), chunk.end_page()))
    }

    pub fn parse(raw: &str) -> Result<ChunkRange> {
        let caps = TAG_RE
            .captures(raw)
            .ok_or_else(|| anyhow!("not a chunk correlation tag: {raw}"))?;
        let start: u32 = caps[1].parse()?;
        let end: u32 = caps[2].parse()?;
        Ok(ChunkRange::new(start, end)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub document: DocumentRef,
    pub page_ranges: Vec<ServicePageRange>,
    pub correlation_tag: CorrelationTag,
    pub notification_target: NotificationTarget,
    pub feature_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOut {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
