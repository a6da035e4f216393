use crate::{types::DispatchRecord, util::ensure_dir};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable outbound channel for dispatch records. Delivery is at-least-once;
/// consumers deduplicate.
pub trait OutboundQueue {
    fn publish(&self, record: &DispatchRecord) -> Result<()>;
}

/// Append-only JSON-lines spool file. Each record is one line, synced to disk
/// before `publish` returns.
#[derive(Debug, Clone)]
pub struct SpoolQueue {
    path: PathBuf,
}

impl SpoolQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutboundQueue for SpoolQueue {
    fn publish(&self, record: &DispatchRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open queue spool: {}", self.path.display()))?;
        file.write_all(&line)
            .with_context(|| format!("append to queue spool: {}", self.path.display()))?;
        file.sync_data()
            .with_context(|| format!("sync queue spool: {}", self.path.display()))?;

        debug!("queued job {} to {}", record.job_id(), self.path.display());
        Ok(())
    }
}
