#![allow(dead_code)]

use anyhow::{Result, anyhow};
use chunk_dispatch::{
    analysis::{AnalysisRequest, AnalysisService},
    config::Config,
    orchestrator::Orchestrator,
    page_count::PageCounter,
    queue::OutboundQueue,
    store::DocumentStore,
    types::{DispatchRecord, DocumentRef, JobId},
};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Ordered log of calls made to the fakes, shared between them.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

#[derive(Clone, Default)]
pub struct FakeStore {
    pub missing: bool,
}

impl DocumentStore for FakeStore {
    fn fetch_into(&self, doc: &DocumentRef, dest: &mut File) -> Result<u64> {
        if self.missing {
            return Err(anyhow!("no such object: {doc}"));
        }
        dest.write_all(b"%PDF-fake")?;
        Ok(9)
    }
}

#[derive(Clone)]
pub struct FixedPages(pub u32);

impl PageCounter for FixedPages {
    fn count_pages(&self, path: &Path) -> chunk_dispatch::Result<u32> {
        assert!(path.exists(), "page counter ran on a missing local copy");
        Ok(self.0)
    }
}

#[derive(Clone, Default)]
pub struct FakeAnalysis {
    pub journal: Journal,
    pub requests: Arc<Mutex<Vec<AnalysisRequest>>>,
    /// Zero-based submission index that fails.
    pub fail_on: Option<usize>,
}

impl AnalysisService for FakeAnalysis {
    fn submit(&self, req: &AnalysisRequest) -> Result<JobId> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(req.clone());
        self.journal
            .lock()
            .unwrap()
            .push(format!("submit {}", req.correlation_tag));
        if self.fail_on == Some(index) {
            return Err(anyhow!("service unavailable"));
        }
        Ok(JobId::new(format!("job-{index}"))?)
    }
}

#[derive(Clone, Default)]
pub struct FakeQueue {
    pub journal: Journal,
    pub records: Arc<Mutex<Vec<DispatchRecord>>>,
    pub broken: bool,
}

impl OutboundQueue for FakeQueue {
    fn publish(&self, record: &DispatchRecord) -> Result<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("publish {}", record.job_id()));
        if self.broken {
            return Err(anyhow!("queue unreachable"));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

pub fn doc() -> DocumentRef {
    DocumentRef::new("incoming", "contracts/lease.pdf").unwrap()
}

pub fn config(max_chunk_size: u32, work_dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.dispatch.max_chunk_size = max_chunk_size;
    cfg.paths.work_dir = work_dir.display().to_string();
    cfg
}

pub struct Harness {
    pub journal: Journal,
    pub analysis: FakeAnalysis,
    pub queue: FakeQueue,
    pub work_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            analysis: FakeAnalysis {
                journal: journal.clone(),
                ..Default::default()
            },
            queue: FakeQueue {
                journal: journal.clone(),
                ..Default::default()
            },
            journal,
            work_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn orchestrator(
        &self,
        pages: u32,
        max_chunk_size: u32,
    ) -> Orchestrator<FakeStore, FixedPages, FakeAnalysis, FakeQueue> {
        self.orchestrator_with_store(FakeStore::default(), pages, max_chunk_size)
    }

    pub fn orchestrator_with_store(
        &self,
        store: FakeStore,
        pages: u32,
        max_chunk_size: u32,
    ) -> Orchestrator<FakeStore, FixedPages, FakeAnalysis, FakeQueue> {
        Orchestrator::new(
            &config(max_chunk_size, self.work_dir.path()),
            store,
            FixedPages(pages),
            self.analysis.clone(),
            self.queue.clone(),
        )
    }

    pub fn submissions(&self) -> usize {
        self.analysis.requests.lock().unwrap().len()
    }

    pub fn work_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.work_dir.path())
            .unwrap()
            .next()
            .is_none()
    }
}
