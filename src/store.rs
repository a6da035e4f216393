use crate::{
    error::{Error, Result},
    types::DocumentRef,
    util::ensure_dir,
};
use anyhow::{Context, anyhow};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Source of the documents to be chunked.
pub trait DocumentStore {
    /// Copies the whole object identified by `doc` into `dest`.
    fn fetch_into(&self, doc: &DocumentRef, dest: &mut File) -> anyhow::Result<u64>;
}

/// Documents laid out on disk as `{root}/{container}/{object_key}`.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, doc: &DocumentRef) -> anyhow::Result<PathBuf> {
        let container = Path::new(&doc.container);
        let key = Path::new(&doc.object_key);
        for part in [container, key] {
            if part
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(anyhow!(
                    "path escapes the store root: {}",
                    part.display()
                ));
            }
        }
        Ok(self.root.join(container).join(key))
    }
}

impl DocumentStore for FsDocumentStore {
    fn fetch_into(&self, doc: &DocumentRef, dest: &mut File) -> anyhow::Result<u64> {
        let path = self.resolve(doc)?;
        let mut src =
            File::open(&path).with_context(|| format!("open {}", path.display()))?;
        let copied = std::io::copy(&mut src, dest)
            .with_context(|| format!("copy {}", path.display()))?;
        Ok(copied)
    }
}

/// Local temporary copy of a fetched document. The file is removed when this
/// value is dropped.
#[derive(Debug)]
pub struct LocalDocument {
    file: NamedTempFile,
    bytes: u64,
}

impl LocalDocument {
    pub fn fetch(
        store: &(impl DocumentStore + ?Sized),
        doc: &DocumentRef,
        work_dir: &Path,
    ) -> Result<Self> {
        let read_err = |e: anyhow::Error| Error::document_read(doc.to_string(), e);

        ensure_dir(work_dir).map_err(read_err)?;
        let mut file = tempfile::Builder::new()
            .prefix("chunk-dispatch-")
            .suffix(".pdf")
            .tempfile_in(work_dir)
            .context("create temporary document")
            .map_err(read_err)?;

        let bytes = store.fetch_into(doc, file.as_file_mut()).map_err(read_err)?;
        let handle = file.as_file_mut();
        handle
            .flush()
            .context("flush temporary document")
            .map_err(read_err)?;
        handle
            .seek(SeekFrom::Start(0))
            .context("rewind temporary document")
            .map_err(read_err)?;

        debug!("fetched {} ({} bytes) to {}", doc, bytes, file.path().display());
        Ok(Self { file, bytes })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}
