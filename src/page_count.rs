use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

pub trait PageCounter {
    /// Total number of pages in the document at `path`. An empty document
    /// is valid and yields 0.
    fn count_pages(&self, path: &Path) -> Result<u32>;
}

/// Counts pages by parsing the PDF page tree with `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfPageCounter;

impl PageCounter for PdfPageCounter {
    fn count_pages(&self, path: &Path) -> Result<u32> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| Error::document_read(path.display().to_string(), e))?;
        let pages = doc.get_pages().len();
        debug!("pdf {} has {} pages", path.display(), pages);
        u32::try_from(pages).map_err(|e| Error::document_read(path.display().to_string(), e))
    }
}
