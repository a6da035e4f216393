use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChunkPlan {
    pub page_count: u32,
    pub max_chunk_size: u32,
    pub chunks: Vec<ChunkRange>,
}

/// Zero-based, half-open page range `[start_page, end_page)`. Never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkRange {
    start_page: u32,
    end_page: u32,
}

/// One-based, closed page range `[first_page, last_page]` as the analysis
/// service numbers pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePageRange {
    pub first_page: u32,
    pub last_page: u32,
}

impl ChunkRange {
    pub fn new(start_page: u32, end_page: u32) -> Result<Self> {
        if end_page <= start_page {
            return Err(Error::invalid_argument(format!(
                "chunk range is empty: [{start_page}, {end_page})"
            )));
        }
        Ok(Self {
            start_page,
            end_page,
        })
    }

    pub fn start_page(&self) -> u32 {
        self.start_page
    }

    pub fn end_page(&self) -> u32 {
        self.end_page
    }

    pub fn page_count(&self) -> u32 {
        self.end_page - self.start_page
    }

    pub fn to_service(self) -> ServicePageRange {
        ServicePageRange {
            first_page: self.start_page + 1,
            last_page: self.end_page,
        }
    }
}

impl ServicePageRange {
    pub fn to_chunk(self) -> Result<ChunkRange> {
        if self.first_page == 0 {
            return Err(Error::invalid_argument("service pages are numbered from 1"));
        }
        ChunkRange::new(self.first_page - 1, self.last_page)
    }

    /// Every page number in the range, in order.
    pub fn pages(self) -> impl Iterator<Item = u32> {
        self.first_page..=self.last_page
    }
}

impl ChunkPlan {
    pub fn from_page_count(page_count: u32, max_chunk_size: u32) -> Result<Self> {
        if max_chunk_size < 1 {
            return Err(Error::invalid_argument(format!(
                "max_chunk_size must be at least 1, got {max_chunk_size}"
            )));
        }

        let mut chunks = Vec::with_capacity(page_count.div_ceil(max_chunk_size) as usize);
        let mut p = 0u32;

        while p < page_count {
            let end = p.saturating_add(max_chunk_size).min(page_count);
            chunks.push(ChunkRange {
                start_page: p,
                end_page: end,
            });
            p = end;
        }

        Ok(ChunkPlan {
            page_count,
            max_chunk_size,
            chunks,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }
}
