// src/viewer.rs
//
// Document-reading core: page text extraction over lopdf, an at-most-once
// per-page text cache, linear first-match search, and the subfolder grouping
// used by the course file listing.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::CourseFile;

/// Bucket name for files that carry no subfolder.
pub const LOOSE_FILES_BUCKET: &str = "_files";

#[derive(Debug)]
pub enum ViewerError {
    Document(lopdf::Error),
    PageOutOfRange { page: u32, page_count: u32 },
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::Document(e) => write!(f, "document error: {e}"),
            ViewerError::PageOutOfRange { page, page_count } => {
                write!(f, "page {page} out of range (document has {page_count})")
            }
        }
    }
}

impl From<lopdf::Error> for ViewerError {
    fn from(value: lopdf::Error) -> Self {
        Self::Document(value)
    }
}

/// Seam between pagination/search logic and the PDF backend. Pages are
/// addressed by 1-based ordinal in document order.
pub trait PageSource {
    fn page_count(&self) -> u32;
    fn page_text(&self, page: u32) -> Result<String, ViewerError>;
}

/// lopdf-backed source for a document already fetched into memory.
pub struct PdfSource {
    doc: lopdf::Document,
    page_numbers: Vec<u32>,
}

impl PdfSource {
    pub fn load(bytes: &[u8]) -> Result<Self, ViewerError> {
        let doc = lopdf::Document::load_mem(bytes)?;
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        Ok(Self { doc, page_numbers })
    }
}

impl PageSource for PdfSource {
    fn page_count(&self) -> u32 {
        self.page_numbers.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, ViewerError> {
        if page == 0 || page as usize > self.page_numbers.len() {
            return Err(ViewerError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            });
        }
        let number = self.page_numbers[(page - 1) as usize];
        Ok(self.doc.extract_text(&[number])?)
    }
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Empty query; nothing was scanned.
    Skipped,
    Match { page: u32 },
    NoMatch,
}

/// Per-document text cache. Each page is extracted at most once per index,
/// no matter how many times it is asked for; extraction failures are logged
/// and the page is treated as blank rather than failing the whole view.
pub struct DocumentIndex<S> {
    source: S,
    cache: Vec<Option<String>>,
}

impl<S: PageSource> DocumentIndex<S> {
    pub fn new(source: S) -> Self {
        let pages = source.page_count() as usize;
        Self {
            source,
            cache: vec![None; pages],
        }
    }

    pub fn page_count(&self) -> u32 {
        self.source.page_count()
    }

    pub fn source_ref(&self) -> &S {
        &self.source
    }

    pub fn page_text(&mut self, page: u32) -> Result<&str, ViewerError> {
        if page == 0 || page > self.page_count() {
            return Err(ViewerError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            });
        }

        let slot = (page - 1) as usize;
        if self.cache[slot].is_none() {
            let text = match self.source.page_text(page) {
                Ok(t) => t,
                Err(e) => {
                    log::error!("page {page} text extraction failed: {e}");
                    String::new()
                }
            };
            self.cache[slot] = Some(text);
        }

        Ok(self.cache[slot].as_deref().unwrap_or_default())
    }

    /// Linear scan in increasing page order, stopping at the first page whose
    /// text contains the query (case-insensitive). Restarts from page 1 on
    /// every call.
    pub fn find_first(&mut self, query: &str) -> SearchOutcome {
        if query.is_empty() {
            return SearchOutcome::Skipped;
        }

        let needle = query.to_lowercase();
        for page in 1..=self.page_count() {
            let text = match self.page_text(page) {
                Ok(t) => t.to_lowercase(),
                Err(_) => continue,
            };
            if text.contains(&needle) {
                return SearchOutcome::Match { page };
            }
        }

        SearchOutcome::NoMatch
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileGroup {
    pub subfolder: String,
    pub files: Vec<CourseFile>,
}

/// Partition files by subfolder for display, with files lacking one collected
/// under [`LOOSE_FILES_BUCKET`]. Display-only; access control stays course-level.
/// The sentinel bucket comes first, then subfolders in name order.
pub fn group_by_subfolder(files: Vec<CourseFile>) -> Vec<FileGroup> {
    let mut buckets: BTreeMap<String, Vec<CourseFile>> = BTreeMap::new();

    for file in files {
        let key = file
            .subfolder
            .clone()
            .unwrap_or_else(|| LOOSE_FILES_BUCKET.to_string());
        buckets.entry(key).or_default().push(file);
    }

    let mut groups = Vec::with_capacity(buckets.len());
    if let Some(files) = buckets.remove(LOOSE_FILES_BUCKET) {
        groups.push(FileGroup {
            subfolder: LOOSE_FILES_BUCKET.to_string(),
            files,
        });
    }
    groups.extend(
        buckets
            .into_iter()
            .map(|(subfolder, files)| FileGroup { subfolder, files }),
    );
    groups
}
