//! Document loading and page metadata.

use std::path::Path;

use mupdf::{Document as EngineDocument, MetadataName};

/// Errors from loading a document or addressing its pages.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse document: {0}")]
    DocumentParse(#[source] mupdf::error::Error),

    #[error("page {page} is out of range: document has {page_count} pages")]
    PageNotFound { page: usize, page_count: usize },

    #[error("PDF engine: {0}")]
    Engine(#[from] mupdf::error::Error),
}

/// Intrinsic page dimensions at scale 1.0, in page-space units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// A parsed multi-page document.
///
/// Thin wrapper over the engine handle; owned for the lifetime of one
/// loaded file and replaced wholesale when a new file is loaded.
pub struct Document {
    inner: EngineDocument,
    page_count: usize,
}

impl Document {
    /// Read a file into memory and parse it.
    pub fn open(path: &Path) -> Result<Self, ViewerError> {
        let bytes = std::fs::read(path).map_err(|source| ViewerError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parse a document from a raw byte buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ViewerError> {
        let inner = EngineDocument::from_bytes(bytes, "application/pdf")
            .map_err(ViewerError::DocumentParse)?;
        let page_count = inner
            .page_count()
            .map_err(ViewerError::DocumentParse)? as usize;

        Ok(Self { inner, page_count })
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Document title from metadata, if present and non-empty.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.inner
            .metadata(MetadataName::Title)
            .ok()
            .filter(|t| !t.is_empty())
    }

    /// Intrinsic size of a page, re-fetched from the engine on demand.
    pub fn page_size(&self, page: usize) -> Result<PageSize, ViewerError> {
        let loaded = self.load_page(page)?;
        let bounds = loaded.bounds()?;
        Ok(PageSize {
            width: bounds.x1 - bounds.x0,
            height: bounds.y1 - bounds.y0,
        })
    }

    pub(crate) fn load_page(&self, page: usize) -> Result<mupdf::Page, ViewerError> {
        if page >= self.page_count {
            return Err(ViewerError::PageNotFound {
                page,
                page_count: self.page_count,
            });
        }
        Ok(self.inner.load_page(page as i32)?)
    }
}
