//! Render request and response types.

use std::sync::Arc;

use super::document::{PageSize, ViewerError};
use super::pipeline::RenderedPage;
use super::state::SurfaceSize;

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Id carried by faults tied to the document itself rather than to any
    /// particular request, such as a parse failure.
    pub const DOCUMENT: RequestId = RequestId::new(0);

    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Parameters for rendering a page
#[derive(Clone, Debug)]
pub struct RenderParams {
    /// User-controlled scale factor
    pub scale: f32,
    /// Ratio of physical to logical pixels of the target display
    pub device_pixel_ratio: f32,
    /// Display area the page is being fit into, in logical pixels
    pub container: SurfaceSize,
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Render a page at the given parameters
    Page {
        id: RequestId,
        page: usize,
        params: RenderParams,
    },

    /// Report the intrinsic size of a page
    PageSize { id: RequestId, page: usize },

    /// Shutdown the worker
    Shutdown,
}

/// Errors from the render pipeline
#[derive(Debug, thiserror::Error)]
pub enum RenderFault {
    #[error("PDF engine: {0}")]
    Engine(#[from] mupdf::error::Error),

    #[error(transparent)]
    Document(#[from] ViewerError),

    #[error("{detail}")]
    Generic { detail: String },
}

impl RenderFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    /// Rendered page pixels
    Page {
        id: RequestId,
        page: usize,
        data: Arc<RenderedPage>,
    },

    /// Intrinsic page size
    PageSize {
        id: RequestId,
        page: usize,
        size: PageSize,
    },

    /// Request was replaced by a newer one before rendering started
    Superseded(RequestId),

    /// Error during loading or rendering
    Error { id: RequestId, error: RenderFault },

    /// Document metadata (sent once after a successful parse)
    DocumentInfo {
        page_count: usize,
        title: Option<String>,
    },
}
