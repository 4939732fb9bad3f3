//! PDF viewing infrastructure: document loading, view state, scaling, and
//! the serialized render pipeline.

mod cache;
mod document;
mod pipeline;
mod request;
mod scale;
mod service;
mod state;
mod worker;

pub use cache::{CacheKey, PageCache};
pub use document::{Document, PageSize, ViewerError};
pub use pipeline::{RenderedPage, draw_transform, render_page, surface_size};
pub use request::{RenderFault, RenderParams, RenderRequest, RenderResponse, RequestId};
pub use scale::{
    MAX_ZOOM, MIN_ZOOM, ZOOM_IN_RATE, ZOOM_OUT_RATE, clamp_scale, clamp_zoom, fit_scale,
    percentage,
};
pub use service::{DocumentInfo, RenderService};
pub use state::{Command, Effect, SurfaceSize, ViewState};
pub use worker::render_worker;

/// Default number of rendered pages kept in the LRU cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;
