//! View state management.
//!
//! The host mutates the state only through [`Command`]s; every mutation
//! reports the [`Effect`]s the host must carry out, which is how a state
//! change turns into exactly one re-render without an implicit reactivity
//! layer.

use super::document::PageSize;
use super::request::RenderParams;
use super::scale::{ZOOM_IN_RATE, ZOOM_OUT_RATE, clamp_scale, clamp_zoom, fit_scale};

/// Display area dimensions in logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Current view state for a loaded document.
///
/// Invariants: the scale always lies in the allowed zoom range, and the
/// current page always lies below the page count once one is known.
#[derive(Clone, Debug)]
pub struct ViewState {
    scale: f32,
    current_page: usize,
    page_count: usize,
    container: SurfaceSize,
    device_pixel_ratio: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            current_page: 0,
            page_count: 0,
            container: SurfaceSize::default(),
            device_pixel_ratio: 1.0,
        }
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    #[must_use]
    pub fn container(&self) -> SurfaceSize {
        self.container
    }

    #[must_use]
    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SetContainer(container) => {
                if self.container != container {
                    self.container = container;
                    vec![Effect::InvalidateCache, Effect::RenderCurrentPage]
                } else {
                    vec![]
                }
            }

            Command::SetDevicePixelRatio(ratio) => {
                let ratio = if ratio.is_finite() && ratio > 0.0 {
                    ratio
                } else {
                    1.0
                };
                if (self.device_pixel_ratio - ratio).abs() > f32::EPSILON {
                    self.device_pixel_ratio = ratio;
                    vec![Effect::InvalidateCache, Effect::RenderCurrentPage]
                } else {
                    vec![]
                }
            }

            Command::SetScale(scale) => self.set_scale(clamp_scale(scale)),

            Command::ZoomIn => self.set_scale(clamp_zoom(self.scale, ZOOM_IN_RATE)),

            Command::ZoomOut => self.set_scale(clamp_zoom(self.scale, ZOOM_OUT_RATE)),

            Command::FitToContainer(page) => {
                let fit = clamp_scale(fit_scale(
                    page.width,
                    page.height,
                    self.container.width as f32,
                    self.container.height as f32,
                ));
                if (self.scale - fit).abs() > f32::EPSILON {
                    self.scale = fit;
                    vec![Effect::InvalidateCache, Effect::RenderCurrentPage]
                } else {
                    // initial load renders even when the fit equals the
                    // current scale
                    vec![Effect::RenderCurrentPage]
                }
            }

            Command::GoToPage(page) => {
                let clamped = page.min(self.page_count.saturating_sub(1));
                if self.current_page != clamped {
                    self.current_page = clamped;
                    vec![Effect::RenderCurrentPage]
                } else {
                    vec![]
                }
            }

            Command::SetPageCount(count) => {
                self.page_count = count;
                if self.current_page >= count && count > 0 {
                    self.current_page = count - 1;
                }
                vec![]
            }

            Command::Reload => {
                vec![Effect::InvalidateCache, Effect::ReloadDocument]
            }
        }
    }

    fn set_scale(&mut self, clamped: f32) -> Vec<Effect> {
        if (self.scale - clamped).abs() > f32::EPSILON {
            self.scale = clamped;
            vec![Effect::InvalidateCache, Effect::RenderCurrentPage]
        } else {
            vec![]
        }
    }

    /// Get render parameters from current state
    #[must_use]
    pub fn render_params(&self) -> RenderParams {
        RenderParams {
            scale: self.scale,
            device_pixel_ratio: self.device_pixel_ratio,
            container: self.container,
        }
    }
}

/// Commands that modify view state
#[derive(Clone, Debug)]
pub enum Command {
    /// Set the display area the page is fit into
    SetContainer(SurfaceSize),
    /// Set the device pixel ratio of the target display
    SetDevicePixelRatio(f32),
    /// Set the scale factor directly
    SetScale(f32),
    /// Zoom in by one step
    ZoomIn,
    /// Zoom out by one step
    ZoomOut,
    /// Fit a page of the given intrinsic size into the container
    FitToContainer(PageSize),
    /// Go to a specific page
    GoToPage(usize),
    /// Update the page count
    SetPageCount(usize),
    /// Reload the document from its backing file
    Reload,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Invalidate the rendered page cache
    InvalidateCache,
    /// Render the current page
    RenderCurrentPage,
    /// Reload the document wholesale
    ReloadDocument,
}
