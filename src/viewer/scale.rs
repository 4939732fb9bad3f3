//! Fit-to-container scaling and zoom clamping.
//!
//! All functions here are pure; the view state applies them and the host
//! reads the results back.

/// Minimum allowed zoom factor
pub const MIN_ZOOM: f32 = 0.1;
/// Maximum allowed zoom factor
pub const MAX_ZOOM: f32 = 10.0;

/// Zoom-in multiplier per step - 10%
pub const ZOOM_IN_RATE: f32 = 1.1;
/// Zoom-out multiplier per step - 10%
pub const ZOOM_OUT_RATE: f32 = 0.9;

/// Largest uniform scale at which a page fits entirely within a container.
///
/// Returns 1.0 when the container has not been measured yet (either
/// dimension is zero) or any input is degenerate, so callers never divide
/// by zero.
#[must_use]
pub fn fit_scale(
    page_width: f32,
    page_height: f32,
    container_width: f32,
    container_height: f32,
) -> f32 {
    if page_width <= 0.0 || page_height <= 0.0 {
        return 1.0;
    }
    if container_width <= 0.0 || container_height <= 0.0 {
        return 1.0;
    }

    let width_scale = container_width / page_width;
    let height_scale = container_height / page_height;
    let scale = width_scale.min(height_scale);

    if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
}

/// Clamp an arbitrary scale into the allowed zoom range.
///
/// Non-finite input falls back to 1.0.
#[must_use]
pub fn clamp_scale(scale: f32) -> f32 {
    if !scale.is_finite() {
        return 1.0;
    }
    scale.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Apply a zoom factor to the current scale, clamped to the allowed range.
///
/// Once at a boundary, a further step in the same direction is a no-op.
#[must_use]
pub fn clamp_zoom(current: f32, factor: f32) -> f32 {
    clamp_scale(current * factor)
}

/// Scale as a whole percentage for display.
#[must_use]
pub fn percentage(scale: f32) -> u32 {
    (scale * 100.0).round().max(0.0) as u32
}
