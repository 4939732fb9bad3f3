//! Page rasterization through the PDF engine.

use mupdf::{Colorspace, Matrix, Pixmap};

use super::document::Document;
use super::request::{RenderFault, RenderParams};

/// A page rendered into a tightly packed RGB pixel buffer.
#[derive(Clone)]
pub struct RenderedPage {
    /// Raw RGB pixel data (3 bytes per pixel)
    pub pixels: Vec<u8>,
    /// Surface width in physical pixels
    pub width_px: u32,
    /// Surface height in physical pixels
    pub height_px: u32,
    /// Viewport width at the requested scale, in logical pixels
    pub viewport_width: f32,
    /// Viewport height at the requested scale, in logical pixels
    pub viewport_height: f32,
    /// Page number (0-indexed)
    pub page: usize,
    /// Scale factor used for rendering
    pub scale: f32,
}

impl std::fmt::Debug for RenderedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedPage")
            .field("page", &self.page)
            .field("scale", &self.scale)
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .finish_non_exhaustive()
    }
}

/// Physical surface dimensions for a viewport at the given output scale.
#[must_use]
pub fn surface_size(viewport_width: f32, viewport_height: f32, output_scale: f32) -> (u32, u32) {
    (
        (viewport_width * output_scale).max(0.0).floor() as u32,
        (viewport_height * output_scale).max(0.0).floor() as u32,
    )
}

/// Uniform draw transform mapping page space onto the physical surface.
///
/// At an output scale of 1 the transform is the plain viewport scale;
/// otherwise the device-pixel multiplier is composed in so logical viewport
/// coordinates land on the higher-resolution surface.
#[must_use]
pub fn draw_transform(scale: f32, output_scale: f32) -> Matrix {
    let mag = if (output_scale - 1.0).abs() > f32::EPSILON {
        scale * output_scale
    } else {
        scale
    };
    Matrix::new_scale(mag, mag)
}

/// Render one page into an RGB surface.
///
/// Best-effort: failures are returned to the caller, never retried here.
pub fn render_page(
    doc: &Document,
    page_num: usize,
    params: &RenderParams,
) -> Result<RenderedPage, RenderFault> {
    let size = doc.page_size(page_num)?;

    let scale = params.scale;
    let viewport_width = size.width * scale;
    let viewport_height = size.height * scale;

    let output_scale =
        if params.device_pixel_ratio.is_finite() && params.device_pixel_ratio > 0.0 {
            params.device_pixel_ratio
        } else {
            1.0
        };

    let (surface_width, surface_height) =
        surface_size(viewport_width, viewport_height, output_scale);
    if surface_width == 0 || surface_height == 0 {
        return Err(RenderFault::generic(format!(
            "page {page_num} renders to an empty surface at scale {scale}"
        )));
    }

    let page = doc.load_page(page_num)?;
    let transform = draw_transform(scale, output_scale);
    let rgb = Colorspace::device_rgb();
    let pixmap = page.to_pixmap(&transform, &rgb, false, false)?;
    let pixels = pixmap_to_rgb(&pixmap, surface_width, surface_height)?;

    Ok(RenderedPage {
        pixels,
        width_px: surface_width,
        height_px: surface_height,
        viewport_width,
        viewport_height,
        page: page_num,
        scale,
    })
}

/// Repack pixmap samples into tight RGB, cropped to the floored surface.
///
/// The engine rounds the transformed page bounds outward, so the pixmap
/// can come back a pixel wider or taller than the surface; the extra row
/// and column are dropped.
fn pixmap_to_rgb(pixmap: &Pixmap, width: u32, height: u32) -> Result<Vec<u8>, RenderFault> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(RenderFault::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let src_width = pixmap.width() as usize;
    let src_height = pixmap.height() as usize;
    let width = width as usize;
    let height = height as usize;
    if src_width < width || src_height < height {
        return Err(RenderFault::generic(format!(
            "pixmap {src_width}x{src_height} smaller than surface {width}x{height}"
        )));
    }

    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    let expected_min = stride.saturating_mul(src_height);
    if samples.len() < expected_min || src_width * n > stride {
        return Err(RenderFault::generic("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_size_floors_physical_dimensions() {
        assert_eq!(surface_size(200.4, 100.1, 2.0), (400, 200));
        assert_eq!(surface_size(200.0, 300.0, 1.0), (200, 300));
        assert_eq!(surface_size(10.0, 10.0, 1.5), (15, 15));
    }

    #[test]
    fn surface_size_never_goes_negative() {
        assert_eq!(surface_size(-5.0, 10.0, 1.0), (0, 10));
    }

    #[test]
    fn transform_composes_device_pixel_ratio() {
        let plain = draw_transform(1.5, 1.0);
        assert_eq!(plain.a, 1.5);
        assert_eq!(plain.d, 1.5);
        assert_eq!(plain.b, 0.0);
        assert_eq!(plain.c, 0.0);

        let hidpi = draw_transform(1.0, 2.0);
        assert_eq!(hidpi.a, 2.0);
        assert_eq!(hidpi.d, 2.0);
        assert_eq!(hidpi.e, 0.0);
        assert_eq!(hidpi.f, 0.0);
    }
}
