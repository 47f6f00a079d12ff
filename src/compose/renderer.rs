//! Canvas rendering with sub-pixel placement

use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::borrow::Cow;
use tracing::debug;

use super::placement::compute_placement;
use super::types::{CompositionResult, Placement, Result};
use crate::buffer::{PixelBuffer, CHANNELS};
use crate::settings::{BackgroundColor, CompositionSettings};

/// Below this scale the content is pre-shrunk before bilinear sampling
const PREFILTER_SCALE: f64 = 0.5;

/// Renders cropped content onto a background-filled canvas
pub struct CompositeRenderer;

impl CompositeRenderer {
    /// Scale `content` to fit inside the margin and center it on a new canvas
    pub fn compose(content: &PixelBuffer, settings: &CompositionSettings) -> Result<CompositionResult> {
        let placement = compute_placement(content.width(), content.height(), settings)?;
        let buffer = Self::render(
            content,
            &placement,
            settings.final_width(),
            settings.final_height(),
            settings.background_color,
        );
        Ok(CompositionResult { buffer, placement })
    }

    /// Fit a composed canvas into a `size x size` preview over a backdrop
    pub fn render_preview(
        result: &CompositionResult,
        size: u32,
        backdrop: BackgroundColor,
    ) -> Result<PixelBuffer> {
        let settings = CompositionSettings::sized(size, size, 0).with_background(backdrop);
        Ok(Self::compose(&result.buffer, &settings)?.buffer)
    }

    /// Fill the canvas, then draw `content` into the placement rectangle.
    ///
    /// Each covered canvas pixel samples the content bilinearly at its
    /// center, weighted by how much of the pixel the rectangle covers, and
    /// is blended source-over onto the background.
    pub fn render(
        content: &PixelBuffer,
        placement: &Placement,
        canvas_width: u32,
        canvas_height: u32,
        background: BackgroundColor,
    ) -> PixelBuffer {
        let mut canvas = PixelBuffer::filled(canvas_width, canvas_height, background.to_rgba())
            .into_raw();

        let source = Self::prefilter(content, placement);
        if source.is_empty() || placement.draw_width <= 0.0 || placement.draw_height <= 0.0 {
            return PixelBuffer::from_raw(canvas_width, canvas_height, canvas)
                .unwrap_or_else(|| PixelBuffer::filled(canvas_width, canvas_height, background.to_rgba()));
        }
        let premultiplied = premultiply(&source);

        let ratio_x = source.width() as f64 / placement.draw_width;
        let ratio_y = source.height() as f64 / placement.draw_height;

        let (x_start, x_end) = pixel_span(placement.draw_x, placement.draw_right(), canvas_width);
        let (y_start, y_end) = pixel_span(placement.draw_y, placement.draw_bottom(), canvas_height);

        for py in y_start..y_end {
            let cov_y = coverage(py, placement.draw_y, placement.draw_bottom());
            if cov_y <= 0.0 {
                continue;
            }
            let cy = (py as f64 + 0.5).clamp(placement.draw_y, placement.draw_bottom());
            let v = (cy - placement.draw_y) * ratio_y - 0.5;

            for px in x_start..x_end {
                let cov_x = coverage(px, placement.draw_x, placement.draw_right());
                if cov_x <= 0.0 {
                    continue;
                }
                let cx = (px as f64 + 0.5).clamp(placement.draw_x, placement.draw_right());
                let u = (cx - placement.draw_x) * ratio_x - 0.5;

                let sample = sample_bilinear(&premultiplied, source.width(), source.height(), u, v);
                let i = (py as usize * canvas_width as usize + px as usize) * CHANNELS;
                blend_over(&mut canvas[i..i + CHANNELS], sample, (cov_x * cov_y) as f32);
            }
        }

        PixelBuffer::from_raw(canvas_width, canvas_height, canvas)
            .unwrap_or_else(|| PixelBuffer::filled(canvas_width, canvas_height, background.to_rgba()))
    }

    /// Shrink heavily downscaled content first so bilinear taps do not alias
    fn prefilter<'a>(content: &'a PixelBuffer, placement: &Placement) -> Cow<'a, PixelBuffer> {
        if placement.scale >= PREFILTER_SCALE {
            return Cow::Borrowed(content);
        }
        let width = placement.draw_width.ceil().max(1.0) as u32;
        let height = placement.draw_height.ceil().max(1.0) as u32;
        debug!(
            "Prefiltering {}x{} -> {}x{}",
            content.width(),
            content.height(),
            width,
            height
        );
        let image: RgbaImage = content.clone().into();
        Cow::Owned(imageops::resize(&image, width, height, FilterType::Triangle).into())
    }
}

/// Canvas pixel range touched by `[start, end)`, clipped to `[0, limit)`
fn pixel_span(start: f64, end: f64, limit: u32) -> (u32, u32) {
    let lo = start.floor().max(0.0).min(limit as f64) as u32;
    let hi = end.ceil().max(0.0).min(limit as f64) as u32;
    (lo, hi.max(lo))
}

/// Fraction of pixel `[p, p + 1)` inside `[start, end)`
fn coverage(p: u32, start: f64, end: f64) -> f64 {
    let p = p as f64;
    ((p + 1.0).min(end) - p.max(start)).clamp(0.0, 1.0)
}

/// RGBA as premultiplied floats in 0-1
fn premultiply(buffer: &PixelBuffer) -> Vec<[f32; 4]> {
    buffer
        .as_raw()
        .chunks_exact(CHANNELS)
        .map(|px| {
            let a = px[3] as f32 / 255.0;
            [
                px[0] as f32 / 255.0 * a,
                px[1] as f32 / 255.0 * a,
                px[2] as f32 / 255.0 * a,
                a,
            ]
        })
        .collect()
}

/// Bilinear sample at pixel-center coordinates with clamp-to-edge
fn sample_bilinear(data: &[[f32; 4]], width: u32, height: u32, u: f64, v: f64) -> [f32; 4] {
    let max_x = width as f64 - 1.0;
    let max_y = height as f64 - 1.0;
    let u = u.clamp(0.0, max_x);
    let v = v.clamp(0.0, max_y);

    let x0 = u.floor() as u32;
    let y0 = v.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = (u - x0 as f64) as f32;
    let fy = (v - y0 as f64) as f32;

    let at = |x: u32, y: u32| data[y as usize * width as usize + x as usize];
    let (p00, p10, p01, p11) = (at(x0, y0), at(x1, y0), at(x0, y1), at(x1, y1));

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        let top = p00[c] + (p10[c] - p00[c]) * fx;
        let bottom = p01[c] + (p11[c] - p01[c]) * fx;
        out[c] = top + (bottom - top) * fy;
    }
    out
}

/// Source-over blend of a premultiplied sample onto a straight-alpha pixel
fn blend_over(dst: &mut [u8], src: [f32; 4], coverage: f32) {
    let sa = src[3] * coverage;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    for c in 0..3 {
        let dc = dst[c] as f32 / 255.0 * da;
        let premul = src[c] * coverage + dc * (1.0 - sa);
        let straight = if out_a > 0.0 { premul / out_a } else { 0.0 };
        dst[c] = to_byte(straight);
    }
    dst[3] = to_byte(out_a);
}

#[inline]
fn to_byte(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
