//! Content bounding-box detector

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::Path;
use tracing::debug;

use super::types::{BoundingBox, DetectError, Result};
use super::DetectOptions;
use crate::buffer::PixelBuffer;

/// Outline color for the debug overlay
const OVERLAY_COLOR: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// Scans a pixel buffer for the tight box around non-background pixels
pub struct ContentBoundingBoxDetector;

impl ContentBoundingBoxDetector {
    /// Find the bounding box of all content pixels.
    ///
    /// A pixel is content when any of R, G, B is at or below
    /// `white_threshold` and its alpha is above `alpha_threshold`.
    /// Returns `None` when no pixel qualifies.
    pub fn detect(
        buffer: &PixelBuffer,
        white_threshold: u8,
        alpha_threshold: u8,
    ) -> Option<BoundingBox> {
        let mut found: Option<BoundingBox> = None;

        for (x, y, px) in buffer.enumerate_pixels() {
            if !Self::is_content(px, white_threshold, alpha_threshold) {
                continue;
            }
            match found.as_mut() {
                Some(bbox) => bbox.expand(x, y),
                None => found = Some(BoundingBox::point(x, y)),
            }
        }

        match &found {
            Some(bbox) => debug!(
                "Content box: x={}, y={}, w={}, h={}",
                bbox.min_x,
                bbox.min_y,
                bbox.width(),
                bbox.height()
            ),
            None => debug!("No content found, image is background or transparent"),
        }

        found
    }

    /// Detect using thresholds from [`DetectOptions`]
    pub fn detect_with(buffer: &PixelBuffer, options: &DetectOptions) -> Option<BoundingBox> {
        Self::detect(buffer, options.white_threshold, options.alpha_threshold)
    }

    /// Detect and crop in one step.
    ///
    /// Fails with [`DetectError::NoContentDetected`] for blank images.
    pub fn crop_to_content(
        buffer: &PixelBuffer,
        options: &DetectOptions,
    ) -> Result<(BoundingBox, PixelBuffer)> {
        let bbox = Self::detect_with(buffer, options).ok_or(DetectError::NoContentDetected)?;
        Ok((bbox, buffer.crop(&bbox)))
    }

    /// Load an image file and detect its content box
    pub fn detect_file(image_path: &Path, options: &DetectOptions) -> Result<BoundingBox> {
        if !image_path.exists() {
            return Err(DetectError::ImageNotFound(image_path.to_path_buf()));
        }

        let bytes = std::fs::read(image_path)?;
        let img = image::load_from_memory(&bytes)
            .map_err(|e| DetectError::InvalidImage(e.to_string()))?;
        let buffer = PixelBuffer::from(&img);

        Self::detect_with(&buffer, options).ok_or(DetectError::NoContentDetected)
    }

    /// Draw the box outline onto a copy of the source, for diagnostics
    pub fn draw_overlay(buffer: &PixelBuffer, bbox: &BoundingBox) -> PixelBuffer {
        let mut canvas: RgbaImage = buffer.clone().into();
        let rect = Rect::at(bbox.min_x as i32, bbox.min_y as i32).of_size(bbox.width(), bbox.height());
        draw_hollow_rect_mut(&mut canvas, rect, OVERLAY_COLOR);
        canvas.into()
    }

    #[inline]
    fn is_content(px: &[u8], white_threshold: u8, alpha_threshold: u8) -> bool {
        let near_white =
            px[0] > white_threshold && px[1] > white_threshold && px[2] > white_threshold;
        !near_white && px[3] > alpha_threshold
    }
}
