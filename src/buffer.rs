//! RGBA pixel buffer shared by every pipeline stage
//!
//! A [`PixelBuffer`] is a width, a height and a flat, row-major run of RGBA
//! quadruples. Stages never mutate a buffer they were handed; they build a
//! new one and return it.

use image::{DynamicImage, RgbaImage};

use crate::detect::BoundingBox;

/// Bytes per RGBA pixel
pub const CHANNELS: usize = 4;

/// Immutable RGBA8 pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes.
    ///
    /// Returns `None` when `data.len()` does not equal `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(CHANNELS)?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Create a buffer filled with a single color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Total pixel count
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True when either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw RGBA bytes
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer and return its bytes
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// RGBA value at (x, y), or `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Row-major iterator over `(x, y, rgba)`
    pub fn enumerate_pixels(&self) -> impl Iterator<Item = (u32, u32, &[u8])> + '_ {
        let width = self.width.max(1);
        self.data
            .chunks_exact(CHANNELS)
            .enumerate()
            .map(move |(i, px)| ((i as u32) % width, (i as u32) / width, px))
    }

    /// Copy the sub-rectangle described by `bbox` into a new buffer.
    ///
    /// The box is intersected with the buffer bounds first, so a box that
    /// extends past the edge yields the visible part only.
    pub fn crop(&self, bbox: &BoundingBox) -> PixelBuffer {
        let min_x = bbox.min_x.min(self.width);
        let min_y = bbox.min_y.min(self.height);
        let max_x = bbox.max_x.saturating_add(1).min(self.width);
        let max_y = bbox.max_y.saturating_add(1).min(self.height);
        let width = max_x.saturating_sub(min_x);
        let height = max_y.saturating_sub(min_y);

        let row_bytes = width as usize * CHANNELS;
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for y in min_y..max_y {
            let start = self.offset(min_x, y);
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }

        PixelBuffer {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

impl From<&DynamicImage> for PixelBuffer {
    fn from(image: &DynamicImage) -> Self {
        image.to_rgba8().into()
    }
}

impl From<PixelBuffer> for RgbaImage {
    fn from(buffer: PixelBuffer) -> Self {
        // Length is checked on construction, so this cannot fail.
        RgbaImage::from_raw(buffer.width, buffer.height, buffer.data)
            .unwrap_or_else(|| RgbaImage::new(0, 0))
    }
}
