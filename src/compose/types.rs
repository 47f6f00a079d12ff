//! Types for canvas composition

use thiserror::Error;

use crate::buffer::PixelBuffer;

/// Composition error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Invalid content: {width}x{height} has no area")]
    InvalidContent { width: u32, height: u32 },

    #[error("Invalid canvas: {width}x{height} has no area")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("Canvas too large: {width}x{height} does not fit in memory")]
    CanvasTooLarge { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, ComposeError>;

/// Where the scaled content lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Margin actually used, after clamping
    pub margin: u32,
    /// True when the requested margin left no room and was clamped
    pub margin_clamped: bool,
    /// Width of the area inside the margin
    pub target_width: u32,
    /// Height of the area inside the margin
    pub target_height: u32,
    /// Uniform scale applied to the content
    pub scale: f64,
    pub draw_x: f64,
    pub draw_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
}

impl Placement {
    /// Right edge of the drawn content
    pub fn draw_right(&self) -> f64 {
        self.draw_x + self.draw_width
    }

    /// Bottom edge of the drawn content
    pub fn draw_bottom(&self) -> f64 {
        self.draw_y + self.draw_height
    }
}

/// Composited canvas plus the placement used to draw it
#[derive(Debug, Clone)]
pub struct CompositionResult {
    pub buffer: PixelBuffer,
    pub placement: Placement,
}

impl CompositionResult {
    /// Canvas (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }
}
