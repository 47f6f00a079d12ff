//! Canvas Composition module
//!
//! Scales cropped content uniformly to fit inside the margin of a fixed-size
//! canvas, centers it, and draws it over the background color.
//!
//! # Algorithm
//!
//! 1. Resolve the margin (pixels, or a rounded percentage of the canvas edge)
//! 2. If the margin leaves no room, clamp it so at least
//!    [`MIN_CONTENT_PX`] pixels remain
//! 3. Scale by `min(target_w / w, target_h / h)`, up or down
//! 4. Center inside the margin box at real-valued offsets
//! 5. Fill the background, then composite with bilinear sampling and
//!    fractional edge coverage
//!
//! # Example
//!
//! ```rust
//! use centerframe::{CompositeRenderer, CompositionSettings, PixelBuffer};
//!
//! let content = PixelBuffer::filled(50, 50, [255, 0, 0, 255]);
//! let settings = CompositionSettings::sized(1000, 1000, 180);
//! let result = CompositeRenderer::compose(&content, &settings).unwrap();
//!
//! assert_eq!(result.placement.draw_x, 180.0);
//! assert_eq!(result.placement.draw_width, 640.0);
//! ```

mod placement;
mod renderer;
mod types;

pub use placement::{compute_placement, resolve_margin};
pub use renderer::CompositeRenderer;
pub use types::{ComposeError, CompositionResult, Placement, Result};

/// Smallest content area edge kept when clamping an oversized margin
pub const MIN_CONTENT_PX: u32 = 10;

/// Edge of the preview image
pub const DEFAULT_PREVIEW_SIZE: u32 = 500;

/// Backdrop behind the preview image
pub const DEFAULT_PREVIEW_BACKDROP: crate::settings::BackgroundColor =
    crate::settings::BackgroundColor::rgb(0xee, 0xee, 0xee);
