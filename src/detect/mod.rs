//! Content Detection module
//!
//! Finds the tight bounding box around the foreground of an image.
//!
//! # Features
//!
//! - Near-white and transparent pixels treated as background
//! - Tunable white and alpha thresholds
//! - Single pass, no auxiliary buffers
//! - Debug overlay of the detected box
//!
//! # Example
//!
//! ```rust,no_run
//! use centerframe::{ContentBoundingBoxDetector, DetectOptions};
//! use std::path::Path;
//!
//! let options = DetectOptions::builder()
//!     .white_threshold(240)
//!     .alpha_threshold(20)
//!     .build();
//!
//! let bbox = ContentBoundingBoxDetector::detect_file(Path::new("photo.png"), &options).unwrap();
//! println!("Content: {}x{} at ({}, {})", bbox.width(), bbox.height(), bbox.min_x, bbox.min_y);
//! ```

mod detector;
mod types;

pub use detector::ContentBoundingBoxDetector;
pub use types::{BoundingBox, DetectError, Result};

// ============================================================
// Constants
// ============================================================

/// Channel value above which a pixel counts as near-white background
pub const DEFAULT_WHITE_THRESHOLD: u8 = 245;

/// Alpha at or below which a pixel counts as transparent background
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 30;

// ============================================================
// Options
// ============================================================

/// Content detection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DetectOptions {
    /// Channel value above which a pixel is near-white (0-255)
    pub white_threshold: u8,
    /// Alpha at or below which a pixel is transparent (0-255)
    pub alpha_threshold: u8,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            white_threshold: DEFAULT_WHITE_THRESHOLD,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
        }
    }
}

impl DetectOptions {
    /// Create a new options builder
    pub fn builder() -> DetectOptionsBuilder {
        DetectOptionsBuilder::default()
    }

    /// Treat only pure white as background
    pub fn strict() -> Self {
        Self {
            white_threshold: 254,
            alpha_threshold: 0,
        }
    }
}

/// Builder for DetectOptions
#[derive(Debug, Default)]
pub struct DetectOptionsBuilder {
    options: DetectOptions,
}

impl DetectOptionsBuilder {
    /// Set white threshold (0-255)
    #[must_use]
    pub fn white_threshold(mut self, threshold: u8) -> Self {
        self.options.white_threshold = threshold;
        self
    }

    /// Set alpha threshold (0-255)
    #[must_use]
    pub fn alpha_threshold(mut self, threshold: u8) -> Self {
        self.options.alpha_threshold = threshold;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> DetectOptions {
        self.options
    }
}
