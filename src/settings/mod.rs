//! Composition settings
//!
//! Canvas size, margin and background color, with the validation rules that
//! keep persisted values sane.
//!
//! Two schemas are supported through [`CanvasLayout`]:
//!
//! - `Square`: one edge (512-2048) and a margin percentage (0-50)
//! - `Sized`: width and height (each at least 100) and a margin in pixels
//!
//! Setters never fail on bad input. They clamp, or revert the field to its
//! default, persist the result and hand it back.

mod color;
mod manager;
mod store;
mod types;

pub use color::BackgroundColor;
pub use manager::{SettingsManager, FIELD_NAMES};
pub use store::{JsonFileStore, MemoryStore, SettingsStore, SETTINGS_KEY};
pub use types::{
    sanitize_background_color, sanitize_dimension, sanitize_final_size,
    sanitize_margin_percentage, sanitize_margin_size, CanvasLayout, CompositionSettings,
    InvalidSettingsValue, MarginSpec, Result, Sanitized, SettingsError, DEFAULT_FINAL_DIMENSION,
    DEFAULT_FINAL_SIZE, DEFAULT_MARGIN_PERCENTAGE, DEFAULT_MARGIN_SIZE, MAX_FINAL_SIZE,
    MAX_MARGIN_PERCENTAGE, MIN_FINAL_DIMENSION, MIN_FINAL_SIZE,
};
