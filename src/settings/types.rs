//! Composition settings and their validation rules

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

use super::color::BackgroundColor;

// ============================================================
// Constants
// ============================================================

/// Default square canvas edge
pub const DEFAULT_FINAL_SIZE: u32 = 1000;

/// Smallest allowed square canvas edge
pub const MIN_FINAL_SIZE: u32 = 512;

/// Largest allowed square canvas edge
pub const MAX_FINAL_SIZE: u32 = 2048;

/// Default margin as a percentage of the canvas edge
pub const DEFAULT_MARGIN_PERCENTAGE: f64 = 18.0;

/// Largest allowed margin percentage
pub const MAX_MARGIN_PERCENTAGE: f64 = 50.0;

/// Default width/height for the rectangular layout
pub const DEFAULT_FINAL_DIMENSION: u32 = 1000;

/// Smallest allowed width/height for the rectangular layout
pub const MIN_FINAL_DIMENSION: u32 = 100;

/// Default absolute margin for the rectangular layout
pub const DEFAULT_MARGIN_SIZE: u32 = 180;

// ============================================================
// Errors
// ============================================================

/// Settings store errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Settings file is corrupt: {0}")]
    Corrupt(PathBuf),

    #[error("Unknown settings field: {0}")]
    UnknownField(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// A settings value that failed validation.
///
/// Never returned from setters; they substitute a clamped or default value
/// and report this through the log instead.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid value {value:?} for {field}: {reason}")]
pub struct InvalidSettingsValue {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

impl InvalidSettingsValue {
    pub fn new(field: &'static str, value: impl ToString, reason: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome of sanitizing one input value
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized<T> {
    /// Value to store
    pub value: T,
    /// Why the input was not stored as given
    pub issue: Option<InvalidSettingsValue>,
}

impl<T> Sanitized<T> {
    fn accepted(value: T) -> Self {
        Self { value, issue: None }
    }

    fn replaced(value: T, issue: InvalidSettingsValue) -> Self {
        Self {
            value,
            issue: Some(issue),
        }
    }

    /// Log the issue, if any, and return the value
    pub fn into_value(self) -> T {
        if let Some(issue) = &self.issue {
            warn!("{}", issue);
        }
        self.value
    }
}

// ============================================================
// Sanitizers
// ============================================================

/// Clamp a square canvas edge to 512-2048
pub fn sanitize_final_size(input: i64) -> Sanitized<u32> {
    let clamped = input.clamp(MIN_FINAL_SIZE as i64, MAX_FINAL_SIZE as i64) as u32;
    if clamped as i64 == input {
        Sanitized::accepted(clamped)
    } else {
        Sanitized::replaced(
            clamped,
            InvalidSettingsValue::new("final_size", input, "clamped to 512-2048"),
        )
    }
}

/// Clamp a margin percentage to 0-50; NaN reverts to the default
pub fn sanitize_margin_percentage(input: f64) -> Sanitized<f64> {
    if !input.is_finite() {
        return Sanitized::replaced(
            DEFAULT_MARGIN_PERCENTAGE,
            InvalidSettingsValue::new("margin_percentage", input, "not a number"),
        );
    }
    let clamped = input.clamp(0.0, MAX_MARGIN_PERCENTAGE);
    if clamped == input {
        Sanitized::accepted(clamped)
    } else {
        Sanitized::replaced(
            clamped,
            InvalidSettingsValue::new("margin_percentage", input, "clamped to 0-50"),
        )
    }
}

/// Raise a width or height below 100 to 100
pub fn sanitize_dimension(field: &'static str, input: i64) -> Sanitized<u32> {
    let clamped = input.clamp(MIN_FINAL_DIMENSION as i64, u32::MAX as i64) as u32;
    if clamped as i64 == input {
        Sanitized::accepted(clamped)
    } else {
        Sanitized::replaced(
            clamped,
            InvalidSettingsValue::new(field, input, "must be at least 100"),
        )
    }
}

/// Raise a negative absolute margin to 0
pub fn sanitize_margin_size(input: i64) -> Sanitized<u32> {
    let clamped = input.clamp(0, u32::MAX as i64) as u32;
    if clamped as i64 == input {
        Sanitized::accepted(clamped)
    } else {
        Sanitized::replaced(
            clamped,
            InvalidSettingsValue::new("margin_size", input, "must not be negative"),
        )
    }
}

/// Parse a hex color; anything invalid reverts to white
pub fn sanitize_background_color(input: &str) -> Sanitized<BackgroundColor> {
    match BackgroundColor::parse(input) {
        Ok(color) => Sanitized::accepted(color),
        Err(issue) => Sanitized::replaced(BackgroundColor::default(), issue),
    }
}

// ============================================================
// Settings
// ============================================================

/// How the margin is expressed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginSpec {
    /// Absolute pixels
    Pixels(u32),
    /// Percentage of the canvas edge
    Percent(f64),
}

/// Canvas dimensions and margin, in one of two schemas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CanvasLayout {
    /// Square canvas, margin as a percentage of its edge
    Square {
        final_size: u32,
        margin_percentage: f64,
    },
    /// Independent width and height, margin in pixels
    Sized {
        final_width: u32,
        final_height: u32,
        margin_size: u32,
    },
}

impl CanvasLayout {
    /// Default square layout (1000x1000, 18%)
    pub fn square() -> Self {
        CanvasLayout::Square {
            final_size: DEFAULT_FINAL_SIZE,
            margin_percentage: DEFAULT_MARGIN_PERCENTAGE,
        }
    }

    /// Default rectangular layout (1000x1000, 180px)
    pub fn sized() -> Self {
        CanvasLayout::Sized {
            final_width: DEFAULT_FINAL_DIMENSION,
            final_height: DEFAULT_FINAL_DIMENSION,
            margin_size: DEFAULT_MARGIN_SIZE,
        }
    }

    pub fn final_width(&self) -> u32 {
        match *self {
            CanvasLayout::Square { final_size, .. } => final_size,
            CanvasLayout::Sized { final_width, .. } => final_width,
        }
    }

    pub fn final_height(&self) -> u32 {
        match *self {
            CanvasLayout::Square { final_size, .. } => final_size,
            CanvasLayout::Sized { final_height, .. } => final_height,
        }
    }

    pub fn margin(&self) -> MarginSpec {
        match *self {
            CanvasLayout::Square {
                margin_percentage, ..
            } => MarginSpec::Percent(margin_percentage),
            CanvasLayout::Sized { margin_size, .. } => MarginSpec::Pixels(margin_size),
        }
    }

    /// Schema name as persisted
    pub fn mode_name(&self) -> &'static str {
        match self {
            CanvasLayout::Square { .. } => "square",
            CanvasLayout::Sized { .. } => "sized",
        }
    }
}

impl Default for CanvasLayout {
    fn default() -> Self {
        Self::square()
    }
}

/// Everything the renderer needs to know about the output canvas
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompositionSettings {
    pub layout: CanvasLayout,
    pub background_color: BackgroundColor,
}

impl CompositionSettings {
    /// Square canvas with a percentage margin
    pub fn square(final_size: u32, margin_percentage: f64) -> Self {
        Self {
            layout: CanvasLayout::Square {
                final_size,
                margin_percentage,
            },
            ..Default::default()
        }
    }

    /// Rectangular canvas with an absolute margin
    pub fn sized(final_width: u32, final_height: u32, margin_size: u32) -> Self {
        Self {
            layout: CanvasLayout::Sized {
                final_width,
                final_height,
                margin_size,
            },
            ..Default::default()
        }
    }

    /// Replace the background color
    #[must_use]
    pub fn with_background(mut self, color: BackgroundColor) -> Self {
        self.background_color = color;
        self
    }

    pub fn final_width(&self) -> u32 {
        self.layout.final_width()
    }

    pub fn final_height(&self) -> u32 {
        self.layout.final_height()
    }

    pub fn margin(&self) -> MarginSpec {
        self.layout.margin()
    }

    /// Flat JSON object, one key per field
    pub fn to_json_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("mode".into(), Value::from(self.layout.mode_name()));
        match self.layout {
            CanvasLayout::Square {
                final_size,
                margin_percentage,
            } => {
                map.insert("final_size".into(), Value::from(final_size));
                map.insert("margin_percentage".into(), Value::from(margin_percentage));
            }
            CanvasLayout::Sized {
                final_width,
                final_height,
                margin_size,
            } => {
                map.insert("final_width".into(), Value::from(final_width));
                map.insert("final_height".into(), Value::from(final_height));
                map.insert("margin_size".into(), Value::from(margin_size));
            }
        }
        map.insert(
            "background_color".into(),
            Value::from(self.background_color.to_hex()),
        );
        Value::Object(map)
    }

    /// Rebuild settings from a stored JSON value.
    ///
    /// Each field falls back to its default on its own when missing or
    /// malformed; a non-object value yields all defaults.
    pub fn from_json_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            warn!("Stored settings are not an object, using defaults");
            return Self::default();
        };

        let mode = match map.get("mode").and_then(Value::as_str) {
            Some(mode) => mode.to_string(),
            None if map.contains_key("final_width") || map.contains_key("final_height") => {
                "sized".to_string()
            }
            None => "square".to_string(),
        };

        let layout = if mode == "sized" {
            CanvasLayout::Sized {
                final_width: read_int(map, "final_width")
                    .map(|v| sanitize_dimension("final_width", v).into_value())
                    .unwrap_or(DEFAULT_FINAL_DIMENSION),
                final_height: read_int(map, "final_height")
                    .map(|v| sanitize_dimension("final_height", v).into_value())
                    .unwrap_or(DEFAULT_FINAL_DIMENSION),
                margin_size: read_int(map, "margin_size")
                    .map(|v| sanitize_margin_size(v).into_value())
                    .unwrap_or(DEFAULT_MARGIN_SIZE),
            }
        } else {
            if mode != "square" {
                warn!("Unknown settings mode {:?}, using square", mode);
            }
            CanvasLayout::Square {
                final_size: read_int(map, "final_size")
                    .map(|v| sanitize_final_size(v).into_value())
                    .unwrap_or(DEFAULT_FINAL_SIZE),
                margin_percentage: read_float(map, "margin_percentage")
                    .map(|v| sanitize_margin_percentage(v).into_value())
                    .unwrap_or(DEFAULT_MARGIN_PERCENTAGE),
            }
        };

        let background_color = map
            .get("background_color")
            .and_then(Value::as_str)
            .map(|s| sanitize_background_color(s).into_value())
            .unwrap_or_default();

        Self {
            layout,
            background_color,
        }
    }
}

/// Integer field; floats are truncated, strings are parsed
fn read_int(map: &Map<String, Value>, key: &str) -> Option<i64> {
    match map.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Float field; strings are parsed
fn read_float(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
