//! Hex background color

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::types::InvalidSettingsValue;

/// Background color, stored as RGBA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackgroundColor {
    rgba: [u8; 4],
}

impl BackgroundColor {
    pub const WHITE: BackgroundColor = BackgroundColor {
        rgba: [255, 255, 255, 255],
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { rgba: [r, g, b, 255] }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { rgba: [r, g, b, a] }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        self.rgba
    }

    pub fn is_opaque(self) -> bool {
        self.rgba[3] == 255
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse(input: &str) -> Result<Self, InvalidSettingsValue> {
        let invalid = |reason: &str| {
            InvalidSettingsValue::new("background_color", input, reason)
        };

        let hex = input
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| invalid("must start with '#'"))?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("contains non-hex characters"));
        }

        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).unwrap_or(0);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);

        match hex.len() {
            3 => Ok(Self::rgb(nibble(0) * 17, nibble(1) * 17, nibble(2) * 17)),
            6 => Ok(Self::rgb(byte(0), byte(2), byte(4))),
            8 => Ok(Self::rgba(byte(0), byte(2), byte(4), byte(6))),
            _ => Err(invalid("expected 3, 6 or 8 hex digits")),
        }
    }

    /// `#rrggbb` for opaque colors, `#rrggbbaa` otherwise
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.rgba;
        if a == 255 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

impl Default for BackgroundColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for BackgroundColor {
    type Err = InvalidSettingsValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BackgroundColor {
    type Error = InvalidSettingsValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BackgroundColor> for String {
    fn from(color: BackgroundColor) -> Self {
        color.to_hex()
    }
}
