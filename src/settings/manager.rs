//! Settings lifecycle: load, validated mutation, persistence

use tracing::{debug, warn};

use super::color::BackgroundColor;
use super::store::{SettingsStore, SETTINGS_KEY};
use super::types::{
    sanitize_background_color, sanitize_dimension, sanitize_final_size,
    sanitize_margin_percentage, sanitize_margin_size, CanvasLayout, CompositionSettings,
    InvalidSettingsValue, Result, SettingsError, DEFAULT_FINAL_DIMENSION,
    DEFAULT_FINAL_SIZE, DEFAULT_MARGIN_PERCENTAGE, DEFAULT_MARGIN_SIZE,
};

/// Field names accepted by [`SettingsManager::set_field`]
pub const FIELD_NAMES: [&str; 7] = [
    "mode",
    "final_size",
    "margin_percentage",
    "final_width",
    "final_height",
    "margin_size",
    "background_color",
];

/// Owns the current settings and writes them back after every change
#[derive(Debug)]
pub struct SettingsManager<S: SettingsStore> {
    store: S,
    settings: CompositionSettings,
}

impl<S: SettingsStore> SettingsManager<S> {
    /// Load settings from the store.
    ///
    /// Never fails: an absent, unreadable or corrupt blob yields defaults,
    /// and malformed fields fall back one by one.
    pub fn load(store: S) -> Self {
        let settings = match store.get(SETTINGS_KEY) {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(value) => CompositionSettings::from_json_value(&value),
                Err(e) => {
                    warn!("Stored settings are not valid JSON, using defaults: {}", e);
                    CompositionSettings::default()
                }
            },
            Ok(None) => CompositionSettings::default(),
            Err(e) => {
                warn!("Could not read settings store, using defaults: {}", e);
                CompositionSettings::default()
            }
        };
        debug!("Loaded settings: {:?}", settings);

        Self { store, settings }
    }

    /// Wrap already-known settings without touching the store
    pub fn with_settings(store: S, settings: CompositionSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &CompositionSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the current settings to the store
    pub fn persist(&self) -> Result<()> {
        Self::write(&self.store, &self.settings)
    }

    fn write(store: &S, settings: &CompositionSettings) -> Result<()> {
        let blob = serde_json::to_string(&settings.to_json_value())?;
        store.set(SETTINGS_KEY, &blob)
    }

    /// Persist `candidate`, and adopt it only once the store accepted it
    fn commit(&mut self, candidate: CompositionSettings) -> Result<()> {
        Self::write(&self.store, &candidate)?;
        self.settings = candidate;
        Ok(())
    }

    fn commit_layout(&mut self, layout: CanvasLayout) -> Result<()> {
        let candidate = CompositionSettings {
            layout,
            ..self.settings
        };
        self.commit(candidate)
    }

    /// Restore and persist defaults
    pub fn reset(&mut self) -> Result<&CompositionSettings> {
        self.commit(CompositionSettings::default())?;
        Ok(&self.settings)
    }

    /// Switch schema, keeping the current dimensions where they carry over
    pub fn set_layout(&mut self, layout: CanvasLayout) -> Result<CanvasLayout> {
        let layout = match layout {
            CanvasLayout::Square {
                final_size,
                margin_percentage,
            } => CanvasLayout::Square {
                final_size: sanitize_final_size(final_size as i64).into_value(),
                margin_percentage: sanitize_margin_percentage(margin_percentage).into_value(),
            },
            CanvasLayout::Sized {
                final_width,
                final_height,
                margin_size,
            } => CanvasLayout::Sized {
                final_width: sanitize_dimension("final_width", final_width as i64).into_value(),
                final_height: sanitize_dimension("final_height", final_height as i64)
                    .into_value(),
                margin_size: sanitize_margin_size(margin_size as i64).into_value(),
            },
        };
        self.commit_layout(layout)?;
        Ok(layout)
    }

    /// Square edge, clamped to 512-2048
    pub fn set_final_size(&mut self, size: i64) -> Result<u32> {
        let value = sanitize_final_size(size).into_value();
        self.commit_layout(CanvasLayout::Square {
            final_size: value,
            margin_percentage: self.square_margin(),
        })?;
        Ok(value)
    }

    /// Margin percentage, clamped to 0-50
    pub fn set_margin_percentage(&mut self, percentage: f64) -> Result<f64> {
        let value = sanitize_margin_percentage(percentage).into_value();
        self.commit_layout(CanvasLayout::Square {
            final_size: self.square_size(),
            margin_percentage: value,
        })?;
        Ok(value)
    }

    /// Canvas width, at least 100
    pub fn set_final_width(&mut self, width: i64) -> Result<u32> {
        let value = sanitize_dimension("final_width", width).into_value();
        let (_, final_height, margin_size) = self.sized_fields();
        self.commit_layout(CanvasLayout::Sized {
            final_width: value,
            final_height,
            margin_size,
        })?;
        Ok(value)
    }

    /// Canvas height, at least 100
    pub fn set_final_height(&mut self, height: i64) -> Result<u32> {
        let value = sanitize_dimension("final_height", height).into_value();
        let (final_width, _, margin_size) = self.sized_fields();
        self.commit_layout(CanvasLayout::Sized {
            final_width,
            final_height: value,
            margin_size,
        })?;
        Ok(value)
    }

    /// Absolute margin, at least 0
    pub fn set_margin_size(&mut self, margin: i64) -> Result<u32> {
        let value = sanitize_margin_size(margin).into_value();
        let (final_width, final_height, _) = self.sized_fields();
        self.commit_layout(CanvasLayout::Sized {
            final_width,
            final_height,
            margin_size: value,
        })?;
        Ok(value)
    }

    /// Hex color; invalid input reverts to `#ffffff`
    pub fn set_background_color(&mut self, hex: &str) -> Result<BackgroundColor> {
        let value = sanitize_background_color(hex).into_value();
        self.commit(self.settings.with_background(value))?;
        Ok(value)
    }

    /// Set a field by name from text input.
    ///
    /// Unparseable numbers revert that field to its default. Returns the
    /// stored value rendered as text.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<String> {
        let value = value.trim();
        match field {
            "mode" => {
                let layout = match value {
                    "square" => CanvasLayout::Square {
                        final_size: self.square_size(),
                        margin_percentage: self.square_margin(),
                    },
                    "sized" => {
                        let (final_width, final_height, margin_size) = self.sized_fields();
                        CanvasLayout::Sized {
                            final_width,
                            final_height,
                            margin_size,
                        }
                    }
                    other => {
                        warn!(
                            "{}",
                            InvalidSettingsValue::new("mode", other, "expected square or sized")
                        );
                        CanvasLayout::default()
                    }
                };
                self.set_layout(layout).map(|l| l.mode_name().to_string())
            }
            "final_size" => {
                let size = parse_int("final_size", value, DEFAULT_FINAL_SIZE as i64);
                self.set_final_size(size).map(|v| v.to_string())
            }
            "margin_percentage" => {
                let pct = value.parse::<f64>().unwrap_or_else(|_| {
                    warn!("{}", InvalidSettingsValue::new("margin_percentage", value, "not a number"));
                    DEFAULT_MARGIN_PERCENTAGE
                });
                self.set_margin_percentage(pct).map(|v| v.to_string())
            }
            "final_width" => {
                let width = parse_int("final_width", value, DEFAULT_FINAL_DIMENSION as i64);
                self.set_final_width(width).map(|v| v.to_string())
            }
            "final_height" => {
                let height = parse_int("final_height", value, DEFAULT_FINAL_DIMENSION as i64);
                self.set_final_height(height).map(|v| v.to_string())
            }
            "margin_size" => {
                let margin = parse_int("margin_size", value, DEFAULT_MARGIN_SIZE as i64);
                self.set_margin_size(margin).map(|v| v.to_string())
            }
            "background_color" => self.set_background_color(value).map(|c| c.to_hex()),
            other => Err(SettingsError::UnknownField(other.to_string())),
        }
    }

    fn square_size(&self) -> u32 {
        match self.settings.layout {
            CanvasLayout::Square { final_size, .. } => final_size,
            CanvasLayout::Sized { .. } => DEFAULT_FINAL_SIZE,
        }
    }

    fn square_margin(&self) -> f64 {
        match self.settings.layout {
            CanvasLayout::Square {
                margin_percentage, ..
            } => margin_percentage,
            CanvasLayout::Sized { .. } => DEFAULT_MARGIN_PERCENTAGE,
        }
    }

    fn sized_fields(&self) -> (u32, u32, u32) {
        match self.settings.layout {
            CanvasLayout::Sized {
                final_width,
                final_height,
                margin_size,
            } => (final_width, final_height, margin_size),
            CanvasLayout::Square { .. } => (
                DEFAULT_FINAL_DIMENSION,
                DEFAULT_FINAL_DIMENSION,
                DEFAULT_MARGIN_SIZE,
            ),
        }
    }
}

/// Integer from text, or the field default when unparseable
fn parse_int(field: &'static str, value: &str, default: i64) -> i64 {
    value
        .parse::<i64>()
        .or_else(|_| value.parse::<f64>().map(|f| f.trunc() as i64))
        .unwrap_or_else(|_| {
            warn!("{}", InvalidSettingsValue::new(field, value, "not an integer"));
            default
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::store::{JsonFileStore, MemoryStore};
    use crate::settings::types::MarginSpec;

    fn stored(store: &MemoryStore) -> serde_json::Value {
        let blob = store.get(SETTINGS_KEY).unwrap().unwrap();
        serde_json::from_str(&blob).unwrap()
    }

    #[test]
    fn test_load_defaults_when_absent() {
        let manager = SettingsManager::load(MemoryStore::new());
        assert_eq!(*manager.settings(), CompositionSettings::default());
    }

    #[test]
    fn test_load_defaults_when_corrupt() {
        let store = MemoryStore::with_entry(SETTINGS_KEY, "{{{ nope");
        let manager = SettingsManager::load(store);
        assert_eq!(*manager.settings(), CompositionSettings::default());
    }

    #[test]
    fn test_load_per_field_fallback() {
        let store = MemoryStore::with_entry(
            SETTINGS_KEY,
            r##"{"mode":"square","final_size":1500,"background_color":42}"##,
        );
        let manager = SettingsManager::load(store);
        assert_eq!(manager.settings().final_width(), 1500);
        assert_eq!(
            manager.settings().margin(),
            MarginSpec::Percent(DEFAULT_MARGIN_PERCENTAGE)
        );
        assert_eq!(manager.settings().background_color, BackgroundColor::WHITE);
    }

    // TC-SET-010: invalid color reverts and the reverted value is persisted
    #[test]
    fn test_invalid_background_reverts_and_persists() {
        let store = MemoryStore::new();
        let mut manager = SettingsManager::load(&store);
        manager.set_background_color("#123456").unwrap();

        let value = manager.set_background_color("notacolor").unwrap();
        assert_eq!(value.to_hex(), "#ffffff");
        assert_eq!(manager.settings().background_color.to_hex(), "#ffffff");
        assert_eq!(stored(&store)["background_color"], "#ffffff");
    }

    #[test]
    fn test_setters_clamp_and_persist() {
        let store = MemoryStore::new();
        let mut manager = SettingsManager::load(&store);

        assert_eq!(manager.set_final_size(100).unwrap(), 512);
        assert_eq!(manager.set_margin_percentage(60.0).unwrap(), 50.0);

        let persisted = stored(&store);
        assert_eq!(persisted["final_size"], 512);
        assert_eq!(persisted["margin_percentage"], 50.0);
    }

    #[test]
    fn test_sized_setters_switch_schema() {
        let store = MemoryStore::new();
        let mut manager = SettingsManager::load(&store);

        assert_eq!(manager.set_final_width(50).unwrap(), 100);
        assert_eq!(manager.set_final_height(2400).unwrap(), 2400);
        assert_eq!(manager.set_margin_size(-1).unwrap(), 0);

        assert_eq!(
            manager.settings().layout,
            CanvasLayout::Sized {
                final_width: 100,
                final_height: 2400,
                margin_size: 0
            }
        );
        assert_eq!(stored(&store)["mode"], "sized");
    }

    #[test]
    fn test_set_field_by_name() {
        let mut manager = SettingsManager::load(MemoryStore::new());

        assert_eq!(manager.set_field("final_size", "800").unwrap(), "800");
        assert_eq!(manager.set_field("final_size", "abc").unwrap(), "1000");
        assert_eq!(manager.set_field("margin_percentage", "12.5").unwrap(), "12.5");
        assert_eq!(manager.set_field("background_color", "#ABC").unwrap(), "#aabbcc");
        assert_eq!(manager.set_field("mode", "sized").unwrap(), "sized");
        assert_eq!(manager.settings().final_width(), DEFAULT_FINAL_DIMENSION);
        assert!(matches!(
            manager.set_field("colour", "#fff"),
            Err(SettingsError::UnknownField(_))
        ));
    }

    #[test]
    fn test_reset() {
        let store = MemoryStore::new();
        let mut manager = SettingsManager::load(&store);
        manager.set_margin_size(5).unwrap();

        manager.reset().unwrap();
        assert_eq!(*manager.settings(), CompositionSettings::default());
        assert_eq!(stored(&store)["mode"], "square");
    }

    /// Store whose writes always fail
    struct ReadOnlyStore;

    impl SettingsStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(SettingsError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    // TC-SET-011: a failed write leaves the in-memory settings untouched
    #[test]
    fn test_failed_persist_keeps_previous_settings() {
        let mut manager = SettingsManager::load(ReadOnlyStore);
        let before = *manager.settings();

        assert!(manager.set_final_size(1600).is_err());
        assert!(manager.set_margin_percentage(5.0).is_err());
        assert!(manager.set_final_width(600).is_err());
        assert!(manager.set_margin_size(10).is_err());
        assert!(manager.set_background_color("#000").is_err());
        assert!(manager.set_layout(CanvasLayout::sized()).is_err());
        assert!(manager.set_field("final_height", "400").is_err());
        assert_eq!(*manager.settings(), before);

        let mut manager = SettingsManager::with_settings(
            ReadOnlyStore,
            CompositionSettings::sized(600, 400, 20),
        );
        assert!(manager.reset().is_err());
        assert_eq!(manager.settings().final_width(), 600);
    }

    #[test]
    fn test_reload_from_file_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut manager = SettingsManager::load(JsonFileStore::new(&path));
        manager.set_final_size(1600).unwrap();
        manager.set_background_color("#000000").unwrap();

        let reloaded = SettingsManager::load(JsonFileStore::new(&path));
        assert_eq!(reloaded.settings().final_width(), 1600);
        assert_eq!(reloaded.settings().background_color.to_hex(), "#000000");
    }
}
