//! centerframe - crop images to their content and re-center it on a canvas
//!
//! # Pipeline
//!
//! 1. Decode ([`ImageCodec`])
//! 2. Find the content box ([`ContentBoundingBoxDetector`])
//! 3. Crop to the box ([`PixelBuffer::crop`])
//! 4. Scale, center and composite ([`CompositeRenderer`])
//! 5. Encode
//!
//! # Example
//!
//! ```rust,no_run
//! use centerframe::{CompositionSettings, Pipeline, PipelineConfig};
//!
//! let raw = std::fs::read("photo.png").unwrap();
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let output = pipeline.process(&raw, &CompositionSettings::default()).unwrap();
//! std::fs::write("photo_1000x1000.jpg", &output.bytes).unwrap();
//! ```

pub mod buffer;
pub mod cli;
pub mod codec;
pub mod compose;
pub mod config;
pub mod detect;
pub mod naming;
pub mod pipeline;
pub mod progress;
pub mod settings;

// Buffer
pub use buffer::PixelBuffer;

// CLI
pub use cli::{Cli, Commands, ProcessArgs, SettingsAction, SettingsArgs};

// Codec
pub use codec::{to_data_url, CodecError, ImageCodec, ImageRsCodec, OutputFormat};

// Composition
pub use compose::{
    compute_placement, ComposeError, CompositeRenderer, CompositionResult, Placement,
    MIN_CONTENT_PX,
};

// Config
pub use config::{CliOverrides, Config, ConfigError};

// Detection
pub use detect::{BoundingBox, ContentBoundingBoxDetector, DetectError, DetectOptions};

// Naming
pub use naming::{output_filename, pasted_image_name};

// Pipeline
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, ProcessOutput};

// Progress
pub use progress::{NoopProgress, OutputMode, ProcessingStage, ProgressCallback};

// Settings
pub use settings::{
    BackgroundColor, CanvasLayout, CompositionSettings, InvalidSettingsValue, JsonFileStore,
    MarginSpec, MemoryStore, SettingsError, SettingsManager, SettingsStore,
};

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
    pub const NO_CONTENT: i32 = 4;
}
