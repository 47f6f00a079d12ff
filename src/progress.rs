//! Progress reporting for the processing pipeline.
//!
//! The pipeline announces each stage through a [`ProgressCallback`]; the CLI
//! decides what to print based on an [`OutputMode`].

use std::fmt;

/// Processing stages of a single image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingStage {
    /// Initializing
    #[default]
    Initializing,
    /// Decoding the input bytes
    Decoding,
    /// Scanning for the content bounding box
    Detecting,
    /// Copying the content out of the source
    Cropping,
    /// Scaling and drawing onto the canvas
    Composing,
    /// Encoding the output bytes
    Encoding,
    /// Completed
    Completed,
}

impl ProcessingStage {
    /// Stage name
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingStage::Initializing => "Initializing",
            ProcessingStage::Decoding => "Decoding",
            ProcessingStage::Detecting => "Detecting",
            ProcessingStage::Cropping => "Cropping",
            ProcessingStage::Composing => "Composing",
            ProcessingStage::Encoding => "Encoding",
            ProcessingStage::Completed => "Completed",
        }
    }

    /// Status line shown to the user
    pub fn status_message(&self) -> &'static str {
        match self {
            ProcessingStage::Initializing => "Processing...",
            ProcessingStage::Decoding => "Loading image...",
            ProcessingStage::Detecting => "Finding content...",
            ProcessingStage::Cropping => "Cropping image...",
            ProcessingStage::Composing => "Creating final image...",
            ProcessingStage::Encoding => "Encoding output...",
            ProcessingStage::Completed => "Processing complete!",
        }
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.status_message())
    }
}

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No output
    Quiet,
    /// Normal output (result only)
    #[default]
    Normal,
    /// Verbose output (stage display)
    Verbose,
    /// Very verbose (stages and diagnostics)
    VeryVerbose,
}

impl OutputMode {
    /// Create OutputMode from verbosity level
    pub fn from_verbosity(level: u8) -> Self {
        match level {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// Check if output should be shown at this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        match (self, required) {
            (Quiet, _) => false,
            (Normal, Quiet | Normal) => true,
            (Verbose, Quiet | Normal | Verbose) => true,
            (VeryVerbose, _) => true,
            _ => false,
        }
    }
}

/// Receives pipeline progress
pub trait ProgressCallback {
    /// A stage is starting
    fn on_stage(&self, _stage: ProcessingStage) {}

    /// A stage finished with a short summary
    fn on_stage_complete(&self, _stage: ProcessingStage, _message: &str) {}
}

/// Callback that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {}
