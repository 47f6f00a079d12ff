//! Processing pipeline
//!
//! Chains decode → detect → crop → compose → encode for one image. Every
//! step is synchronous and owns its buffers; independent images can be run
//! through separate [`Pipeline`] calls in parallel.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::buffer::PixelBuffer;
use crate::codec::{CodecError, ImageCodec, ImageRsCodec, OutputFormat, DEFAULT_JPEG_QUALITY};
use crate::compose::{ComposeError, CompositeRenderer, CompositionResult, Placement};
use crate::detect::{BoundingBox, ContentBoundingBoxDetector, DetectOptions};
use crate::progress::{NoopProgress, ProcessingStage, ProgressCallback};
use crate::settings::CompositionSettings;

/// Largest accepted input, in pixels
pub const DEFAULT_MAX_INPUT_PIXELS: u64 = 100_000_000;

/// Largest canvas the pipeline will allocate, in pixels
pub const DEFAULT_MAX_OUTPUT_PIXELS: u64 = 64_000_000;

// ============================================================
// Errors
// ============================================================

/// Pipeline error types
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Could not find content in the image (is it all white or transparent?)")]
    NoContentFound,

    #[error(transparent)]
    InvalidContent(#[from] ComposeError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Input too large: {width}x{height} exceeds {limit} pixels")]
    InputTooLarge { width: u32, height: u32, limit: u64 },

    #[error("Canvas too large: {width}x{height} exceeds {limit} pixels")]
    OutputTooLarge { width: u32, height: u32, limit: u64 },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ============================================================
// Config
// ============================================================

/// Effective pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Content detection thresholds
    pub detect: DetectOptions,
    /// Output file format
    pub output_format: OutputFormat,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Inputs above this many pixels are rejected before decoding
    pub max_input_pixels: u64,
    /// Canvases above this many pixels are rejected before rendering
    pub max_output_pixels: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detect: DetectOptions::default(),
            output_format: OutputFormat::Jpeg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_input_pixels: DEFAULT_MAX_INPUT_PIXELS,
            max_output_pixels: DEFAULT_MAX_OUTPUT_PIXELS,
        }
    }
}

impl PipelineConfig {
    /// JSON form, for diagnostics
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// ============================================================
// Results
// ============================================================

/// Result of processing one image
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Encoded output bytes
    pub bytes: Vec<u8>,
    /// Content box in the source image
    pub bbox: BoundingBox,
    /// Size of the source image
    pub source_size: (u32, u32),
    /// Composited canvas and placement
    pub composition: CompositionResult,
    /// Format of `bytes`
    pub format: OutputFormat,
}

impl ProcessOutput {
    pub fn placement(&self) -> &Placement {
        &self.composition.placement
    }

    /// Output canvas (width, height)
    pub fn output_size(&self) -> (u32, u32) {
        self.composition.dimensions()
    }
}

// ============================================================
// Pipeline
// ============================================================

/// Single-image processing pipeline
#[derive(Debug, Clone)]
pub struct Pipeline<C: ImageCodec = ImageRsCodec> {
    config: PipelineConfig,
    codec: C,
}

impl Pipeline<ImageRsCodec> {
    /// Pipeline using the `image` crate codec
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_codec(config, ImageRsCodec)
    }
}

impl<C: ImageCodec> Pipeline<C> {
    pub fn with_codec(config: PipelineConfig, codec: C) -> Self {
        Self { config, codec }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn check_canvas(&self, settings: &CompositionSettings) -> Result<()> {
        let (width, height) = (settings.final_width(), settings.final_height());
        if width as u64 * height as u64 > self.config.max_output_pixels {
            return Err(PipelineError::OutputTooLarge {
                width,
                height,
                limit: self.config.max_output_pixels,
            });
        }
        Ok(())
    }

    /// Detect, crop and compose an already decoded image
    pub fn process_buffer(
        &self,
        source: &PixelBuffer,
        settings: &CompositionSettings,
    ) -> Result<(BoundingBox, CompositionResult)> {
        self.check_canvas(settings)?;
        self.process_buffer_with_progress(source, settings, &NoopProgress)
    }

    fn process_buffer_with_progress(
        &self,
        source: &PixelBuffer,
        settings: &CompositionSettings,
        progress: &dyn ProgressCallback,
    ) -> Result<(BoundingBox, CompositionResult)> {
        progress.on_stage(ProcessingStage::Detecting);
        let bbox = ContentBoundingBoxDetector::detect_with(source, &self.config.detect)
            .ok_or(PipelineError::NoContentFound)?;
        progress.on_stage_complete(
            ProcessingStage::Detecting,
            &format!(
                "box ({}, {}) {}x{}",
                bbox.min_x,
                bbox.min_y,
                bbox.width(),
                bbox.height()
            ),
        );

        progress.on_stage(ProcessingStage::Cropping);
        let cropped = source.crop(&bbox);
        progress.on_stage_complete(
            ProcessingStage::Cropping,
            &format!("{}x{}", cropped.width(), cropped.height()),
        );

        progress.on_stage(ProcessingStage::Composing);
        let composition = CompositeRenderer::compose(&cropped, settings)?;
        let p = composition.placement;
        progress.on_stage_complete(
            ProcessingStage::Composing,
            &format!(
                "x={:.2}, y={:.2}, w={:.2}, h={:.2}",
                p.draw_x, p.draw_y, p.draw_width, p.draw_height
            ),
        );

        Ok((bbox, composition))
    }

    /// Decode raw bytes, process, and encode the result
    pub fn process(&self, raw: &[u8], settings: &CompositionSettings) -> Result<ProcessOutput> {
        self.process_with_progress(raw, settings, &NoopProgress)
    }

    /// [`Pipeline::process`] with stage reporting
    pub fn process_with_progress(
        &self,
        raw: &[u8],
        settings: &CompositionSettings,
        progress: &dyn ProgressCallback,
    ) -> Result<ProcessOutput> {
        progress.on_stage(ProcessingStage::Initializing);
        self.check_canvas(settings)?;
        progress.on_stage_complete(
            ProcessingStage::Initializing,
            &format!("canvas {}x{}", settings.final_width(), settings.final_height()),
        );

        progress.on_stage(ProcessingStage::Decoding);
        let (width, height) = self.codec.probe(raw)?;
        let pixels = width as u64 * height as u64;
        if pixels > self.config.max_input_pixels {
            return Err(PipelineError::InputTooLarge {
                width,
                height,
                limit: self.config.max_input_pixels,
            });
        }
        let source = self.codec.decode(raw)?;
        progress.on_stage_complete(
            ProcessingStage::Decoding,
            &format!("{}x{}", source.width(), source.height()),
        );
        info!("Original dimensions: {}x{}", source.width(), source.height());

        let (bbox, composition) = self.process_buffer_with_progress(&source, settings, progress)?;

        progress.on_stage(ProcessingStage::Encoding);
        let bytes = self.codec.encode(
            &composition.buffer,
            self.config.output_format,
            self.config.jpeg_quality,
        )?;
        progress.on_stage_complete(ProcessingStage::Encoding, &format!("{} bytes", bytes.len()));

        info!(
            "Processed {}x{} -> {}x{} ({} bytes)",
            source.width(),
            source.height(),
            composition.buffer.width(),
            composition.buffer.height(),
            bytes.len()
        );
        progress.on_stage(ProcessingStage::Completed);

        Ok(ProcessOutput {
            bytes,
            bbox,
            source_size: source.dimensions(),
            composition,
            format: self.config.output_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::cell::RefCell;

    fn red_square_png() -> Vec<u8> {
        let mut img = RgbaImage::from_pixel(200, 100, Rgba([255, 255, 255, 255]));
        for y in 10..60 {
            for x in 10..60 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        ImageRsCodec
            .encode(&img.into(), OutputFormat::Png, 90)
            .unwrap()
    }

    fn png_config() -> PipelineConfig {
        PipelineConfig {
            output_format: OutputFormat::Png,
            ..Default::default()
        }
    }

    // TC-PIPE-001: end-to-end on the red square scenario
    #[test]
    fn test_process_red_square() {
        let pipeline = Pipeline::new(png_config());
        let settings = CompositionSettings::sized(1000, 1000, 180);
        let output = pipeline.process(&red_square_png(), &settings).unwrap();

        assert_eq!(
            output.bbox,
            BoundingBox {
                min_x: 10,
                min_y: 10,
                max_x: 59,
                max_y: 59
            }
        );
        assert_eq!(output.source_size, (200, 100));
        assert_eq!(output.output_size(), (1000, 1000));
        assert!((output.placement().scale - 12.8).abs() < 1e-9);

        let decoded = ImageRsCodec.decode(&output.bytes).unwrap();
        assert_eq!(decoded.pixel(500, 500), Some([255, 0, 0, 255]));
        assert_eq!(decoded.pixel(10, 10), Some([255, 255, 255, 255]));
    }

    // TC-PIPE-002: blank input
    #[test]
    fn test_process_blank_image() {
        let blank = RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]));
        let bytes = ImageRsCodec
            .encode(&blank.into(), OutputFormat::Png, 90)
            .unwrap();

        let result = Pipeline::new(png_config()).process(&bytes, &CompositionSettings::default());
        assert!(matches!(result, Err(PipelineError::NoContentFound)));
    }

    #[test]
    fn test_process_not_an_image() {
        let result =
            Pipeline::new(png_config()).process(b"hello world", &CompositionSettings::default());
        assert!(matches!(
            result,
            Err(PipelineError::Codec(CodecError::Decode(_)))
        ));
    }

    #[test]
    fn test_input_too_large() {
        let config = PipelineConfig {
            max_input_pixels: 100,
            ..png_config()
        };
        let result = Pipeline::new(config).process(&red_square_png(), &CompositionSettings::default());
        assert!(matches!(
            result,
            Err(PipelineError::InputTooLarge {
                width: 200,
                height: 100,
                limit: 100
            })
        ));
    }

    #[test]
    fn test_output_too_large() {
        let config = PipelineConfig {
            max_output_pixels: 1_000_000,
            ..png_config()
        };
        let pipeline = Pipeline::new(config);
        let settings = CompositionSettings::sized(2000, 1000, 0);

        let result = pipeline.process(&red_square_png(), &settings);
        assert!(matches!(
            result,
            Err(PipelineError::OutputTooLarge {
                width: 2000,
                height: 1000,
                limit: 1_000_000
            })
        ));

        let source = PixelBuffer::filled(4, 4, [0, 0, 0, 255]);
        let huge = CompositionSettings::sized(u32::MAX, u32::MAX, 0);
        assert!(matches!(
            Pipeline::new(PipelineConfig::default()).process_buffer(&source, &huge),
            Err(PipelineError::OutputTooLarge { .. })
        ));
    }

    #[test]
    fn test_process_buffer_no_codec() {
        let source = PixelBuffer::filled(30, 30, [0, 0, 0, 255]);
        let pipeline = Pipeline::new(PipelineConfig::default());
        let (bbox, result) = pipeline
            .process_buffer(&source, &CompositionSettings::square(512, 0.0))
            .unwrap();
        assert_eq!(bbox.width(), 30);
        assert_eq!(result.dimensions(), (512, 512));
        assert_eq!(result.buffer.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_progress_stages_in_order() {
        struct Recorder(RefCell<Vec<ProcessingStage>>);
        impl ProgressCallback for Recorder {
            fn on_stage(&self, stage: ProcessingStage) {
                self.0.borrow_mut().push(stage);
            }
        }

        let recorder = Recorder(RefCell::new(Vec::new()));
        Pipeline::new(png_config())
            .process_with_progress(&red_square_png(), &CompositionSettings::default(), &recorder)
            .unwrap();

        assert_eq!(
            *recorder.0.borrow(),
            vec![
                ProcessingStage::Initializing,
                ProcessingStage::Decoding,
                ProcessingStage::Detecting,
                ProcessingStage::Cropping,
                ProcessingStage::Composing,
                ProcessingStage::Encoding,
                ProcessingStage::Completed,
            ]
        );
    }

    #[test]
    fn test_config_to_json() {
        let json = PipelineConfig::default().to_json();
        assert!(json.contains("\"output_format\":\"jpeg\""));
        assert!(json.contains("\"white_threshold\":245"));
    }

    #[test]
    fn test_independent_pipelines_in_parallel() {
        let bytes = red_square_png();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let bytes = bytes.clone();
                std::thread::spawn(move || {
                    let settings = CompositionSettings::sized(200 + i * 100, 200, 20);
                    Pipeline::new(png_config())
                        .process(&bytes, &settings)
                        .map(|out| out.output_size())
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let size = handle.join().unwrap().unwrap();
            assert_eq!(size, (200 + i as u32 * 100, 200));
        }
    }
}
