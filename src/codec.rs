//! Image decoding and encoding
//!
//! The pipeline never parses file formats itself; it goes through
//! [`ImageCodec`]. [`ImageRsCodec`] is the implementation backed by the
//! `image` crate.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageReader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

use crate::buffer::{PixelBuffer, CHANNELS};

/// Default JPEG quality (1-100)
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Codec error types
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG at the configured quality
    #[default]
    Jpeg,
    /// Lossless PNG, keeps alpha
    Png,
    /// Lossless WebP, keeps alpha
    Webp,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }
}

/// Pluggable decoder/encoder
pub trait ImageCodec: Send + Sync {
    /// Read dimensions without decoding pixels
    fn probe(&self, bytes: &[u8]) -> Result<(u32, u32), CodecError>;

    /// Decode to RGBA
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError>;

    /// Encode an RGBA buffer
    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CodecError>;
}

/// Codec backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRsCodec;

impl ImageRsCodec {
    fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, CodecError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        if reader.format().is_none() {
            return Err(CodecError::Decode("input is not a supported image".to_string()));
        }
        Ok(reader)
    }
}

impl ImageCodec for ImageRsCodec {
    fn probe(&self, bytes: &[u8]) -> Result<(u32, u32), CodecError> {
        Self::reader(bytes)?
            .into_dimensions()
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
        let image = Self::reader(bytes)?
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        Ok(PixelBuffer::from(&image))
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, CodecError> {
        let (width, height) = buffer.dimensions();
        let mut out = Vec::new();
        let encode_err = |e: image::ImageError| CodecError::Encode(e.to_string());

        match format {
            OutputFormat::Jpeg => {
                let rgb = flatten_over_white(buffer);
                JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
                    .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
                    .map_err(encode_err)?;
            }
            OutputFormat::Png => {
                PngEncoder::new(&mut out)
                    .write_image(buffer.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(encode_err)?;
            }
            OutputFormat::Webp => {
                WebPEncoder::new_lossless(&mut out)
                    .write_image(buffer.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(encode_err)?;
            }
        }

        Ok(out)
    }
}

/// RGB bytes with every pixel composited over opaque white
fn flatten_over_white(buffer: &PixelBuffer) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(buffer.pixel_count() as usize * 3);
    for px in buffer.as_raw().chunks_exact(CHANNELS) {
        let alpha = px[3] as u32;
        for &c in &px[..3] {
            rgb.push(((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8);
        }
    }
    rgb
}

/// `data:<mime>;base64,...` URL for encoded bytes
pub fn to_data_url(bytes: &[u8], format: OutputFormat) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PixelBuffer {
        PixelBuffer::filled(16, 8, [10, 200, 30, 255])
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Webp.mime_type(), "image/webp");
        assert_eq!(OutputFormat::default(), OutputFormat::Jpeg);
    }

    #[test]
    fn test_png_lossless_round_trip() {
        let codec = ImageRsCodec;
        let bytes = codec.encode(&sample(), OutputFormat::Png, 90).unwrap();
        assert_eq!(codec.probe(&bytes).unwrap(), (16, 8));
        assert_eq!(codec.decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_jpeg_encodes_opaque() {
        let codec = ImageRsCodec;
        let bytes = codec.encode(&sample(), OutputFormat::Jpeg, 85).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.pixel(4, 4).unwrap()[3], 255);
    }

    #[test]
    fn test_jpeg_flattens_translucent_pixels_over_white() {
        let translucent = PixelBuffer::filled(2, 1, [0, 0, 0, 128]);
        assert_eq!(flatten_over_white(&translucent), vec![127; 6]);
        assert_eq!(
            flatten_over_white(&PixelBuffer::filled(1, 1, [10, 20, 30, 0])),
            vec![255, 255, 255]
        );

        let bytes = ImageRsCodec
            .encode(&PixelBuffer::filled(16, 16, [0, 0, 0, 128]), OutputFormat::Jpeg, 95)
            .unwrap();
        let px = ImageRsCodec.decode(&bytes).unwrap().pixel(8, 8).unwrap();
        assert!((px[0] as i32 - 127).abs() <= 3, "px = {:?}", px);
    }

    #[test]
    fn test_decode_rejects_non_image() {
        let err = ImageRsCodec.decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
        assert!(err.to_string().contains("not a supported image"));
    }

    #[test]
    fn test_data_url() {
        let url = to_data_url(b"abc", OutputFormat::Png);
        assert_eq!(url, "data:image/png;base64,YWJj");
    }
}
