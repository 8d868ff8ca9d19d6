//! Pure Rust codec backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality 1–100) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless, keeps alpha) |

use super::backend::{BackendError, ImageBackend, PixelBuffer};
use super::params::{OutputFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether a path's extension is one we can decode.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_jpeg(buffer: &PixelBuffer, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.value() as u8);
    // JPEG has no alpha channel; flatten anything that isn't already opaque RGB/Luma.
    let result = match buffer {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => {
            buffer.write_with_encoder(encoder)
        }
        other => DynamicImage::ImageRgb8(other.to_rgb8()).write_with_encoder(encoder),
    };
    result.map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))?;
    Ok(out)
}

fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    buffer
        .write_with_encoder(PngEncoder::new(&mut out))
        .map_err(|e| BackendError::Encode(format!("PNG encode failed: {}", e)))?;
    Ok(out)
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, BackendError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn resize(
        &self,
        buffer: PixelBuffer,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Invalid resize target {}x{}",
                width, height
            )));
        }
        Ok(buffer.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        match format {
            OutputFormat::Jpeg => encode_jpeg(buffer, quality),
            OutputFormat::Png => encode_png(buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage, RgbaImage};

    /// A noisy gradient so JPEG size actually responds to quality.
    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([
                (x % 256) as u8,
                (y % 256) as u8,
                ((x * 7 + y * 13) % 256) as u8,
            ])
        }))
    }

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn is_supported_image_ignores_case() {
        assert!(is_supported_image(Path::new("/a/IMG_0001.JPG")));
        assert!(is_supported_image(Path::new("photo.webp")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn jpeg_roundtrip_preserves_dimensions() {
        let backend = RustBackend::new();
        let bytes = backend
            .encode(&gradient(200, 150), OutputFormat::Jpeg, Quality::new(80))
            .unwrap();

        let decoded = backend.decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (200, 150));
    }

    #[test]
    fn jpeg_encoding_is_deterministic() {
        let backend = RustBackend::new();
        let image = gradient(120, 90);
        let first = backend
            .encode(&image, OutputFormat::Jpeg, Quality::new(60))
            .unwrap();
        let second = backend
            .encode(&image, OutputFormat::Jpeg, Quality::new(60))
            .unwrap();
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn lower_jpeg_quality_produces_smaller_output() {
        let backend = RustBackend::new();
        let image = gradient(256, 256);
        let high = backend
            .encode(&image, OutputFormat::Jpeg, Quality::new(95))
            .unwrap();
        let low = backend
            .encode(&image, OutputFormat::Jpeg, Quality::new(20))
            .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn jpeg_encode_flattens_alpha() {
        let backend = RustBackend::new();
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            32,
            32,
            image::Rgba([10, 20, 30, 128]),
        ));
        let bytes = backend
            .encode(&rgba, OutputFormat::Jpeg, Quality::new(60))
            .unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn png_encode_keeps_alpha() {
        let backend = RustBackend::new();
        let mut rgba = RgbaImage::from_pixel(16, 16, image::Rgba([255, 0, 0, 255]));
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));

        let bytes = backend
            .encode(
                &DynamicImage::ImageRgba8(rgba),
                OutputFormat::Png,
                Quality::new(1),
            )
            .unwrap();
        let decoded = backend.decode(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
        assert_eq!(decoded.get_pixel(8, 8).0, [255, 0, 0, 255]);
    }

    #[test]
    fn decode_garbage_errors() {
        let backend = RustBackend::new();
        assert!(backend.decode(b"definitely not an image").is_err());
    }

    #[test]
    fn resize_exact_dimensions() {
        let backend = RustBackend::new();
        let resized = backend.resize(gradient(400, 300), 200, 150).unwrap();
        assert_eq!(resized.dimensions(), (200, 150));
    }

    #[test]
    fn resize_rejects_zero_target() {
        let backend = RustBackend::new();
        assert!(backend.resize(gradient(10, 10), 0, 5).is_err());
    }
}
