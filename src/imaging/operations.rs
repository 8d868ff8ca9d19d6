//! High-level image operations.
//!
//! These functions combine calculations with backend execution: scale-to-fit,
//! the circular mask, and the size-constrained compression loop. Each one
//! takes ownership of (or borrows) a single [`PixelBuffer`] and shares no
//! state with other calls, so items can run them concurrently.

use super::backend::{BackendError, ImageBackend, PixelBuffer};
use super::calculations::{
    BYTES_PER_MB, bytes_to_megabytes, calculate_fit_dimensions, is_inside_circle, next_quality,
    square_crop_region,
};
use super::params::{OutputFormat, Quality};
use image::DynamicImage;
use rayon::prelude::*;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Hard ceiling on encode attempts in [`compress`].
pub const MAX_COMPRESSION_ATTEMPTS: u32 = 5;

/// Scale a buffer down so it fits in `max_width`×`max_height`.
///
/// Images that already fit are returned untouched (no upscaling).
pub fn scale_to_fit(
    backend: &impl ImageBackend,
    buffer: PixelBuffer,
    max_width: u32,
    max_height: u32,
) -> Result<PixelBuffer> {
    match calculate_fit_dimensions((buffer.width(), buffer.height()), (max_width, max_height)) {
        Some((width, height)) => {
            debug!(
                from_width = buffer.width(),
                from_height = buffer.height(),
                width,
                height,
                "scaling to fit"
            );
            backend.resize(buffer, width, height)
        }
        None => Ok(buffer),
    }
}

/// Cut a circle out of the center of an image.
///
/// The image is center-cropped to a square on its shorter edge. Pixels inside
/// the inscribed circle keep their color; everything outside becomes fully
/// transparent. The result is always RGBA and must be encoded losslessly.
pub fn circular_mask(buffer: PixelBuffer) -> Result<PixelBuffer> {
    let (x, y, size) = square_crop_region((buffer.width(), buffer.height()));
    if size == 0 {
        return Err(BackendError::ProcessingFailed(
            "Cannot mask an empty image".to_string(),
        ));
    }

    let mut square = buffer.crop_imm(x, y, size, size).into_rgba8();
    drop(buffer);

    let row_len = size as usize * 4;
    let samples: &mut [u8] = &mut square;
    samples
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(row, pixels)| {
            for (col, pixel) in pixels.chunks_exact_mut(4).enumerate() {
                if !is_inside_circle(col as u32, row as u32, size) {
                    pixel.copy_from_slice(&[0, 0, 0, 0]);
                }
            }
        });

    Ok(DynamicImage::ImageRgba8(square))
}

/// Output of the compression loop.
#[derive(Debug, Clone)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    /// Quality the returned bytes were encoded at.
    pub quality: Quality,
    /// Number of full encodes performed.
    pub attempts: u32,
    /// Whether the returned bytes are at or under the size target.
    pub within_target: bool,
}

impl Compressed {
    pub fn size_mb(&self) -> f64 {
        bytes_to_megabytes(self.bytes.len())
    }
}

/// Encode `buffer`, lowering quality until the output fits `target_max_mb`.
///
/// Each attempt is a full encode at the current quality. On overshoot the
/// quality steps down by 20% (floor 10). The loop stops at the first encode
/// that fits, at the floor, or after [`MAX_COMPRESSION_ATTEMPTS`]; in the
/// last two cases the smallest encode seen is returned. The size target is
/// best effort and never an error.
///
/// Lossless formats ignore quality, so they get exactly one attempt.
pub fn compress(
    backend: &impl ImageBackend,
    buffer: &PixelBuffer,
    format: OutputFormat,
    target_max_mb: f64,
    start_quality: Quality,
) -> Result<Compressed> {
    let target_bytes = target_max_mb * BYTES_PER_MB;
    let mut quality = start_quality;
    let mut best: Option<(Vec<u8>, Quality)> = None;
    let mut attempts = 0;

    loop {
        let bytes = backend.encode(buffer, format, quality)?;
        attempts += 1;
        let fits = bytes.len() as f64 <= target_bytes;
        debug!(
            attempt = attempts,
            quality = quality.value(),
            size = bytes.len(),
            fits,
            "encode attempt"
        );

        if best
            .as_ref()
            .is_none_or(|(smallest, _)| bytes.len() <= smallest.len())
        {
            best = Some((bytes, quality));
        }

        let exhausted = attempts >= MAX_COMPRESSION_ATTEMPTS
            || format.is_lossless()
            || quality <= Quality::FLOOR;
        if fits || exhausted {
            break;
        }
        quality = next_quality(quality);
    }

    let (bytes, quality) = best.ok_or_else(|| {
        BackendError::ProcessingFailed("Compression produced no output".to_string())
    })?;
    let within_target = bytes.len() as f64 <= target_bytes;
    Ok(Compressed {
        bytes,
        quality,
        attempts,
        within_target,
    })
}
