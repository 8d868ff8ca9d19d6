//! Codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: decode, resize, and encode. Everything above it
//! (masking, the compression loop, the batch pipeline) is backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and built on the
//! `image` crate. Tests use the mock in this module's `tests` submodule.

use super::params::{OutputFormat, Quality};
use image::DynamicImage;
use thiserror::Error;

/// A decoded image held in memory.
///
/// Owned by whichever stage is transforming it and moved, not cloned, into
/// the next stage.
pub type PixelBuffer = DynamicImage;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for codec backends.
///
/// Backends are shared across concurrently processed items, so they must be
/// `Send + Sync` and must not keep per-image state between calls.
pub trait ImageBackend: Send + Sync {
    /// Decode raw file bytes into a pixel buffer.
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, BackendError>;

    /// Resize to exactly `width`×`height`.
    fn resize(
        &self,
        buffer: PixelBuffer,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, BackendError>;

    /// Encode to `format`. `quality` is ignored by lossless formats.
    ///
    /// For a fixed buffer, format and quality the output length must be stable.
    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
