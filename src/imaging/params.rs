//! Parameter types for image operations.
//!
//! These types describe *how* an image should be written, not what pixels it
//! holds. They sit between the high-level [`operations`](super::operations)
//! module (which decides what to encode and how often) and the
//! [`backend`](super::backend) (which does the actual codec work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 60). Clamped on construction.
//! - [`OutputFormat`]: Final container: JPEG for opaque images, PNG when alpha must survive.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u32);

impl Quality {
    /// Lowest quality the compression loop will step down to.
    pub const FLOOR: Quality = Quality(10);

    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(60)
    }
}

/// Encoded output format.
///
/// JPEG discards alpha, so anything produced by the circular mask must be
/// written as PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// Lossless formats ignore the quality knob entirely.
    pub fn is_lossless(self) -> bool {
        matches!(self, Self::Png)
    }
}
