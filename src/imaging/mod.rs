//! Image processing: pure Rust, no system codec libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from content) |
//! | **Scale to fit** | `resize_exact` + Lanczos3 |
//! | **Circular mask** | square crop + per-row alpha carve (rayon) |
//! | **Compress** | JPEG quality step-down loop, PNG for alpha output |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and quality math (unit testable)
//! - **Parameters**: Encoder settings (`Quality`, `OutputFormat`)
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, PixelBuffer};
pub use calculations::{bytes_to_megabytes, calculate_fit_dimensions, square_crop_region};
pub use operations::{
    Compressed, MAX_COMPRESSION_ATTEMPTS, circular_mask, compress, scale_to_fit,
};
pub use params::{OutputFormat, Quality};
pub use rust_backend::{RustBackend, is_supported_image, supported_input_extensions};
