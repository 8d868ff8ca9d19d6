//! Pure calculation functions for image dimensions and encoder settings.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Quality;

/// Bytes per megabyte for all size reporting (binary megabytes).
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Calculate the dimensions an image must be scaled to so it fits in a box.
///
/// Returns `None` when the source already fits (no resize needed). Otherwise
/// both edges are scaled by the same factor, `min(max_w / w, max_h / h)`, and
/// rounded to the nearest pixel. Neither edge collapses below 1px.
///
/// # Examples
/// ```
/// # use cropflow::imaging::calculate_fit_dimensions;
/// // 4000x3000 into 1920x1280 → limited by height: 1707x1280
/// assert_eq!(calculate_fit_dimensions((4000, 3000), (1920, 1280)), Some((1707, 1280)));
///
/// // Already fits
/// assert_eq!(calculate_fit_dimensions((800, 600), (1920, 1280)), None);
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), max: (u32, u32)) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    let (max_w, max_h) = max;

    if src_w <= max_w && src_h <= max_h {
        return None;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    Some((w, h))
}

/// Next quality to try after an encode overshoots its size target.
///
/// Steps down by 20% (floored) and never below [`Quality::FLOOR`].
pub fn next_quality(current: Quality) -> Quality {
    let stepped = current.value() * 4 / 5;
    Quality::new(stepped.max(Quality::FLOOR.value()))
}

/// Centered square crop region for an image: `(x, y, size)`.
///
/// `size` is the shorter edge; the longer edge is trimmed evenly on both sides.
pub fn square_crop_region(source: (u32, u32)) -> (u32, u32, u32) {
    let (w, h) = source;
    let size = w.min(h);
    ((w - size) / 2, (h - size) / 2, size)
}

/// Whether pixel `(x, y)` of a `size`×`size` square lies in the inscribed circle.
///
/// Sampled at the pixel center, so a pixel counts as inside when its center is
/// within `size / 2` of the square's center.
pub fn is_inside_circle(x: u32, y: u32, size: u32) -> bool {
    let radius = size as f64 / 2.0;
    let dx = x as f64 + 0.5 - radius;
    let dy = y as f64 + 0.5 - radius;
    dx * dx + dy * dy <= radius * radius
}

/// Convert a byte count to megabytes.
pub fn bytes_to_megabytes(len: usize) -> f64 {
    len as f64 / BYTES_PER_MB
}
