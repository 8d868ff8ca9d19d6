//! CLI output formatting for request results.
//!
//! Each image leads with its positional index and display name; the output
//! location and encode details follow as indented context lines. Failures are
//! listed after the successes under their own header, so the original
//! selection order can be reconstructed from the indices.
//!
//! ```text
//! Images (2 of 3)
//! 001 IMG_0001.jpg
//!     Output: /tmp/cropflow/CropImage_20240611_101500_123_4242000001.jpg
//!     1707x1280, 0.42 MB, image/jpeg, quality 60
//! 003 IMG_0003.jpg
//!     Output: /tmp/cropflow/CropImage_20240611_101500_456_4242000003.jpg
//!     1280x1280, 1.10 MB, image/png
//!
//! Failed
//! 002 User canceled image cropping (UserCancelled)
//! ```
//!
//! Request-level failures print a single `Error:` line.
//!
//! Each `format_*` function returns `Vec<String>` and is pure; the `print_*`
//! wrappers write to stdout.

use crate::api::RequestError;
use crate::pipeline::{BatchResponse, ImageResult};

/// Format a 0-based original index as a 1-based, 3-digit zero-padded position.
fn format_index(original_index: usize) -> String {
    format!("{:0>3}", original_index + 1)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Encode details: dimensions, size, type, and quality for lossy output.
fn detail_line(result: &ImageResult) -> String {
    let mut line = format!(
        "{}x{}, {:.2} MB, {}",
        result.dimensions.width, result.dimensions.height, result.size_mb, result.mime_type
    );
    if result.mime_type == "image/jpeg" {
        line.push_str(&format!(", quality {}", result.quality.value()));
        if result.attempts > 1 {
            line.push_str(&format!(" ({} attempts)", result.attempts));
        }
    }
    line
}

pub fn format_batch_response(response: &BatchResponse) -> Vec<String> {
    let mut lines = vec![format!(
        "Images ({} of {})",
        response.success_count, response.requested_count
    )];

    for result in &response.items {
        lines.push(format!(
            "{} {}",
            format_index(result.original_index),
            result.display_name
        ));
        lines.push(format!("{}Output: {}", indent(1), result.location.display()));
        lines.push(format!("{}{}", indent(1), detail_line(result)));
    }

    if !response.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failed".to_string());
        for failure in &response.failures {
            lines.push(format!(
                "{} {} ({})",
                format_index(failure.index),
                failure.reason,
                failure.reason.kind()
            ));
        }
    }
    lines
}

pub fn print_batch_response(response: &BatchResponse) {
    for line in format_batch_response(response) {
        println!("{}", line);
    }
}

pub fn format_request_error(error: &RequestError) -> Vec<String> {
    vec![format!("Error: {}", error)]
}

pub fn print_request_error(error: &RequestError) {
    for line in format_request_error(error) {
        println!("{}", line);
    }
}
