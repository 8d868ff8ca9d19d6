//! Source acquisition: turning what a picker or camera hands back into an
//! ordered list of [`SourceReference`]s.
//!
//! Picker results come in two shapes. A multi-selection arrives as a list
//! (taken in the order given), a single pick as one optional location. Both
//! normalize to the same `Vec`. Limits are enforced here, before any item
//! is touched, so an over-limit batch never does partial work.
//!
//! A camera capture is the one-item special case: the capture target is a
//! file the caller created in scratch, and the result just points at it.

use crate::config::PickerConfig;
use image::ImageFormat;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// MIME type assumed when the extension tells us nothing.
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Which surface an acquisition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Picker,
    Capture,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Picker => write!(f, "picker"),
            Self::Capture => write!(f, "capture"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    #[error("Image {0} canceled")]
    Cancelled(Origin),
    #[error("{}", no_selection_message(.multiple))]
    NoSelection { multiple: bool },
    #[error("You can select up to {max} images only")]
    TooManyItems { selected: usize, max: usize },
    #[error("Failed to capture image: {0}")]
    CaptureFailed(String),
}

fn no_selection_message(multiple: &bool) -> &'static str {
    if *multiple {
        "No images selected"
    } else {
        "No image selected"
    }
}

/// Handle to an image that has not been read yet.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReference {
    pub location: PathBuf,
    pub mime_type: String,
    pub display_name: Option<String>,
}

impl SourceReference {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let location = path.into();
        Self {
            mime_type: mime_type_for(&location).to_string(),
            display_name: location
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            location,
        }
    }
}

/// MIME type from the file extension, falling back to JPEG.
pub fn mime_type_for(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE)
}

/// What a selection surface reported.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    Cancelled,
    /// A single pick; `None` when the surface closed without a usable result.
    Single(Option<PathBuf>),
    /// A multi-selection, in the order the surface reported it.
    Multiple(Vec<PathBuf>),
}

/// What a capture surface reported after being handed a target file.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Captured,
    Cancelled,
    Failed(String),
}

/// Normalize a selection event into source references.
pub fn acquire(
    event: SelectionEvent,
    config: &PickerConfig,
) -> Result<Vec<SourceReference>, AcquisitionError> {
    match event {
        SelectionEvent::Cancelled => Err(AcquisitionError::Cancelled(Origin::Picker)),
        SelectionEvent::Single(None) => Err(AcquisitionError::NoSelection {
            multiple: config.multiple_image,
        }),
        SelectionEvent::Single(Some(path)) => Ok(vec![SourceReference::from_path(path)]),
        SelectionEvent::Multiple(paths) => {
            if paths.len() > config.max_images {
                return Err(AcquisitionError::TooManyItems {
                    selected: paths.len(),
                    max: config.max_images,
                });
            }
            if paths.is_empty() {
                return Err(AcquisitionError::NoSelection { multiple: true });
            }
            Ok(paths.into_iter().map(SourceReference::from_path).collect())
        }
    }
}

/// Normalize a capture result for the file at `target`.
pub fn acquire_capture(
    outcome: CaptureOutcome,
    target: &Path,
) -> Result<Vec<SourceReference>, AcquisitionError> {
    match outcome {
        CaptureOutcome::Captured => Ok(vec![SourceReference::from_path(target)]),
        CaptureOutcome::Cancelled => Err(AcquisitionError::Cancelled(Origin::Capture)),
        CaptureOutcome::Failed(message) => Err(AcquisitionError::CaptureFailed(message)),
    }
}
