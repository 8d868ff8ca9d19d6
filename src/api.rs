//! Request API: what a bridging layer calls.
//!
//! [`ImagePicker`] owns the current configuration snapshot and the surfaces
//! that talk to the outside world, and exposes three calls:
//!
//! - [`configure`](ImagePicker::configure) replaces the snapshot wholesale.
//! - [`pick_image`](ImagePicker::pick_image) runs a selection request.
//! - [`capture_image`](ImagePicker::capture_image) runs a camera request.
//!
//! Requests clone the `Arc` snapshot when they start, so a `configure` that
//! lands mid-request only affects the next one.
//!
//! Results are rendered for the bridge by [`response_json`]:
//!
//! ```json
//! {
//!   "response": { "images": [ { "uri": "file:///…/CropImage_….jpg", "width": 1707,
//!     "height": 1280, "size": 0.42, "index": 0, "type": "image/jpeg",
//!     "fileName": "IMG_0001.jpg", "timestamp": 1718000000000 } ] },
//!   "multiple": false, "count": 1, "hasErrors": false
//! }
//! ```

use crate::config::{PickerConfig, resolve};
use crate::crop::{CropOrchestrator, CropSurface, PendingCrops};
use crate::imaging::ImageBackend;
use crate::pipeline::{BatchCoordinator, BatchResponse, ImageResult, ItemFailure};
use crate::scratch::ScratchDir;
use crate::source::{AcquisitionError, CaptureOutcome, SelectionEvent, acquire_capture};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum RequestError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error("No camera app found")]
    NoCamera,
    #[error("Failed to create image file: {0}")]
    FileCreation(#[source] std::io::Error),
}

/// Lets the user pick existing images.
pub trait SelectionSurface: Send + Sync {
    /// `multiple` says whether multi-selection is allowed.
    fn select(&self, multiple: bool) -> BoxFuture<'_, SelectionEvent>;
}

/// Fills a pre-created file with a camera capture.
pub trait CaptureSurface: Send + Sync {
    fn is_available(&self) -> bool;
    fn capture(&self, target: PathBuf) -> BoxFuture<'_, CaptureOutcome>;
}

pub struct ImagePicker<B: ImageBackend + 'static> {
    config: RwLock<Arc<PickerConfig>>,
    selection: Arc<dyn SelectionSurface>,
    capture: Arc<dyn CaptureSurface>,
    coordinator: BatchCoordinator<B>,
}

impl<B: ImageBackend + 'static> ImagePicker<B> {
    pub fn new(
        backend: B,
        selection: Arc<dyn SelectionSurface>,
        capture: Arc<dyn CaptureSurface>,
        crop: Arc<dyn CropSurface>,
        scratch: ScratchDir,
        jobs: usize,
    ) -> Self {
        Self {
            config: RwLock::new(Arc::new(PickerConfig::default())),
            selection,
            capture,
            coordinator: BatchCoordinator::new(backend, CropOrchestrator::new(crop), scratch, jobs),
        }
    }

    /// Replace the configuration with `overrides` laid over the defaults.
    pub fn configure(&self, overrides: &Value) {
        let config = Arc::new(resolve(overrides));
        debug!(options = %config.to_options(), "configured");
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Snapshot in effect for the next request.
    pub fn config(&self) -> Arc<PickerConfig> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Registry a crop surface's result handler resolves against.
    pub fn pending_crops(&self) -> &Arc<PendingCrops> {
        self.coordinator.crop_orchestrator().pending()
    }

    pub async fn pick_image(&self) -> Result<BatchResponse, RequestError> {
        let config = self.config();
        info!(multiple = config.multiple_image, "pick requested");
        let event = self.selection.select(config.multiple_image).await;
        Ok(self.coordinator.run(event, config).await?)
    }

    pub async fn capture_image(&self) -> Result<BatchResponse, RequestError> {
        let config = self.config();
        info!("capture requested");
        if !self.capture.is_available() {
            return Err(RequestError::NoCamera);
        }

        let target = self
            .coordinator
            .scratch()
            .create_capture_file()
            .map_err(RequestError::FileCreation)?;
        let outcome = self.capture.capture(target.clone()).await;
        let sources = match acquire_capture(outcome, &target) {
            Ok(sources) => sources,
            Err(e) => {
                // Nothing was captured into it.
                let _ = std::fs::remove_file(&target);
                return Err(e.into());
            }
        };
        let response = self.coordinator.process(sources, false, config).await;
        if let Err(e) = std::fs::remove_file(&target) {
            warn!(path = %target.display(), error = %e, "could not remove capture target");
        }
        Ok(response)
    }
}

// =============================================================================
// Bridge JSON
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    response: Images<'a>,
    multiple: bool,
    count: usize,
    has_errors: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<FailureJson>,
}

#[derive(Serialize)]
struct Images<'a> {
    images: Vec<ImageJson<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageJson<'a> {
    uri: String,
    width: u32,
    height: u32,
    size: f64,
    index: usize,
    #[serde(rename = "type")]
    mime_type: &'a str,
    file_name: &'a str,
    timestamp: i64,
}

#[derive(Serialize)]
struct FailureJson {
    index: usize,
    reason: &'static str,
    message: String,
}

/// `file://` URI for a local path.
pub fn file_uri(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

impl<'a> From<&'a ImageResult> for ImageJson<'a> {
    fn from(result: &'a ImageResult) -> Self {
        Self {
            uri: file_uri(&result.location),
            width: result.dimensions.width,
            height: result.dimensions.height,
            size: result.size_mb,
            index: result.original_index,
            mime_type: &result.mime_type,
            file_name: &result.display_name,
            timestamp: result.timestamp,
        }
    }
}

impl From<&ItemFailure> for FailureJson {
    fn from(failure: &ItemFailure) -> Self {
        Self {
            index: failure.index,
            reason: failure.reason.kind(),
            message: failure.reason.to_string(),
        }
    }
}

/// Render a batch response in the bridge's schema.
pub fn response_json(response: &BatchResponse) -> Value {
    let envelope = Envelope {
        response: Images {
            images: response.items.iter().map(ImageJson::from).collect(),
        },
        multiple: response.multiple,
        count: response.success_count,
        has_errors: response.has_errors,
        error_message: response.error_message.as_deref(),
        failures: response.failures.iter().map(FailureJson::from).collect(),
    };
    serde_json::to_value(envelope).unwrap_or(Value::Null)
}

/// Render either outcome of a request; errors become the error-shaped response.
pub fn request_json(result: &Result<BatchResponse, RequestError>, multiple: bool) -> Value {
    match result {
        Ok(response) => response_json(response),
        Err(e) => response_json(&BatchResponse::request_failed(e.to_string(), multiple)),
    }
}
