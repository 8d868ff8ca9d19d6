//! Crop orchestration: handing an item to a crop surface and parking until
//! the surface reports back.
//!
//! A crop surface is usually an interactive UI living outside our control
//! flow. Its result arrives through a different entry point than the one that
//! launched it, so each launch is registered in [`PendingCrops`] under a
//! [`CropToken`] and resumed by whoever holds that token:
//!
//! ```text
//! Idle ──launch──▶ AwaitingExternalUI ──resolve(token, ..)──▶ Completed
//!                                                          ├─▶ Cancelled
//!                                                          └─▶ ExternalUIError
//! ```
//!
//! The waiting item holds only a oneshot receiver, so no worker thread is
//! blocked while the user crops. Tokens are never reused, which keeps two
//! concurrent crops from resolving each other.

use crate::config::{Argb, PickerConfig};
use crate::imaging::{ImageBackend, OutputFormat, Quality, RustBackend, square_crop_region};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

/// Reported when a surface gives up without saying why.
pub const UNKNOWN_CROP_ERROR: &str = "Unknown error during image cropping";

/// Correlates a launched crop with its eventual result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropToken(u64);

impl fmt::Display for CropToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "crop-{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CropError {
    #[error("Failed to start cropping: {0}")]
    Launch(String),
    #[error("No pending crop for {0}")]
    UnknownToken(CropToken),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropState {
    Idle,
    AwaitingExternalUI,
    Completed,
    Cancelled,
    ExternalUIError,
}

/// Final word from a crop surface.
#[derive(Debug, Clone, PartialEq)]
pub enum CropOutcome {
    /// Cropped image written to this location.
    Completed(PathBuf),
    Cancelled,
    Failed(String),
}

impl CropOutcome {
    fn state(&self) -> CropState {
        match self {
            Self::Completed(_) => CropState::Completed,
            Self::Cancelled => CropState::Cancelled,
            Self::Failed(_) => CropState::ExternalUIError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    /// Locked 1:1.
    Square,
    /// The user may pick any ratio.
    Free,
    /// Locked to the source image's ratio.
    Original,
}

impl AspectRatio {
    pub fn for_config(config: &PickerConfig) -> Self {
        if config.is_circular() {
            Self::Square
        } else if config.free_style_crop {
            Self::Free
        } else {
            Self::Original
        }
    }
}

/// Presentation options forwarded to the crop surface.
#[derive(Debug, Clone, PartialEq)]
pub struct CropStyle {
    pub circle_dimmed_layer: bool,
    pub free_style: bool,
    pub show_frame: bool,
    pub show_grid: bool,
    pub dimmed_layer_color: Argb,
    /// Quality the surface should write its output with.
    pub compression_quality: Quality,
}

impl CropStyle {
    pub fn from_config(config: &PickerConfig) -> Self {
        Self {
            circle_dimmed_layer: config.is_circular(),
            free_style: config.free_style_crop,
            show_frame: config.show_crop_frame,
            show_grid: config.show_crop_grid,
            dimmed_layer_color: config.dimmed_layer_color,
            compression_quality: Quality::new(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropRequest {
    pub token: CropToken,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub aspect: AspectRatio,
    pub style: CropStyle,
}

// =============================================================================
// Registry
// =============================================================================

/// Outstanding crops, keyed by token.
#[derive(Debug, Default)]
pub struct PendingCrops {
    next: AtomicU64,
    waiting: Mutex<HashMap<CropToken, oneshot::Sender<CropOutcome>>>,
}

impl PendingCrops {
    pub fn new() -> Self {
        Self::default()
    }

    fn waiting(&self) -> MutexGuard<'_, HashMap<CropToken, oneshot::Sender<CropOutcome>>> {
        self.waiting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self) -> (CropToken, oneshot::Receiver<CropOutcome>) {
        let token = CropToken(self.next.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.waiting().insert(token, tx);
        (token, rx)
    }

    /// Deliver a surface's result. Each token resolves at most once.
    pub fn resolve(&self, token: CropToken, outcome: CropOutcome) -> Result<(), CropError> {
        let sender = self
            .waiting()
            .remove(&token)
            .ok_or(CropError::UnknownToken(token))?;
        // A dropped receiver means the waiting item went away; nothing to do.
        let _ = sender.send(outcome);
        Ok(())
    }

    fn forget(&self, token: CropToken) {
        self.waiting().remove(&token);
    }

    /// Drop every outstanding crop, e.g. when the host UI is torn down.
    ///
    /// Waiting items see this as a crop error.
    pub fn clear(&self) {
        self.waiting().clear();
    }

    pub fn outstanding(&self) -> usize {
        self.waiting().len()
    }
}

/// Removes a token from the registry when the crop waiting on it goes away,
/// whether it finished, failed to launch, or was dropped mid-wait.
struct TokenGuard<'a> {
    pending: &'a PendingCrops,
    token: CropToken,
}

impl Drop for TokenGuard<'_> {
    fn drop(&mut self) {
        self.pending.forget(self.token);
    }
}

// =============================================================================
// Surfaces
// =============================================================================

/// Something that can present a crop and later resolve its token.
///
/// `launch` must return promptly; the result is delivered through
/// [`PendingCrops::resolve`], from any thread and at any later time.
pub trait CropSurface: Send + Sync {
    fn launch(&self, request: CropRequest, pending: Arc<PendingCrops>) -> Result<(), String>;
}

/// Runs crops for one request configuration at a time.
pub struct CropOrchestrator {
    surface: Arc<dyn CropSurface>,
    pending: Arc<PendingCrops>,
}

impl CropOrchestrator {
    pub fn new(surface: Arc<dyn CropSurface>) -> Self {
        Self {
            surface,
            pending: Arc::new(PendingCrops::new()),
        }
    }

    /// Registry the surface's result handler resolves against.
    pub fn pending(&self) -> &Arc<PendingCrops> {
        &self.pending
    }

    /// Launch a crop of `source` into `destination` and wait for its outcome.
    ///
    /// Launch failures are errors; everything the surface reports, including
    /// cancellation, is an outcome.
    pub async fn crop(
        &self,
        source: &Path,
        destination: PathBuf,
        config: &PickerConfig,
    ) -> Result<CropOutcome, CropError> {
        let (token, receiver) = self.pending.register();
        let _guard = TokenGuard {
            pending: &self.pending,
            token,
        };
        let request = CropRequest {
            token,
            source: source.to_path_buf(),
            destination,
            aspect: AspectRatio::for_config(config),
            style: CropStyle::from_config(config),
        };
        debug!(%token, aspect = ?request.aspect, state = ?CropState::Idle, "crop requested");

        if let Err(message) = self.surface.launch(request, Arc::clone(&self.pending)) {
            return Err(CropError::Launch(message));
        }
        debug!(%token, state = ?CropState::AwaitingExternalUI, "crop launched");

        let outcome = receiver
            .await
            .unwrap_or_else(|_| CropOutcome::Failed(UNKNOWN_CROP_ERROR.to_string()));
        debug!(%token, state = ?outcome.state(), "crop resumed");
        Ok(outcome)
    }
}

/// Non-interactive surface that crops around the image center.
///
/// Square requests trim the longer edge evenly; any other aspect keeps the
/// whole frame. Work runs on the blocking pool and resolves the token when
/// done, exactly like an out-of-process UI would.
pub struct CenterCropSurface {
    backend: Arc<RustBackend>,
}

impl CenterCropSurface {
    pub fn new() -> Self {
        Self {
            backend: Arc::new(RustBackend::new()),
        }
    }
}

impl Default for CenterCropSurface {
    fn default() -> Self {
        Self::new()
    }
}

fn center_crop(backend: &RustBackend, request: &CropRequest) -> Result<(), String> {
    let bytes = std::fs::read(&request.source).map_err(|e| e.to_string())?;
    let mut buffer = backend.decode(&bytes).map_err(|e| e.to_string())?;
    if request.aspect == AspectRatio::Square {
        let (x, y, size) = square_crop_region((buffer.width(), buffer.height()));
        buffer = buffer.crop_imm(x, y, size, size);
    }
    let encoded = backend
        .encode(&buffer, OutputFormat::Jpeg, request.style.compression_quality)
        .map_err(|e| e.to_string())?;
    std::fs::write(&request.destination, encoded).map_err(|e| e.to_string())
}

impl CropSurface for CenterCropSurface {
    fn launch(&self, request: CropRequest, pending: Arc<PendingCrops>) -> Result<(), String> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| e.to_string())?;
        let backend = Arc::clone(&self.backend);
        runtime.spawn_blocking(move || {
            let outcome = match center_crop(&backend, &request) {
                Ok(()) => CropOutcome::Completed(request.destination.clone()),
                Err(message) => CropOutcome::Failed(message),
            };
            let _ = pending.resolve(request.token, outcome);
        });
        Ok(())
    }
}
