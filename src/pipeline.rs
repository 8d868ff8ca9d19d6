//! Batch coordination: from acquired sources to one ordered [`BatchResponse`].
//!
//! ## Phases
//!
//! ```text
//! CollectingSources ──▶ ProcessingItems ──▶ Assembling ──▶ Done
//!        │
//!        └── acquisition error ──▶ Done (request-level failure)
//! ```
//!
//! Only acquisition can fail a request. Once items exist, every item runs
//! independently:
//!
//! ```text
//! crop (if cropEnabled) → mask (if circular) → scale to fit → compress → write
//! ```
//!
//! and anything that goes wrong is caught at the item boundary and recorded as
//! an [`ItemOutcome::Failure`]. The coordinator always reaches `Assembling`.
//!
//! ## Concurrency
//!
//! All items are driven together with `join_all`. Crop waits are plain
//! awaits on a oneshot channel, so a user taking their time on one crop does
//! not hold up the others or pin a thread. Decode/transform/encode work runs
//! on tokio's blocking pool, at most `jobs` items at a time. Each item carries
//! its original index; results are sorted by it at the end.

use crate::config::PickerConfig;
use crate::crop::{CropError, CropOrchestrator, CropOutcome};
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, OutputFormat, Quality, circular_mask, compress,
    scale_to_fit,
};
use crate::scratch::ScratchDir;
use crate::source::{AcquisitionError, SelectionEvent, SourceReference, acquire};
use futures::future::join_all;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

/// Display name used when neither the source nor the output has one.
pub const UNKNOWN_FILE_NAME: &str = "unknown";

#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image: {0}")]
    Decode(#[source] BackendError),
    #[error("User canceled image cropping")]
    CropCancelled,
    #[error("{0}")]
    CropFailed(String),
    #[error(transparent)]
    CropLaunch(#[from] CropError),
    #[error("Failed to process image: {0}")]
    Transform(#[source] BackendError),
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl ItemError {
    /// Stable machine-readable reason.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Read { .. } => "ReadError",
            Self::Decode(_) => "DecodeError",
            Self::CropCancelled => "UserCancelled",
            Self::CropFailed(_) | Self::CropLaunch(_) => "CropError",
            Self::Transform(_) => "TransformError",
            Self::Write { .. } => "WriteError",
            Self::Worker(_) => "WorkerError",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    CollectingSources,
    ProcessingItems,
    Assembling,
    Done,
}

/// Terminal output of one successfully processed item.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub original_index: usize,
    /// Where the final bytes live.
    pub location: PathBuf,
    pub dimensions: Dimensions,
    pub size_mb: f64,
    pub mime_type: String,
    pub display_name: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Quality the final encode used.
    pub quality: Quality,
    pub attempts: u32,
}

#[derive(Debug)]
pub struct ItemFailure {
    pub index: usize,
    pub reason: ItemError,
}

#[derive(Debug)]
pub enum ItemOutcome {
    Success(ImageResult),
    Failure(ItemFailure),
}

impl ItemOutcome {
    fn index(&self) -> usize {
        match self {
            Self::Success(result) => result.original_index,
            Self::Failure(failure) => failure.index,
        }
    }
}

/// Everything a caller gets back from one request.
#[derive(Debug)]
pub struct BatchResponse {
    /// Successful items, ascending by original index.
    pub items: Vec<ImageResult>,
    pub multiple: bool,
    pub requested_count: usize,
    pub success_count: usize,
    pub has_errors: bool,
    /// Set only for request-level failures.
    pub error_message: Option<String>,
    /// Per-item failures, ascending by index.
    pub failures: Vec<ItemFailure>,
}

impl BatchResponse {
    /// Merge per-item outcomes, in whatever order they finished.
    pub fn assemble(mut outcomes: Vec<ItemOutcome>, multiple: bool) -> Self {
        outcomes.sort_by_key(ItemOutcome::index);
        let requested_count = outcomes.len();

        let mut items = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                ItemOutcome::Success(result) => items.push(result),
                ItemOutcome::Failure(failure) => failures.push(failure),
            }
        }

        let success_count = items.len();
        Self {
            items,
            multiple,
            requested_count,
            success_count,
            has_errors: success_count < requested_count,
            error_message: None,
            failures,
        }
    }

    /// A response for a request that failed before any item existed.
    pub fn request_failed(message: impl Into<String>, multiple: bool) -> Self {
        Self {
            items: Vec::new(),
            multiple,
            requested_count: 0,
            success_count: 0,
            has_errors: true,
            error_message: Some(message.into()),
            failures: Vec::new(),
        }
    }
}

// =============================================================================
// Per-item rendering (synchronous, runs on the blocking pool)
// =============================================================================

struct Rendered {
    location: PathBuf,
    dimensions: Dimensions,
    format: OutputFormat,
    size_mb: f64,
    quality: Quality,
    attempts: u32,
}

/// Decode `input`, apply the configured transforms, and write the final file.
fn render_item(
    backend: &impl ImageBackend,
    scratch: &ScratchDir,
    input: &Path,
    config: &PickerConfig,
) -> Result<Rendered, ItemError> {
    let bytes = fs::read(input).map_err(|source| ItemError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let mut buffer = backend.decode(&bytes).map_err(ItemError::Decode)?;
    drop(bytes);

    let format = if config.is_circular() {
        buffer = circular_mask(buffer).map_err(ItemError::Transform)?;
        OutputFormat::Png
    } else {
        OutputFormat::Jpeg
    };

    let buffer = scale_to_fit(backend, buffer, config.max_width, config.max_height)
        .map_err(ItemError::Transform)?;
    let dimensions = Dimensions {
        width: buffer.width(),
        height: buffer.height(),
    };

    let compressed = compress(
        backend,
        &buffer,
        format,
        config.max_file_size_mb,
        config.image_quality,
    )
    .map_err(ItemError::Transform)?;
    drop(buffer);

    if !compressed.within_target {
        debug!(
            size_mb = compressed.size_mb(),
            target_mb = config.max_file_size_mb,
            "size target not reached, keeping smallest encode"
        );
    }

    let location = scratch.output_path(format);
    fs::write(&location, &compressed.bytes).map_err(|source| ItemError::Write {
        path: location.clone(),
        source,
    })?;

    Ok(Rendered {
        location,
        dimensions,
        format,
        size_mb: compressed.size_mb(),
        quality: compressed.quality,
        attempts: compressed.attempts,
    })
}

fn display_name(source: &SourceReference, output: &Path) -> String {
    source
        .display_name
        .clone()
        .or_else(|| {
            output
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string())
}

// =============================================================================
// Coordinator
// =============================================================================

/// Drives requests through the per-item pipeline.
pub struct BatchCoordinator<B: ImageBackend + 'static> {
    backend: Arc<B>,
    crop: CropOrchestrator,
    scratch: Arc<ScratchDir>,
    permits: Arc<Semaphore>,
}

impl<B: ImageBackend + 'static> BatchCoordinator<B> {
    /// `jobs` bounds how many items decode/encode at once (at least 1).
    pub fn new(backend: B, crop: CropOrchestrator, scratch: ScratchDir, jobs: usize) -> Self {
        Self {
            backend: Arc::new(backend),
            crop,
            scratch: Arc::new(scratch),
            permits: Arc::new(Semaphore::new(jobs.max(1))),
        }
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    pub fn crop_orchestrator(&self) -> &CropOrchestrator {
        &self.crop
    }

    /// Acquire sources from a selection event, then process them.
    pub async fn run(
        &self,
        event: SelectionEvent,
        config: Arc<PickerConfig>,
    ) -> Result<BatchResponse, AcquisitionError> {
        debug!(phase = ?Phase::CollectingSources);
        let sources = match acquire(event, &config) {
            Ok(sources) => sources,
            Err(e) => {
                info!(error = %e, "request ended before processing");
                debug!(phase = ?Phase::Done);
                return Err(e);
            }
        };
        Ok(self.process(sources, config.multiple_image, config).await)
    }

    /// Process already-acquired sources. Never fails as a whole.
    #[instrument(skip_all, fields(items = sources.len(), multiple = multiple))]
    pub async fn process(
        &self,
        sources: Vec<SourceReference>,
        multiple: bool,
        config: Arc<PickerConfig>,
    ) -> BatchResponse {
        debug!(phase = ?Phase::ProcessingItems);
        let outcomes = join_all(
            sources
                .into_iter()
                .enumerate()
                .map(|(index, source)| self.process_item(index, source, Arc::clone(&config))),
        )
        .await;

        debug!(phase = ?Phase::Assembling);
        let response = BatchResponse::assemble(outcomes, multiple);
        info!(
            requested = response.requested_count,
            succeeded = response.success_count,
            "batch complete"
        );
        debug!(phase = ?Phase::Done);
        response
    }

    async fn process_item(
        &self,
        index: usize,
        source: SourceReference,
        config: Arc<PickerConfig>,
    ) -> ItemOutcome {
        match self.run_item(index, &source, config).await {
            Ok(result) => {
                debug!(
                    index,
                    quality = result.quality.value(),
                    attempts = result.attempts,
                    "item done"
                );
                ItemOutcome::Success(result)
            }
            Err(reason) => {
                warn!(index, source = %source.location.display(), error = %reason, "item failed");
                ItemOutcome::Failure(ItemFailure { index, reason })
            }
        }
    }

    async fn run_item(
        &self,
        index: usize,
        source: &SourceReference,
        config: Arc<PickerConfig>,
    ) -> Result<ImageResult, ItemError> {
        let (input, cropped) = if config.crop_enabled {
            (self.crop_step(&source.location, &config).await?, true)
        } else {
            (source.location.clone(), false)
        };

        // The semaphore is never closed.
        let _permit = self.permits.acquire().await.ok();
        let backend = Arc::clone(&self.backend);
        let scratch = Arc::clone(&self.scratch);
        let rendered = tokio::task::spawn_blocking(move || {
            let rendered = render_item(backend.as_ref(), &scratch, &input, &config);
            if cropped {
                if let Err(e) = fs::remove_file(&input) {
                    debug!(path = %input.display(), error = %e, "could not remove crop intermediate");
                }
            }
            rendered
        })
        .await
        .map_err(|e| ItemError::Worker(e.to_string()))??;

        Ok(ImageResult {
            original_index: index,
            display_name: display_name(source, &rendered.location),
            location: rendered.location,
            dimensions: rendered.dimensions,
            size_mb: rendered.size_mb,
            mime_type: rendered.format.mime_type().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            quality: rendered.quality,
            attempts: rendered.attempts,
        })
    }

    async fn crop_step(&self, source: &Path, config: &PickerConfig) -> Result<PathBuf, ItemError> {
        let destination = self.scratch.crop_destination();
        match self.crop.crop(source, destination, config).await? {
            CropOutcome::Completed(location) => Ok(location),
            CropOutcome::Cancelled => Err(ItemError::CropCancelled),
            CropOutcome::Failed(message) => Err(ItemError::CropFailed(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CropType;
    use crate::crop::tests::{Reply, ScriptedSurface};
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use tempfile::TempDir;

    fn result(index: usize) -> ImageResult {
        ImageResult {
            original_index: index,
            location: PathBuf::from(format!("/out/{index}.jpg")),
            dimensions: Dimensions {
                width: 10,
                height: 10,
            },
            size_mb: 0.1,
            mime_type: "image/jpeg".into(),
            display_name: format!("{index}.jpg"),
            timestamp: 0,
            quality: Quality::new(60),
            attempts: 1,
        }
    }

    /// Source files with placeholder bytes; the mock backend ignores content.
    fn sources(dir: &Path, count: usize) -> Vec<SourceReference> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("src_{i}.jpg"));
                fs::write(&path, b"placeholder").unwrap();
                SourceReference::from_path(path)
            })
            .collect()
    }

    fn coordinator(
        dir: &Path,
        backend: MockBackend,
        reply: Reply,
    ) -> (BatchCoordinator<MockBackend>, Arc<ScriptedSurface>) {
        let surface = Arc::new(ScriptedSurface::new(reply));
        let scratch = ScratchDir::new(dir.join("scratch")).unwrap();
        let coordinator =
            BatchCoordinator::new(backend, CropOrchestrator::new(surface.clone()), scratch, 2);
        (coordinator, surface)
    }

    fn no_crop() -> Arc<PickerConfig> {
        Arc::new(PickerConfig {
            crop_enabled: false,
            ..PickerConfig::default()
        })
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    #[test]
    fn assemble_sorts_by_original_index() {
        let outcomes = vec![
            ItemOutcome::Success(result(2)),
            ItemOutcome::Success(result(0)),
            ItemOutcome::Success(result(1)),
        ];
        let response = BatchResponse::assemble(outcomes, true);
        let indices: Vec<_> = response.items.iter().map(|r| r.original_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(response.success_count, 3);
        assert!(!response.has_errors);
        assert!(response.error_message.is_none());
    }

    #[test]
    fn assemble_records_failures_without_dropping_siblings() {
        let outcomes = vec![
            ItemOutcome::Success(result(3)),
            ItemOutcome::Failure(ItemFailure {
                index: 1,
                reason: ItemError::CropCancelled,
            }),
            ItemOutcome::Success(result(0)),
            ItemOutcome::Success(result(2)),
        ];
        let response = BatchResponse::assemble(outcomes, true);
        let indices: Vec<_> = response.items.iter().map(|r| r.original_index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
        assert_eq!(response.requested_count, 4);
        assert_eq!(response.success_count, 3);
        assert!(response.has_errors);
        assert_eq!(response.failures[0].index, 1);
        assert_eq!(response.failures[0].reason.kind(), "UserCancelled");
    }

    #[test]
    fn request_failed_response_shape() {
        let response = BatchResponse::request_failed("Image picker canceled", false);
        assert!(response.items.is_empty());
        assert!(response.has_errors);
        assert_eq!(response.success_count, 0);
        assert_eq!(response.error_message.as_deref(), Some("Image picker canceled"));
    }

    #[test]
    fn display_name_fallbacks() {
        let mut source = SourceReference::from_path("/in/holiday.jpg");
        let output = Path::new("/out/CropImage_1.jpg");
        assert_eq!(display_name(&source, output), "holiday.jpg");

        source.display_name = None;
        assert_eq!(display_name(&source, output), "CropImage_1.jpg");
        assert_eq!(display_name(&source, Path::new("/")), UNKNOWN_FILE_NAME);
    }

    #[test]
    fn item_error_messages() {
        assert_eq!(
            ItemError::CropCancelled.to_string(),
            "User canceled image cropping"
        );
        assert_eq!(
            ItemError::CropLaunch(CropError::Launch("busy".into())).to_string(),
            "Failed to start cropping: busy"
        );
        assert_eq!(ItemError::CropFailed("boom".into()).kind(), "CropError");
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    #[test]
    fn render_rectangular_writes_jpeg_at_start_quality() {
        let tmp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(tmp.path()).unwrap();
        let input = sources(tmp.path(), 1).remove(0).location;
        let backend = MockBackend::new();

        let rendered = render_item(&backend, &scratch, &input, &PickerConfig::default()).unwrap();
        assert_eq!(rendered.format, OutputFormat::Jpeg);
        assert_eq!(rendered.quality.value(), 60);
        assert_eq!(rendered.attempts, 1);
        assert_eq!(
            rendered.dimensions,
            Dimensions {
                width: 64,
                height: 48
            }
        );
        assert_eq!(fs::read(&rendered.location).unwrap().len(), 60 * 1024);
    }

    #[test]
    fn render_scales_oversized_input() {
        let tmp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(tmp.path()).unwrap();
        let input = sources(tmp.path(), 1).remove(0).location;
        let backend = MockBackend::with_dimensions(Dimensions {
            width: 4000,
            height: 3000,
        });

        let rendered = render_item(&backend, &scratch, &input, &PickerConfig::default()).unwrap();
        assert_eq!(
            rendered.dimensions,
            Dimensions {
                width: 1707,
                height: 1280
            }
        );
        assert!(backend.get_operations().contains(&RecordedOp::Resize {
            width: 1707,
            height: 1280
        }));
    }

    #[test]
    fn render_circular_writes_square_png() {
        let tmp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(tmp.path()).unwrap();
        let input = sources(tmp.path(), 1).remove(0).location;
        let backend = MockBackend::new();
        let config = PickerConfig {
            crop_type: CropType::Circular,
            ..PickerConfig::default()
        };

        let rendered = render_item(&backend, &scratch, &input, &config).unwrap();
        assert_eq!(rendered.format, OutputFormat::Png);
        assert_eq!(
            rendered.dimensions,
            Dimensions {
                width: 48,
                height: 48
            }
        );
        assert_eq!(rendered.location.extension().unwrap(), "png");
    }

    #[test]
    fn render_steps_quality_down_for_small_target() {
        let tmp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(tmp.path()).unwrap();
        let input = sources(tmp.path(), 1).remove(0).location;
        let backend = MockBackend::new().with_encode_step(1024 * 1024);
        // 60 MB at quality 60; target 40 MB → 48, then 38 fits.
        let config = PickerConfig {
            max_file_size_mb: 40.0,
            ..PickerConfig::default()
        };

        let rendered = render_item(&backend, &scratch, &input, &config).unwrap();
        assert_eq!(backend.encode_qualities(), vec![60, 48, 38]);
        assert_eq!(rendered.quality.value(), 38);
    }

    #[test]
    fn render_missing_input_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(tmp.path()).unwrap();
        let err = render_item(
            &MockBackend::new(),
            &scratch,
            &tmp.path().join("missing.jpg"),
            &PickerConfig::default(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), "ReadError");
    }

    #[test]
    fn render_undecodable_input_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let scratch = ScratchDir::new(tmp.path()).unwrap();
        let input = tmp.path().join("empty.jpg");
        fs::write(&input, b"").unwrap();

        let err = render_item(&MockBackend::new(), &scratch, &input, &PickerConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ItemError::Decode(_)));
    }

    // =========================================================================
    // Coordinator
    // =========================================================================

    #[tokio::test]
    async fn run_rejects_over_limit_selection_before_processing() {
        let tmp = TempDir::new().unwrap();
        let (coordinator, surface) = coordinator(tmp.path(), MockBackend::new(), Reply::Complete);
        let paths = sources(tmp.path(), 3)
            .into_iter()
            .map(|s| s.location)
            .collect();
        let config = Arc::new(PickerConfig {
            max_images: 2,
            multiple_image: true,
            ..PickerConfig::default()
        });

        let err = coordinator
            .run(SelectionEvent::Multiple(paths), config)
            .await
            .unwrap_err();
        assert_eq!(err, AcquisitionError::TooManyItems { selected: 3, max: 2 });
        assert!(surface.launched().is_empty());
    }

    #[tokio::test]
    async fn process_without_crop_keeps_start_quality() {
        let tmp = TempDir::new().unwrap();
        let (coordinator, surface) = coordinator(tmp.path(), MockBackend::new(), Reply::Complete);

        let response = coordinator
            .process(sources(tmp.path(), 1), false, no_crop())
            .await;
        assert_eq!(response.success_count, 1);
        assert!(!response.has_errors);
        assert_eq!(response.items[0].quality.value(), 60);
        assert_eq!(response.items[0].display_name, "src_0.jpg");
        assert!(surface.launched().is_empty());
    }

    #[tokio::test]
    async fn process_isolates_failing_item() {
        let tmp = TempDir::new().unwrap();
        let (coordinator, _) = coordinator(tmp.path(), MockBackend::new(), Reply::Complete);
        let sources = sources(tmp.path(), 4);
        fs::remove_file(&sources[2].location).unwrap();

        let response = coordinator.process(sources, true, no_crop()).await;
        let indices: Vec<_> = response.items.iter().map(|r| r.original_index).collect();
        assert_eq!(indices, vec![0, 1, 3]);
        assert_eq!(response.success_count, 3);
        assert_eq!(response.requested_count, 4);
        assert!(response.has_errors);
        assert_eq!(response.failures.len(), 1);
        assert_eq!(response.failures[0].index, 2);
    }

    #[tokio::test]
    async fn crop_cancel_fails_only_that_item() {
        let tmp = TempDir::new().unwrap();
        let (coordinator, surface) = coordinator(tmp.path(), MockBackend::new(), Reply::Cancel);

        let response = coordinator
            .process(sources(tmp.path(), 2), true, Arc::new(PickerConfig::default()))
            .await;
        assert_eq!(surface.launched().len(), 2);
        assert_eq!(response.success_count, 0);
        assert!(response.has_errors);
        assert!(
            response
                .failures
                .iter()
                .all(|f| matches!(f.reason, ItemError::CropCancelled))
        );
        assert!(response.error_message.is_none());
    }

    #[tokio::test]
    async fn crop_surface_error_is_item_failure() {
        let tmp = TempDir::new().unwrap();
        let (coordinator, _) = coordinator(
            tmp.path(),
            MockBackend::new(),
            Reply::Fail("crop view crashed".into()),
        );

        let response = coordinator
            .process(sources(tmp.path(), 1), false, Arc::new(PickerConfig::default()))
            .await;
        assert_eq!(response.failures[0].reason.to_string(), "crop view crashed");
        assert_eq!(response.failures[0].reason.kind(), "CropError");
    }

    #[tokio::test]
    async fn cropped_intermediate_is_removed() {
        let tmp = TempDir::new().unwrap();
        let (coordinator, surface) = coordinator(tmp.path(), MockBackend::new(), Reply::Complete);

        let response = coordinator
            .process(sources(tmp.path(), 1), false, Arc::new(PickerConfig::default()))
            .await;
        assert_eq!(response.success_count, 1);
        let destination = &surface.launched()[0].destination;
        assert!(!destination.exists());
        assert!(response.items[0].location.exists());
    }

    #[tokio::test]
    async fn mask_applies_when_circular_even_without_crop() {
        let tmp = TempDir::new().unwrap();
        let (coordinator, _) = coordinator(tmp.path(), MockBackend::new(), Reply::Complete);
        let config = Arc::new(PickerConfig {
            crop_enabled: false,
            crop_type: CropType::Circular,
            ..PickerConfig::default()
        });

        let response = coordinator
            .process(sources(tmp.path(), 1), false, config)
            .await;
        let item = &response.items[0];
        assert_eq!(item.mime_type, "image/png");
        assert_eq!(item.dimensions.width, item.dimensions.height);
    }

    #[tokio::test]
    async fn results_follow_selection_order_not_crop_order() {
        let tmp = TempDir::new().unwrap();
        let (coordinator, surface) = coordinator(tmp.path(), MockBackend::new(), Reply::Defer);
        let coordinator = Arc::new(coordinator);
        let config = Arc::new(PickerConfig::default());
        let sources = sources(tmp.path(), 3);

        let run = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.process(sources, true, config).await })
        };
        while surface.launched().len() < 3 {
            tokio::task::yield_now().await;
        }
        for request in surface.launched().iter().rev() {
            fs::copy(&request.source, &request.destination).unwrap();
            coordinator
                .crop_orchestrator()
                .pending()
                .resolve(
                    request.token,
                    CropOutcome::Completed(request.destination.clone()),
                )
                .unwrap();
        }

        let response = run.await.unwrap();
        let names: Vec<_> = response
            .items
            .iter()
            .map(|r| r.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["src_0.jpg", "src_1.jpg", "src_2.jpg"]);
    }
}
