//! Selection and capture surfaces backed by the local filesystem.
//!
//! These stand in for a picker UI and a camera when running from the
//! command line: the "user" has already chosen files on the command line.

use crate::api::{CaptureSurface, SelectionSurface};
use crate::imaging::is_supported_image;
use crate::source::{CaptureOutcome, SelectionEvent};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Expand command-line paths into image files.
///
/// Files are kept as given, in order. Directories are walked recursively and
/// contribute their supported images sorted by path.
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| is_supported_image(p))
                .collect();
            found.sort();
            images.extend(found);
        } else {
            images.push(path.clone());
        }
    }
    images
}

/// A picker whose selection was made up front.
pub struct FileListSelection {
    paths: Vec<PathBuf>,
}

impl FileListSelection {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Paths a single-image selection drops.
    pub fn ignored(&self, multiple: bool) -> &[PathBuf] {
        match (multiple, self.paths.split_first()) {
            (false, Some((_, rest))) => rest,
            _ => &[],
        }
    }
}

impl SelectionSurface for FileListSelection {
    fn select(&self, multiple: bool) -> BoxFuture<'_, SelectionEvent> {
        let ignored = self.ignored(multiple);
        if !ignored.is_empty() {
            warn!(
                ignored = ignored.len(),
                "single-image mode: only the first path is used (pass --multiple for all)"
            );
        }
        let event = match (multiple, self.paths.first()) {
            (_, None) => SelectionEvent::Cancelled,
            (true, Some(_)) => SelectionEvent::Multiple(self.paths.clone()),
            (false, Some(first)) => SelectionEvent::Single(Some(first.clone())),
        };
        futures::future::ready(event).boxed()
    }
}

/// A "camera" that captures by copying an existing photo.
pub struct FileCamera {
    photo: PathBuf,
}

impl FileCamera {
    pub fn new(photo: impl Into<PathBuf>) -> Self {
        Self {
            photo: photo.into(),
        }
    }

    fn copy_into(&self, target: &Path) -> CaptureOutcome {
        match std::fs::copy(&self.photo, target) {
            Ok(_) => CaptureOutcome::Captured,
            Err(e) => CaptureOutcome::Failed(e.to_string()),
        }
    }
}

impl CaptureSurface for FileCamera {
    fn is_available(&self) -> bool {
        self.photo.is_file()
    }

    fn capture(&self, target: PathBuf) -> BoxFuture<'_, CaptureOutcome> {
        futures::future::ready(self.copy_into(&target)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn collect_walks_directories_in_sorted_order() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("photos");
        touch(&dir.join("b.jpg"));
        touch(&dir.join("a.png"));
        touch(&dir.join("nested/c.webp"));
        touch(&dir.join("notes.txt"));

        let images = collect_images(&[dir.clone()]);
        assert_eq!(
            images,
            vec![dir.join("a.png"), dir.join("b.jpg"), dir.join("nested/c.webp")]
        );
    }

    #[test]
    fn collect_keeps_explicit_files_in_given_order() {
        let tmp = TempDir::new().unwrap();
        let z = tmp.path().join("z.jpg");
        let a = tmp.path().join("a.jpg");
        touch(&z);
        touch(&a);

        assert_eq!(collect_images(&[z.clone(), a.clone()]), vec![z, a]);
    }

    #[tokio::test]
    async fn selection_respects_multiple_flag() {
        let surface = FileListSelection::new(vec![PathBuf::from("1.jpg"), PathBuf::from("2.jpg")]);
        assert_eq!(
            surface.select(false).await,
            SelectionEvent::Single(Some(PathBuf::from("1.jpg")))
        );
        assert_eq!(
            surface.select(true).await,
            SelectionEvent::Multiple(vec![PathBuf::from("1.jpg"), PathBuf::from("2.jpg")])
        );
    }

    #[test]
    fn single_mode_reports_dropped_paths() {
        let surface = FileListSelection::new(vec![
            PathBuf::from("1.jpg"),
            PathBuf::from("2.jpg"),
            PathBuf::from("3.jpg"),
        ]);
        assert_eq!(
            surface.ignored(false),
            &[PathBuf::from("2.jpg"), PathBuf::from("3.jpg")]
        );
        assert!(surface.ignored(true).is_empty());
        assert!(FileListSelection::new(Vec::new()).ignored(false).is_empty());
    }

    #[tokio::test]
    async fn empty_selection_is_cancelled() {
        let surface = FileListSelection::new(Vec::new());
        assert_eq!(surface.select(true).await, SelectionEvent::Cancelled);
    }

    #[tokio::test]
    async fn file_camera_copies_photo() {
        let tmp = TempDir::new().unwrap();
        let photo = tmp.path().join("photo.jpg");
        touch(&photo);
        let camera = FileCamera::new(&photo);
        assert!(camera.is_available());

        let target = tmp.path().join("capture.jpg");
        assert_eq!(camera.capture(target.clone()).await, CaptureOutcome::Captured);
        assert_eq!(fs::read(&target).unwrap(), b"x");
    }

    #[test]
    fn missing_photo_means_no_camera() {
        assert!(!FileCamera::new("/nonexistent/photo.jpg").is_available());
    }
}
