//! Shared scratch directory for intermediate and final outputs.
//!
//! Every item in a batch writes here concurrently, so every path handed out
//! is unique: a process-wide counter plus the process id make up the suffix,
//! and timestamps are only for humans.
//!
//! | Purpose | Name |
//! |---|---|
//! | Camera capture target | `JPEG_<yyyyMMdd_HHmmss>_<unique>.jpg` |
//! | Crop destination | `cropped_<unique>.jpg` |
//! | Final output | `CropImage_<yyyyMMdd_HHmmss_SSS>_<unique>.<ext>` |

use crate::imaging::OutputFormat;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn unique_suffix() -> String {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}{:06}", std::process::id(), id)
}

#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Use `root` as the scratch area, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: String) -> PathBuf {
        self.root.join(name)
    }

    /// Create an empty file for a camera capture to fill in.
    ///
    /// The file exists on return; `create_new` guarantees nobody else owns it.
    pub fn create_capture_file(&self) -> io::Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self.path(format!("JPEG_{stamp}_{}.jpg", unique_suffix()));
        OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok(path)
    }

    pub fn crop_destination(&self) -> PathBuf {
        self.path(format!("cropped_{}.jpg", unique_suffix()))
    }

    pub fn output_path(&self, format: OutputFormat) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        self.path(format!(
            "CropImage_{stamp}_{}.{}",
            unique_suffix(),
            format.extension()
        ))
    }
}
