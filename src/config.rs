//! Picker options: defaults, lenient resolution, and options-file loading.
//!
//! Every request runs against one immutable [`PickerConfig`] snapshot. A
//! snapshot is rebuilt from scratch on each `configure` call: caller values
//! are laid over the stock defaults and the previous snapshot is discarded,
//! never merged into.
//!
//! ## Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! cropEnabled = true             # Route each image through the crop surface
//! cropType = "rectangular"       # "rectangular" or "circular"
//! freeStyleCropEnabled = false   # Let the user change the crop aspect ratio
//! showCropFrame = false
//! showCropGrid = false
//! dimmedLayerColor = "#99000000" # #AARRGGBB or #RRGGBB
//! imageQuality = 60              # Starting JPEG quality (1-100)
//! multipleImage = false          # Allow multi-selection in the picker
//! maxImages = 50                 # Upper bound on a multi-selection
//! maxWidth = 1920                # Output bounding box, pixels
//! maxHeight = 1280
//! maxFileSize = 10.0             # Output size target, megabytes
//! ```
//!
//! ## Leniency
//!
//! The bridge hands us a dynamically typed map. A value of the wrong type or
//! outside its range never fails the call; that one option falls back to its
//! default. Options files are stricter about key names: unknown keys are
//! rejected to catch typos early.

use crate::imaging::Quality;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Option keys understood by [`resolve`].
pub const OPTION_KEYS: &[&str] = &[
    "cropEnabled",
    "cropType",
    "freeStyleCropEnabled",
    "showCropFrame",
    "showCropGrid",
    "dimmedLayerColor",
    "imageQuality",
    "multipleImage",
    "maxImages",
    "maxWidth",
    "maxHeight",
    "maxFileSize",
];

/// Shape of the crop and of the final output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CropType {
    #[default]
    Rectangular,
    /// 1:1 crop, then a circular alpha mask on the output.
    Circular,
}

impl FromStr for CropType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rectangular" => Ok(Self::Rectangular),
            "circular" => Ok(Self::Circular),
            other => Err(ConfigError::Validation(format!(
                "unknown cropType '{other}'"
            ))),
        }
    }
}

/// A packed `0xAARRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argb(pub u32);

impl Argb {
    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }
}

impl FromStr for Argb {
    type Err = ConfigError;

    /// Parses `#RRGGBB` (opaque) or `#AARRGGBB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::Validation(format!("invalid color '{s}'"));
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        match hex.len() {
            6 => Ok(Self(0xFF00_0000 | value)),
            8 => Ok(Self(value)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// Immutable per-request configuration snapshot.
///
/// Every field always holds a value; see the [module docs](self) for defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct PickerConfig {
    pub crop_enabled: bool,
    pub crop_type: CropType,
    pub free_style_crop: bool,
    pub show_crop_frame: bool,
    pub show_crop_grid: bool,
    pub dimmed_layer_color: Argb,
    /// Starting quality for the compression loop.
    pub image_quality: Quality,
    pub multiple_image: bool,
    pub max_images: usize,
    pub max_width: u32,
    pub max_height: u32,
    /// Output size target in megabytes (best effort).
    pub max_file_size_mb: f64,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            crop_enabled: true,
            crop_type: CropType::Rectangular,
            free_style_crop: false,
            show_crop_frame: false,
            show_crop_grid: false,
            dimmed_layer_color: Argb(0x9900_0000),
            image_quality: Quality::new(60),
            multiple_image: false,
            max_images: 50,
            max_width: 1920,
            max_height: 1280,
            max_file_size_mb: 10.0,
        }
    }
}

impl PickerConfig {
    pub fn is_circular(&self) -> bool {
        self.crop_type == CropType::Circular
    }

    /// Options as the bridge would send them (camelCase keys).
    pub fn to_options(&self) -> Value {
        serde_json::json!({
            "cropEnabled": self.crop_enabled,
            "cropType": match self.crop_type {
                CropType::Rectangular => "rectangular",
                CropType::Circular => "circular",
            },
            "freeStyleCropEnabled": self.free_style_crop,
            "showCropFrame": self.show_crop_frame,
            "showCropGrid": self.show_crop_grid,
            "dimmedLayerColor": self.dimmed_layer_color.to_string(),
            "imageQuality": self.image_quality.value(),
            "multipleImage": self.multiple_image,
            "maxImages": self.max_images,
            "maxWidth": self.max_width,
            "maxHeight": self.max_height,
            "maxFileSize": self.max_file_size_mb,
        })
    }
}

// =============================================================================
// Lenient field readers
// =============================================================================

fn read_bool(map: &Map<String, Value>, key: &str, default: bool) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Numbers and numeric strings both coerce; anything else is `None`.
fn read_number(map: &Map<String, Value>, key: &str) -> Option<f64> {
    let n = match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Integer option, truncated toward zero; must be strictly positive.
fn read_positive_int<T: TryFrom<i64>>(map: &Map<String, Value>, key: &str, default: T) -> T {
    read_number(map, key)
        .map(|n| n.trunc() as i64)
        .filter(|n| *n > 0)
        .and_then(|n| T::try_from(n).ok())
        .unwrap_or(default)
}

fn read_parsed<T: FromStr>(map: &Map<String, Value>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Build a full configuration snapshot from caller overrides.
///
/// Anything that is not a JSON object resolves to pure defaults.
pub fn resolve(overrides: &Value) -> PickerConfig {
    let defaults = PickerConfig::default();
    let Some(map) = overrides.as_object() else {
        return defaults;
    };

    let image_quality = read_number(map, "imageQuality")
        .map(|n| Quality::new(n.trunc().clamp(0.0, u32::MAX as f64) as u32))
        .unwrap_or(defaults.image_quality);

    let max_file_size_mb = read_number(map, "maxFileSize")
        .filter(|n| *n > 0.0)
        .unwrap_or(defaults.max_file_size_mb);

    PickerConfig {
        crop_enabled: read_bool(map, "cropEnabled", defaults.crop_enabled),
        crop_type: read_parsed(map, "cropType", defaults.crop_type),
        free_style_crop: read_bool(map, "freeStyleCropEnabled", defaults.free_style_crop),
        show_crop_frame: read_bool(map, "showCropFrame", defaults.show_crop_frame),
        show_crop_grid: read_bool(map, "showCropGrid", defaults.show_crop_grid),
        dimmed_layer_color: read_parsed(map, "dimmedLayerColor", defaults.dimmed_layer_color),
        image_quality,
        multiple_image: read_bool(map, "multipleImage", defaults.multiple_image),
        max_images: read_positive_int(map, "maxImages", defaults.max_images),
        max_width: read_positive_int(map, "maxWidth", defaults.max_width),
        max_height: read_positive_int(map, "maxHeight", defaults.max_height),
        max_file_size_mb,
    }
}

// =============================================================================
// Options files
// =============================================================================

/// Parse TOML options text into a bridge-style override map.
///
/// Rejects keys that [`resolve`] would silently ignore.
pub fn parse_options_toml(content: &str) -> Result<Value, ConfigError> {
    let table: toml::Table = toml::from_str(content)?;
    let unknown: Vec<&str> = table
        .keys()
        .map(String::as_str)
        .filter(|k| !OPTION_KEYS.contains(k))
        .collect();
    if !unknown.is_empty() {
        return Err(ConfigError::Validation(format!(
            "unknown option(s): {}",
            unknown.join(", ")
        )));
    }
    serde_json::to_value(table).map_err(|e| ConfigError::Validation(e.to_string()))
}

/// Load an options file and resolve it over the stock defaults.
pub fn load_options_file(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_options_toml(&content)
}

/// Returns a fully-commented stock options file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_options_toml() -> &'static str {
    r##"# cropflow options
# ================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Cropping
# ---------------------------------------------------------------------------
# Send every selected image through the crop step.
cropEnabled = true

# "rectangular" or "circular". Circular forces a 1:1 crop and writes the
# result as a PNG with everything outside the inscribed circle transparent.
cropType = "rectangular"

# Let the user change the crop aspect ratio (ignored for circular crops).
freeStyleCropEnabled = false

showCropFrame = false
showCropGrid = false

# Overlay color outside the crop area, #AARRGGBB or #RRGGBB.
dimmedLayerColor = "#99000000"

# ---------------------------------------------------------------------------
# Selection
# ---------------------------------------------------------------------------
multipleImage = false

# Selections larger than this are rejected before any processing.
maxImages = 50

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
# Starting JPEG quality (1-100). Lowered step by step when the output is
# larger than maxFileSize.
imageQuality = 60

# Bounding box in pixels. Larger images are scaled down, never up.
maxWidth = 1920
maxHeight = 1280

# Size target in megabytes (best effort).
maxFileSize = 10.0
"##
}

/// Resolve the effective worker count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(requested: Option<usize>) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested.map(|n| n.clamp(1, cores)).unwrap_or(cores)
}
