//! # cropflow
//!
//! Acquire images from a picker or camera, optionally crop them and cut a
//! circle out of them, then compress each one toward a size budget. Every
//! request ends in one ordered response describing every image it touched.
//!
//! # Architecture: Acquire, Then Fan Out
//!
//! ```text
//! configure(options)  →  PickerConfig snapshot (Arc, immutable)
//!
//! pick_image / capture_image
//!   1. Acquire     selection/capture  →  Vec<SourceReference>   (request may fail here)
//!   2. Per item    crop → mask → scale to fit → compress        (items fail alone)
//!   3. Assemble    outcomes           →  BatchResponse          (sorted by original index)
//! ```
//!
//! Step 1 is the only place a request as a whole can fail: a cancelled picker,
//! an over-limit selection, no camera, or a capture file that could not be
//! created. From step 2 on, an error belongs to its item and is reported next
//! to the successes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Options with defaults, lenient resolution from a JSON map, TOML options files |
//! | [`source`] | Normalizes picker and capture results into ordered source references |
//! | [`crop`] | Hands items to a crop surface and resumes them by correlation token |
//! | [`imaging`] | Codec backend, scale-to-fit, circular mask, compression loop |
//! | [`pipeline`] | Per-item pipeline, bounded fan-out, ordered `BatchResponse` |
//! | [`api`] | `ImagePicker` request API and the bridge JSON schema |
//! | [`scratch`] | Collision-free file names in the shared scratch directory |
//! | [`local`] | Filesystem-backed selection and capture surfaces for the CLI |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Crop Results Arrive Out of Band
//!
//! An interactive crop UI answers on its own schedule and through its own
//! entry point. Each launch registers a oneshot channel under a fresh token;
//! the UI's result handler resolves the token, and only the item that owns it
//! resumes. Items waiting on a crop hold no thread.
//!
//! ## Per-Item State, Merged Once
//!
//! Items never write to shared counters or lists. Each produces its own
//! `ItemOutcome` tagged with its original index, and the coordinator sorts
//! and counts them in one place at the end. Completion order does not matter.
//!
//! ## Best-Effort Size Budget
//!
//! JPEG quality steps down by 20% per attempt, to a floor of 10, for at most
//! five attempts. If the budget is still not met the smallest encode wins;
//! missing the target is not an error. Circular output is PNG, so its alpha
//! survives and quality has nothing to trade.

pub mod api;
pub mod config;
pub mod crop;
pub mod imaging;
pub mod local;
pub mod output;
pub mod pipeline;
pub mod scratch;
pub mod source;
