//! Services module - Filesystem logic for mod folders and presets.
//!
//! The services are framework-agnostic and hold no application state; the
//! controller owns the state table and calls into them.
//!
//! # Components
//!
//! - [`classifier`]: scans the enabled/disabled/broken roots and tags each mod
//!   with its state, reporting names found in two roots as conflicts.
//! - [`mover`]: relocates one folder between roots. [`MoveService`] runs each
//!   move as its own tokio task and reports a [`MoveOutcome`] over a channel.
//!   Also renames folders in place.
//! - [`presets`]: the JSON preset document, rewritten wholesale through a temp
//!   file on every mutation.
//! - [`metadata`]: reads `key = value` hotkey bindings from a mod's config file.
//! - [`fixer`]: finds the fixer executable and the default 3DMigoto mods root.
//!
//! # Usage Example
//!
//! ```ignore
//! use modswitch::services::{classify, MoveRequest, MoveService};
//!
//! let classification = classify(&layout)?;
//! let (service, mut reports) = MoveService::new(runtime.handle().clone());
//! service.dispatch(layout.clone(), MoveRequest::disable("SomeMod"));
//! let report = reports.recv().await;
//! ```

pub mod classifier;
pub mod fixer;
pub mod metadata;
pub mod mover;
pub mod presets;

pub use classifier::{Classification, classify, list_mod_dirs};
pub use fixer::{detect_default_root, find_fixer, launch_fixer};
pub use metadata::MetadataReader;
pub use mover::{
    MoveError, MoveOutcome, MoveReport, MoveRequest, MoveService, move_folder, rename_folder,
    run_move, validate_folder_name,
};
pub use presets::{PresetError, PresetStore};
