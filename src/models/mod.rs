//! Data models for ModSwitch.
//!
//! - [`AppState`]: the folder-state table, in-flight moves and view settings
//! - [`ModFolder`] / [`ModState`]: a mod directory and the root that holds it
//! - [`ModLayout`]: the enabled, disabled and broken roots derived from one enabled root
//! - [`Preset`] / [`PresetDocument`]: named snapshots persisted as JSON
//! - [`UserConfig`]: settings loaded from `ModSwitch Settings.yaml`

pub mod app_state;
pub mod config;
pub mod mod_folder;
pub mod preset;

pub use app_state::AppState;
pub use config::{ModSwitchSettings, UserConfig};
pub use mod_folder::{
    BROKEN_DIR_NAME, DISABLED_DIR_NAME, ModFolder, ModLayout, ModState, SortOrder, StateFilter,
    filter_folders,
};
pub use preset::{Preset, PresetDocument, RootPresets};
