// ModSwitch - Toggle game mod folders between enabled, disabled and broken roots
//
// This is the library crate containing the core logic and data structures.
// The binary crate (main.rs) provides the command-line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AppState, ModFolder, ModLayout, ModState, Preset, PresetDocument, UserConfig};
pub use state::{StateChange, StateManager};
pub use ui::{ApplyReport, ModController};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
