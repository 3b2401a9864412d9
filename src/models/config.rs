use serde::{Deserialize, Serialize};

/// User configuration from ModSwitch Settings.yaml
///
/// Persisted once on exit and loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "ModSwitch_Settings", default)]
    pub settings: ModSwitchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModSwitchSettings {
    /// Last used enabled-mods root
    #[serde(rename = "Root Path", default)]
    pub root_path: String,

    #[serde(rename = "Auto Refresh", default)]
    pub auto_refresh: bool,

    #[serde(rename = "Refresh Interval MS", default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Set once the user has accepted the mark-as-broken prompt
    #[serde(rename = "Broken Confirmation Shown", default)]
    pub broken_confirmation_shown: bool,

    #[serde(rename = "Presets File", default = "default_presets_file")]
    pub presets_file: String,

    #[serde(rename = "Metadata File", default = "default_metadata_file")]
    pub metadata_file: String,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,
}

impl Default for ModSwitchSettings {
    fn default() -> Self {
        Self {
            root_path: String::new(),
            auto_refresh: false,
            refresh_interval_ms: default_refresh_interval_ms(),
            broken_confirmation_shown: false,
            presets_file: default_presets_file(),
            metadata_file: default_metadata_file(),
            debug_mode: false,
        }
    }
}

fn default_refresh_interval_ms() -> u64 {
    1000
}

fn default_presets_file() -> String {
    "mod_presets.json".to_string()
}

fn default_metadata_file() -> String {
    "mod.ini".to_string()
}

impl UserConfig {
    /// Configured root, if any
    pub fn root_path(&self) -> Option<&str> {
        let root = self.settings.root_path.trim();
        (!root.is_empty()).then_some(root)
    }
}
