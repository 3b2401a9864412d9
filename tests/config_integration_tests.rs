//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Configuration loading and saving
//! - Default configuration generation
//! - Preset path resolution
//! - Integration with StateManager

use camino::Utf8PathBuf;
use modswitch::config::USER_CONFIG_FILE;
use modswitch::{ConfigManager, StateManager, UserConfig};
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(
        manager.user_config_path(),
        &config_path.join(USER_CONFIG_FILE)
    );
}

#[test]
fn test_creates_missing_config_dir() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let nested = config_path.join("ModSwitch Data");

    ConfigManager::new(&nested).unwrap();

    assert!(nested.is_dir());
}

#[test]
fn test_load_default_user_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    // User config file doesn't exist, should return defaults
    let user_config = manager.load_user_config().unwrap();

    assert!(user_config.root_path().is_none());
    assert!(!user_config.settings.auto_refresh);
    assert!(!user_config.settings.broken_confirmation_shown);
    assert_eq!(user_config.settings.refresh_interval_ms, 1000);
    assert_eq!(user_config.settings.presets_file, "mod_presets.json");
    assert_eq!(user_config.settings.metadata_file, "mod.ini");
}

#[test]
fn test_save_and_reload_user_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = UserConfig::default();
    config.settings.root_path = "/games/3dmigoto/Mods".to_string();
    config.settings.auto_refresh = true;
    config.settings.refresh_interval_ms = 2500;
    config.settings.broken_confirmation_shown = true;
    manager.save_user_config(&config).unwrap();

    let loaded = manager.load_user_config().unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.root_path(), Some("/games/3dmigoto/Mods"));
}

#[test]
fn test_partial_user_config_uses_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let yaml = r#"
ModSwitch_Settings:
  Root Path: "/games/Mods"
"#;
    fs::write(manager.user_config_path(), yaml).unwrap();

    let loaded = manager.load_user_config().unwrap();
    assert_eq!(loaded.root_path(), Some("/games/Mods"));
    assert!(!loaded.settings.broken_confirmation_shown);
    assert_eq!(loaded.settings.refresh_interval_ms, 1000);
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.user_config_path(), "ModSwitch_Settings: [unclosed").unwrap();

    let result = manager.load_user_config();
    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("Failed to parse user config"));
}

#[test]
fn test_presets_path_resolution() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = UserConfig::default();
    assert_eq!(
        manager.presets_path(&config),
        config_path.join("mod_presets.json")
    );

    let absolute = config_path.join("elsewhere").join("presets.json");
    config.settings.presets_file = absolute.to_string();
    assert_eq!(manager.presets_path(&config), absolute);
}

#[test]
fn test_config_integration_with_state_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = UserConfig::default();
    config.settings.auto_refresh = true;
    manager.save_user_config(&config).unwrap();

    let state = StateManager::new();
    state.load_from_user_config(&manager.load_user_config().unwrap());

    assert!(state.read(|s| s.auto_refresh));
}
