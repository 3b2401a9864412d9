//! Detection of companion executables next to the mods root.
//!
//! - The mod fixer (`genshin_update_mods_*.exe`) may sit in the enabled root or
//!   its parent. When found, launching it is handed to the OS shell.
//! - A 3DMigoto loader directory (`3DMigoto Loader.exe` beside a `Mods`
//!   folder) provides a default root when none is configured.
//!
//! # Examples
//!
//! ```ignore
//! use modswitch::services::fixer::{find_fixer, detect_default_root};
//!
//! if let Some(fixer) = find_fixer(&layout)? {
//!     launch_fixer(&fixer)?;
//! }
//! let root = detect_default_root(Utf8Path::new("."));
//! ```

use crate::models::ModLayout;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::fs;
use std::sync::LazyLock;

/// Loader executable that marks a 3DMigoto install directory
pub const LOADER_EXE_NAME: &str = "3DMigoto Loader.exe";

/// Mods directory inside a 3DMigoto install
pub const LOADER_MODS_DIR: &str = "Mods";

static FIXER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^genshin_update_mods_.*\.exe$").expect("Invalid fixer regex")
});

/// Whether a file name looks like the mod fixer executable.
pub fn is_fixer_name(file_name: &str) -> bool {
    FIXER_PATTERN.is_match(file_name)
}

fn find_fixer_in(dir: &Utf8Path) -> Result<Option<Utf8PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut matches = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir))? {
        let entry = entry.with_context(|| format!("Failed to read entry in: {}", dir))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if is_fixer_name(&name) && entry.path().is_file() {
            matches.push(dir.join(name));
        }
    }

    matches.sort();
    Ok(matches.into_iter().next())
}

/// Locate the fixer executable, looking in the enabled root first and then its parent.
pub fn find_fixer(layout: &ModLayout) -> Result<Option<Utf8PathBuf>> {
    let root = layout.enabled_root();
    if let Some(found) = find_fixer_in(root)? {
        tracing::info!("Found mod fixer: {}", found);
        return Ok(Some(found));
    }

    if let Some(parent) = root.parent() {
        if let Some(found) = find_fixer_in(parent)? {
            tracing::info!("Found mod fixer: {}", found);
            return Ok(Some(found));
        }
    }

    tracing::debug!("No mod fixer found near {}", root);
    Ok(None)
}

/// Hand the fixer to the OS shell. Does not wait for it to exit.
pub fn launch_fixer(path: &Utf8Path) -> Result<()> {
    tracing::info!("Launching mod fixer: {}", path);
    opener::open(path.as_std_path()).with_context(|| format!("Failed to launch {}", path))
}

/// Use `<dir>/Mods` as the root when `dir` holds a 3DMigoto loader.
pub fn detect_default_root(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let mods = dir.join(LOADER_MODS_DIR);
    if dir.join(LOADER_EXE_NAME).is_file() && mods.is_dir() {
        tracing::info!("Detected 3DMigoto mods folder: {}", mods);
        Some(mods)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixer_name_pattern() {
        assert!(is_fixer_name("genshin_update_mods_4.0.exe"));
        assert!(is_fixer_name("GENSHIN_UPDATE_MODS_v2.EXE"));
        assert!(!is_fixer_name("genshin_update_mods_4.0.zip"));
        assert!(!is_fixer_name("old_genshin_update_mods_1.exe"));
    }
}
