//! Folder state classification.
//!
//! Scans the enabled and disabled roots of a [`ModLayout`] and tags every mod
//! directory with its [`ModState`]. Anything also present in the broken root is
//! left out, and names found in both the enabled and disabled roots are
//! reported separately as conflicts.

use crate::models::{ModFolder, ModLayout, ModState, SortOrder};
use anyhow::{Context, Result};
use camino::Utf8Path;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::time::SystemTime;

/// Result of scanning a layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Mods present in exactly one of the enabled/disabled roots, sorted by name
    pub folders: Vec<ModFolder>,
    /// Names present in both the enabled and disabled roots
    pub conflicts: Vec<String>,
}

impl Classification {
    pub fn names_in(&self, state: ModState) -> Vec<String> {
        self.folders
            .iter()
            .filter(|f| f.state == state)
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn state_of(&self, name: &str) -> Option<ModState> {
        self.folders.iter().find(|f| f.name == name).map(|f| f.state)
    }
}

/// List the immediate subdirectories of `root` with their creation time.
///
/// A missing root is treated as empty. Entries whose names are not valid
/// UTF-8 are skipped with a warning.
pub fn list_mod_dirs(root: &Utf8Path) -> Result<BTreeMap<String, Option<SystemTime>>> {
    let mut dirs = BTreeMap::new();

    if !root.is_dir() {
        tracing::debug!("Root does not exist, treating as empty: {}", root);
        return Ok(dirs);
    }

    let entries =
        fs::read_dir(root).with_context(|| format!("Failed to read directory: {}", root))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in: {}", root))?;
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry {:?}: {}", entry.path(), e);
                continue;
            }
        };
        if !metadata.is_dir() {
            continue;
        }

        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!("Skipping non UTF-8 folder name in {}", root);
            continue;
        };

        let created = metadata.created().or_else(|_| metadata.modified()).ok();
        dirs.insert(name, created);
    }

    Ok(dirs)
}

/// Classify every mod of the layout.
pub fn classify(layout: &ModLayout) -> Result<Classification> {
    let enabled = list_mod_dirs(layout.enabled_root())?;
    let disabled = list_mod_dirs(layout.disabled_root())?;
    let broken: BTreeSet<String> = list_mod_dirs(layout.broken_root())?.into_keys().collect();

    let mut folders = Vec::with_capacity(enabled.len() + disabled.len());
    let mut conflicts = Vec::new();

    for (name, created) in &enabled {
        if broken.contains(name) {
            continue;
        }
        if disabled.contains_key(name) {
            tracing::warn!(
                "Mod '{}' exists in both {} and {}; leaving it unclassified",
                name,
                layout.enabled_root(),
                layout.disabled_root()
            );
            conflicts.push(name.clone());
            continue;
        }
        folders.push(ModFolder::new(name.clone(), ModState::Enabled).with_created(*created));
    }

    for (name, created) in &disabled {
        if broken.contains(name) || enabled.contains_key(name) {
            continue;
        }
        folders.push(ModFolder::new(name.clone(), ModState::Disabled).with_created(*created));
    }

    folders.sort_by(|a, b| SortOrder::Name.compare(a, b));

    tracing::debug!(
        "Classified {} mods ({} conflicts, {} broken) under {}",
        folders.len(),
        conflicts.len(),
        broken.len(),
        layout.enabled_root()
    );

    Ok(Classification { folders, conflicts })
}
