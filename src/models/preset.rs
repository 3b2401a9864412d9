use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declarative snapshot of which mods belong in each root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl Preset {
    pub fn new(enabled: Vec<String>, disabled: Vec<String>) -> Self {
        Self { enabled, disabled }
    }

    /// Total number of names referenced by this preset
    pub fn len(&self) -> usize {
        self.enabled.len() + self.disabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty() && self.disabled.is_empty()
    }

    pub fn references(&self, name: &str) -> bool {
        self.enabled.iter().chain(&self.disabled).any(|n| n == name)
    }

    /// Replace `old` with `new`, keeping the position and list of `old`.
    ///
    /// Entries already naming `new` refer to a folder that no longer exists
    /// under that name and are dropped, so each name appears at most once.
    /// Returns true if anything changed.
    pub fn rename_reference(&mut self, old: &str, new: &str) -> bool {
        if old == new || !self.references(old) {
            return false;
        }

        self.enabled.retain(|n| n != new);
        self.disabled.retain(|n| n != new);

        let mut renamed = false;
        for list in [&mut self.enabled, &mut self.disabled] {
            list.retain_mut(|entry| {
                if entry.as_str() != old {
                    return true;
                }
                if renamed {
                    return false;
                }
                renamed = true;
                *entry = new.to_string();
                true
            });
        }
        true
    }
}

/// Presets of a single root, keyed by preset name.
pub type RootPresets = IndexMap<String, Preset>;

/// The whole on-disk preset document: root path -> preset name -> preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetDocument {
    pub roots: IndexMap<String, RootPresets>,
}

impl PresetDocument {
    pub fn get(&self, root: &str, name: &str) -> Option<&Preset> {
        self.roots.get(root).and_then(|presets| presets.get(name))
    }

    /// Insert or overwrite a preset
    pub fn insert(&mut self, root: &str, name: &str, preset: Preset) {
        self.roots
            .entry(root.to_string())
            .or_default()
            .insert(name.to_string(), preset);
    }

    /// Remove a preset, keeping the order of the remaining ones
    pub fn remove(&mut self, root: &str, name: &str) -> Option<Preset> {
        self.roots
            .get_mut(root)
            .and_then(|presets| presets.shift_remove(name))
    }

    pub fn names(&self, root: &str) -> Vec<String> {
        self.roots
            .get(root)
            .map(|presets| presets.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Rename a mod in every preset under `root`.
    ///
    /// Returns the number of presets touched.
    pub fn rename_references(&mut self, root: &str, old: &str, new: &str) -> usize {
        self.roots
            .get_mut(root)
            .map(|presets| {
                presets
                    .values_mut()
                    .map(|preset| preset.rename_reference(old, new))
                    .filter(|changed| *changed)
                    .count()
            })
            .unwrap_or(0)
    }
}
