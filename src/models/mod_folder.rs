use anyhow::{Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// Sibling directory holding disabled mods.
pub const DISABLED_DIR_NAME: &str = "disabledMods";

/// Sibling directory holding quarantined mods.
pub const BROKEN_DIR_NAME: &str = "brokenMods";

/// Which root currently holds a mod folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModState {
    Enabled,
    Disabled,
    Broken,
}

impl ModState {
    /// The state a toggle would move this mod into.
    ///
    /// Broken mods have no toggle target.
    pub fn toggled(self) -> Option<ModState> {
        match self {
            ModState::Enabled => Some(ModState::Disabled),
            ModState::Disabled => Some(ModState::Enabled),
            ModState::Broken => None,
        }
    }
}

impl fmt::Display for ModState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModState::Enabled => "enabled",
            ModState::Disabled => "disabled",
            ModState::Broken => "broken",
        };
        f.write_str(label)
    }
}

/// A single mod directory as last observed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModFolder {
    pub name: String,
    pub state: ModState,
    /// Creation time of the directory in its current root (mtime where ctime is unavailable)
    pub created: Option<SystemTime>,
}

impl ModFolder {
    pub fn new(name: impl Into<String>, state: ModState) -> Self {
        Self {
            name: name.into(),
            state,
            created: None,
        }
    }

    pub fn with_created(mut self, created: Option<SystemTime>) -> Self {
        self.created = created;
        self
    }
}

/// The three sibling roots derived from the enabled root.
///
/// ```text
/// <parent>/<enabled root>/<mod>
/// <parent>/disabledMods/<mod>
/// <parent>/brokenMods/<mod>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModLayout {
    enabled_root: Utf8PathBuf,
    disabled_root: Utf8PathBuf,
    broken_root: Utf8PathBuf,
}

impl ModLayout {
    /// Derive the layout from an enabled root.
    ///
    /// Fails when the root has no parent directory to host the sibling roots.
    pub fn from_enabled_root<P: AsRef<Utf8Path>>(enabled_root: P) -> Result<Self> {
        let enabled_root = enabled_root.as_ref().to_path_buf();
        let parent = enabled_root
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .ok_or_else(|| anyhow!("Mods root has no parent directory: {}", enabled_root))?
            .to_path_buf();

        Ok(Self {
            disabled_root: parent.join(DISABLED_DIR_NAME),
            broken_root: parent.join(BROKEN_DIR_NAME),
            enabled_root,
        })
    }

    pub fn enabled_root(&self) -> &Utf8Path {
        &self.enabled_root
    }

    pub fn disabled_root(&self) -> &Utf8Path {
        &self.disabled_root
    }

    pub fn broken_root(&self) -> &Utf8Path {
        &self.broken_root
    }

    /// Root directory backing a given state.
    pub fn root_for(&self, state: ModState) -> &Utf8Path {
        match state {
            ModState::Enabled => &self.enabled_root,
            ModState::Disabled => &self.disabled_root,
            ModState::Broken => &self.broken_root,
        }
    }

    /// Full path of a mod folder in the root for `state`.
    pub fn path_of(&self, name: &str, state: ModState) -> Utf8PathBuf {
        self.root_for(state).join(name)
    }

    /// Key used for this layout in the preset document.
    pub fn preset_key(&self) -> &str {
        self.enabled_root.as_str()
    }
}

/// Tri-state view filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateFilter {
    #[default]
    All,
    Enabled,
    Disabled,
}

impl StateFilter {
    pub fn matches(self, state: ModState) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Enabled => state == ModState::Enabled,
            StateFilter::Disabled => state == ModState::Disabled,
        }
    }
}

impl FromStr for StateFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(StateFilter::All),
            "enabled" => Ok(StateFilter::Enabled),
            "disabled" => Ok(StateFilter::Disabled),
            other => Err(anyhow!("Unknown filter: {}", other)),
        }
    }
}

/// Presentation order for the mod list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Name,
    Created,
}

impl SortOrder {
    /// Total ordering over folders, deterministic for a given filesystem state.
    pub fn compare(self, a: &ModFolder, b: &ModFolder) -> Ordering {
        let by_name = || {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        };

        match self {
            SortOrder::Name => by_name(),
            SortOrder::Created => a.created.cmp(&b.created).then_with(by_name),
        }
    }
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortOrder::Name),
            "created" | "date" => Ok(SortOrder::Created),
            other => Err(anyhow!("Unknown sort order: {}", other)),
        }
    }
}

/// Apply the state filter and case-insensitive search to a folder list.
///
/// Both conditions must hold for a folder to be kept.
pub fn filter_folders<'a>(
    folders: impl IntoIterator<Item = &'a ModFolder>,
    filter: StateFilter,
    search: &str,
) -> Vec<&'a ModFolder> {
    let needle = search.to_lowercase();
    folders
        .into_iter()
        .filter(|f| filter.matches(f.state))
        .filter(|f| f.name.to_lowercase().contains(&needle))
        .collect()
}
