use crate::models::mod_folder::{
    ModFolder, ModLayout, ModState, SortOrder, StateFilter, filter_folders,
};
use std::collections::{BTreeMap, BTreeSet};

/// Single source of truth for the folder-state table and view settings.
///
/// The table maps each mod name to its last observed [`ModFolder`]. It is
/// reconciled with the filesystem by re-classification after every move and
/// on refresh, never mutated from a move task directly.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`].
/// Mutate it through [`update()`](crate::state::StateManager::update) so change
/// events are emitted.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    // Configuration
    pub layout: Option<ModLayout>,
    pub auto_refresh: bool,

    // Folder-state table
    pub mods: BTreeMap<String, ModFolder>,
    /// Names present in both the enabled and disabled roots
    pub conflicts: Vec<String>,

    // Moves in flight, keyed by folder name
    pub pending_moves: BTreeSet<String>,

    // View
    pub filter: StateFilter,
    pub search: String,
    pub sort: SortOrder,
}

impl AppState {
    pub fn is_root_configured(&self) -> bool {
        self.layout.is_some()
    }

    pub fn state_of(&self, name: &str) -> Option<ModState> {
        self.mods.get(name).map(|m| m.state)
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.pending_moves.contains(name)
    }

    /// Names currently in `state`, case-insensitively sorted.
    pub fn names_in(&self, state: ModState) -> Vec<String> {
        let mut folders: Vec<&ModFolder> =
            self.mods.values().filter(|m| m.state == state).collect();
        folders.sort_by(|a, b| SortOrder::Name.compare(a, b));
        folders.into_iter().map(|m| m.name.clone()).collect()
    }

    /// Filtered and sorted list for display.
    pub fn visible_mods(&self) -> Vec<ModFolder> {
        let mut visible: Vec<ModFolder> = filter_folders(self.mods.values(), self.filter, &self.search)
            .into_iter()
            .cloned()
            .collect();
        visible.sort_by(|a, b| self.sort.compare(a, b));
        visible
    }

    /// Counts of (enabled, disabled) mods.
    pub fn counts(&self) -> (usize, usize) {
        let enabled = self
            .mods
            .values()
            .filter(|m| m.state == ModState::Enabled)
            .count();
        (enabled, self.mods.len() - enabled)
    }

    /// Replace the table with a fresh classification.
    pub fn replace_mods(&mut self, folders: Vec<ModFolder>, conflicts: Vec<String>) {
        self.mods = folders.into_iter().map(|f| (f.name.clone(), f)).collect();
        self.conflicts = conflicts;
    }

    /// Forget everything tied to the current root.
    pub fn clear_mods(&mut self) {
        self.mods.clear();
        self.conflicts.clear();
        self.pending_moves.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> AppState {
        let mut state = AppState::default();
        state.replace_mods(
            vec![
                ModFolder::new("beta", ModState::Enabled),
                ModFolder::new("Alpha", ModState::Enabled),
                ModFolder::new("alpine", ModState::Disabled),
            ],
            Vec::new(),
        );
        state
    }

    #[test]
    fn test_default_state() {
        let state = AppState::default();
        assert!(!state.is_root_configured());
        assert!(state.mods.is_empty());
        assert_eq!(state.filter, StateFilter::All);
        assert_eq!(state.sort, SortOrder::Name);
    }

    #[test]
    fn test_names_in_state_are_sorted() {
        let state = sample_state();
        assert_eq!(state.names_in(ModState::Enabled), vec!["Alpha", "beta"]);
        assert_eq!(state.names_in(ModState::Disabled), vec!["alpine"]);
        assert_eq!(state.counts(), (2, 1));
    }

    #[test]
    fn test_visible_mods_respects_view() {
        let mut state = sample_state();
        state.filter = StateFilter::Enabled;
        state.search = "al".to_string();

        let visible: Vec<String> = state.visible_mods().into_iter().map(|m| m.name).collect();
        assert_eq!(visible, vec!["Alpha"]);
    }

    #[test]
    fn test_clear_mods() {
        let mut state = sample_state();
        state.pending_moves.insert("Alpha".to_string());
        state.clear_mods();

        assert!(state.mods.is_empty());
        assert!(state.pending_moves.is_empty());
    }
}
