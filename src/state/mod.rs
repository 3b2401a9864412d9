// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for view updates.

use crate::models::{AppState, ModLayout, SortOrder, StateFilter, UserConfig};
use crate::services::{Classification, MoveReport};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// Views subscribe to these instead of polling the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The enabled root changed (or was cleared)
    RootChanged { root: Option<String> },

    /// The folder-state table was reconciled with the filesystem
    ModsRefreshed { enabled: usize, disabled: usize },

    /// Names were found in both the enabled and disabled roots
    ConflictsDetected { names: Vec<String> },

    /// A move was dispatched; the item must not be interacted with
    MoveStarted { name: String },

    /// A move reached a terminal status
    MoveFinished {
        name: String,
        success: bool,
        message: String,
    },

    /// Filter, search or sort changed
    ViewChanged,

    /// Settings have been updated
    SettingsChanged,
}

/// Thread-safe state manager with event emission
///
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// Always use `StateManager` instead of accessing [`AppState`] directly:
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
#[derive(Clone)]
pub struct StateManager {
    state: Arc<RwLock<AppState>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state and a 100-event broadcast buffer
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get a cloned snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.read_guard().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let pending = state_manager.read(|state| state.is_pending("SomeMod"));
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.read_guard();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Captures the old state, applies the update, then emits one event per
    /// detected difference.
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.write_guard();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        for change in &changes {
            self.emit(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn emit(&self, change: StateChange) {
        // No subscribers is fine
        let _ = self.state_tx.send(change);
    }

    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.layout != new.layout {
            changes.push(StateChange::RootChanged {
                root: new.layout.as_ref().map(|l| l.enabled_root().to_string()),
            });
        }

        if old.mods != new.mods {
            let (enabled, disabled) = new.counts();
            changes.push(StateChange::ModsRefreshed { enabled, disabled });
        }

        if old.conflicts != new.conflicts && !new.conflicts.is_empty() {
            changes.push(StateChange::ConflictsDetected {
                names: new.conflicts.clone(),
            });
        }

        for name in new.pending_moves.difference(&old.pending_moves) {
            changes.push(StateChange::MoveStarted { name: name.clone() });
        }

        if old.filter != new.filter || old.search != new.search || old.sort != new.sort {
            changes.push(StateChange::ViewChanged);
        }

        if old.auto_refresh != new.auto_refresh {
            changes.push(StateChange::SettingsChanged);
        }

        changes
    }

    // Convenience methods for common state updates

    /// Point the state at a new layout, dropping the previous table
    pub fn set_layout(&self, layout: Option<ModLayout>) -> Vec<StateChange> {
        self.update(|state| {
            if state.layout != layout {
                state.clear_mods();
            }
            state.layout = layout;
        })
    }

    /// Reconcile the table with a fresh classification
    pub fn apply_classification(&self, classification: Classification) -> Vec<StateChange> {
        self.update(|state| {
            state.replace_mods(classification.folders, classification.conflicts);
        })
    }

    /// Mark a folder as having a move in flight.
    ///
    /// Returns false (and changes nothing) if one is already pending.
    pub fn begin_move(&self, name: &str) -> bool {
        let mut started = false;
        self.update(|state| {
            started = state.pending_moves.insert(name.to_string());
        });
        started
    }

    /// Clear the pending flag for the folder named by the report
    pub fn finish_move(&self, report: &MoveReport) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.pending_moves.remove(report.name());
        });

        let event = StateChange::MoveFinished {
            name: report.name().to_string(),
            success: report.outcome.is_success(),
            message: report.outcome.to_string(),
        };
        self.emit(event.clone());
        changes.push(event);

        changes
    }

    pub fn set_filter(&self, filter: StateFilter) -> Vec<StateChange> {
        self.update(|state| state.filter = filter)
    }

    pub fn set_search(&self, search: &str) -> Vec<StateChange> {
        self.update(|state| state.search = search.to_string())
    }

    pub fn set_sort(&self, sort: SortOrder) -> Vec<StateChange> {
        self.update(|state| state.sort = sort)
    }

    pub fn set_auto_refresh(&self, enabled: bool) -> Vec<StateChange> {
        self.update(|state| state.auto_refresh = enabled)
    }

    /// Load settings relevant to the state from UserConfig
    pub fn load_from_user_config(&self, user_config: &UserConfig) -> Vec<StateChange> {
        self.update(|state| {
            state.auto_refresh = user_config.settings.auto_refresh;
            tracing::info!(
                "Loaded user config: root={}, auto_refresh={}",
                user_config.root_path().unwrap_or("<unset>"),
                state.auto_refresh
            );
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModFolder, ModState};
    use crate::services::{MoveOutcome, MoveRequest};
    use std::time::Duration;

    fn classification(enabled: &[&str], disabled: &[&str]) -> Classification {
        let mut folders: Vec<ModFolder> = enabled
            .iter()
            .map(|n| ModFolder::new(*n, ModState::Enabled))
            .collect();
        folders.extend(disabled.iter().map(|n| ModFolder::new(*n, ModState::Disabled)));
        Classification {
            folders,
            conflicts: Vec::new(),
        }
    }

    #[test]
    fn test_new_state_manager() {
        let manager = StateManager::new();
        let state = manager.snapshot();

        assert!(!state.is_root_configured());
        assert!(state.pending_moves.is_empty());
    }

    #[test]
    fn test_apply_classification_emits_refresh() {
        let manager = StateManager::new();

        let changes = manager.apply_classification(classification(&["A", "B"], &["C"]));
        assert_eq!(
            changes,
            vec![StateChange::ModsRefreshed {
                enabled: 2,
                disabled: 1
            }]
        );

        // Same classification again is not a change
        let changes = manager.apply_classification(classification(&["A", "B"], &["C"]));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_conflicts_emit_event() {
        let manager = StateManager::new();
        let mut c = classification(&["A"], &[]);
        c.conflicts = vec!["Twice".to_string()];

        let changes = manager.apply_classification(c);
        assert!(changes.contains(&StateChange::ConflictsDetected {
            names: vec!["Twice".to_string()]
        }));
    }

    #[test]
    fn test_begin_move_rejects_duplicates() {
        let manager = StateManager::new();

        assert!(manager.begin_move("A"));
        assert!(!manager.begin_move("A"));
        assert!(manager.read(|s| s.is_pending("A")));
    }

    #[test]
    fn test_finish_move_clears_pending() {
        let manager = StateManager::new();
        manager.begin_move("A");

        let report = MoveReport {
            request: MoveRequest::disable("A"),
            outcome: MoveOutcome::IoFailure("denied".to_string()),
            duration: Duration::from_millis(1),
        };
        let changes = manager.finish_move(&report);

        assert!(!manager.read(|s| s.is_pending("A")));
        assert!(changes.contains(&StateChange::MoveFinished {
            name: "A".to_string(),
            success: false,
            message: "Error: denied".to_string(),
        }));
    }

    #[test]
    fn test_set_layout_clears_table() {
        let manager = StateManager::new();
        manager.apply_classification(classification(&["A"], &[]));

        let layout = ModLayout::from_enabled_root("/games/Mods").unwrap();
        let changes = manager.set_layout(Some(layout));

        assert!(changes.contains(&StateChange::RootChanged {
            root: Some("/games/Mods".to_string())
        }));
        assert!(manager.read(|s| s.mods.is_empty()));
    }

    #[test]
    fn test_view_changes() {
        let manager = StateManager::new();

        assert_eq!(manager.set_filter(StateFilter::Disabled), vec![StateChange::ViewChanged]);
        assert_eq!(manager.set_search("al"), vec![StateChange::ViewChanged]);
        assert!(manager.set_search("al").is_empty());
        assert_eq!(manager.set_auto_refresh(true), vec![StateChange::SettingsChanged]);
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.begin_move("A");

        let event = rx.try_recv().unwrap();
        assert_eq!(event, StateChange::MoveStarted { name: "A".to_string() });
    }
}
