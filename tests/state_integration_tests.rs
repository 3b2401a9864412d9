//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits state change events on mutations
//! - Supports multiple subscribers
//! - Handles concurrent access from multiple threads
//! - Tracks in-flight moves per folder

use modswitch::models::{ModFolder, ModState, SortOrder, StateFilter};
use modswitch::services::{Classification, MoveOutcome, MoveReport, MoveRequest};
use modswitch::{ModLayout, StateChange, StateManager};
use std::sync::Arc;
use std::thread;
use tokio::time::{Duration, timeout};

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

fn report(name: &str, outcome: MoveOutcome) -> MoveReport {
    MoveReport {
        request: MoveRequest::disable(name),
        outcome,
        duration: Duration::from_millis(3),
    }
}

#[tokio::test]
async fn test_state_change_events_emitted() {
    let state = Arc::new(StateManager::new());
    let mut rx = state.subscribe();

    state.apply_classification(classification(&["A", "B"], &["C"]));

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");

    assert_eq!(
        event,
        StateChange::ModsRefreshed {
            enabled: 2,
            disabled: 1
        }
    );
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let state = Arc::new(StateManager::new());
    let mut rx1 = state.subscribe();
    let mut rx2 = state.subscribe();

    state.set_filter(StateFilter::Disabled);

    for rx in [&mut rx1, &mut rx2] {
        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for event")
            .expect("Channel closed");
        assert_eq!(event, StateChange::ViewChanged);
    }
}

#[tokio::test]
async fn test_move_lifecycle_events() {
    let state = StateManager::new();
    state.apply_classification(classification(&["A"], &[]));
    let mut rx = state.subscribe();

    assert!(state.begin_move("A"));
    let started = rx.recv().await.unwrap();
    assert_eq!(
        started,
        StateChange::MoveStarted {
            name: "A".to_string()
        }
    );
    assert!(state.read(|s| s.is_pending("A")));

    state.finish_move(&report("A", MoveOutcome::Success));
    let finished = rx.recv().await.unwrap();
    assert_eq!(
        finished,
        StateChange::MoveFinished {
            name: "A".to_string(),
            success: true,
            message: "Success".to_string(),
        }
    );
    assert!(!state.read(|s| s.is_pending("A")));
}

#[test]
fn test_failed_move_clears_pending_flag() {
    let state = StateManager::new();
    assert!(state.begin_move("A"));

    let changes = state.finish_move(&report("A", MoveOutcome::IoFailure("disk full".into())));

    assert!(!state.read(|s| s.is_pending("A")));
    assert!(changes.contains(&StateChange::MoveFinished {
        name: "A".to_string(),
        success: false,
        message: "Error: disk full".to_string(),
    }));
    // The folder can be moved again
    assert!(state.begin_move("A"));
}

#[test]
fn test_pending_moves_are_per_folder() {
    let state = StateManager::new();

    assert!(state.begin_move("A"));
    assert!(state.begin_move("B"));
    assert!(!state.begin_move("A"));

    state.finish_move(&report("A", MoveOutcome::Success));
    assert!(state.read(|s| !s.is_pending("A") && s.is_pending("B")));
}

#[test]
fn test_changing_root_clears_table() {
    let state = StateManager::new();
    let first = ModLayout::from_enabled_root("/games/one/Mods").unwrap();
    let second = ModLayout::from_enabled_root("/games/two/Mods").unwrap();

    state.set_layout(Some(first.clone()));
    state.apply_classification(classification(&["A"], &["B"]));
    state.begin_move("A");

    // Re-opening the same root keeps the table
    assert!(state.set_layout(Some(first)).is_empty());
    assert_eq!(state.read(|s| s.mods.len()), 2);

    let changes = state.set_layout(Some(second));
    assert!(changes.contains(&StateChange::RootChanged {
        root: Some("/games/two/Mods".to_string())
    }));
    state.read(|s| {
        assert!(s.mods.is_empty());
        assert!(s.pending_moves.is_empty());
    });
}

#[test]
fn test_view_settings_apply_to_visible_mods() {
    let state = StateManager::new();
    state.apply_classification(classification(&["Alpha Skin", "beta"], &["Gamma Skin"]));

    state.set_search("skin");
    state.set_filter(StateFilter::Enabled);
    let visible: Vec<String> = state
        .snapshot()
        .visible_mods()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(visible, vec!["Alpha Skin".to_string()]);

    state.set_filter(StateFilter::All);
    state.set_sort(SortOrder::Name);
    let visible: Vec<String> = state
        .snapshot()
        .visible_mods()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(
        visible,
        vec!["Alpha Skin".to_string(), "Gamma Skin".to_string()]
    );
}

#[test]
fn test_concurrent_begin_move_admits_one() {
    let state = StateManager::new();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            thread::spawn(move || state.begin_move("Shared"))
        })
        .collect();

    let admitted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|started| *started)
        .count();

    assert_eq!(admitted, 1);
}
