// Mod Controller - the interactive layer
//
// This module contains the ModController which coordinates between:
// - StateManager (folder-state table, pending moves, view)
// - MoveService (one tokio task per folder move)
// - PresetStore (JSON preset document)
// - Prompt (confirmations and notifications)
//
// Move tasks never touch the state. They send a MoveReport back over a
// channel and the controller applies it, then re-classifies the roots.

use crate::config::ConfigManager;
use crate::metrics::Metrics;
use crate::models::{ModLayout, ModState, Preset, UserConfig};
use crate::services::{
    Classification, MetadataReader, MoveError, MoveReport, MoveRequest, MoveService, PresetError,
    PresetStore, classify, find_fixer, launch_fixer, rename_folder,
};
use crate::state::StateManager;
use crate::ui::prompt::{Notice, Prompt};
use anyhow::{Context, Result, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;

const BROKEN_CONFIRMATION: &str = "Marking a mod as broken moves it to the brokenMods folder \
     and hides it from the list. It can only be restored by moving it back manually. Continue?";

/// Outcome of applying a preset
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    /// Names moved into the state the preset declares
    pub moved: Vec<String>,
    /// Moves that ended in NotFound or IoFailure
    pub failed: Vec<MoveReport>,
    /// Names the preset references that exist in neither root
    pub missing: Vec<String>,
    /// Names present in both roots, left where they are
    pub conflicts: Vec<String>,
    /// Names already in the declared state
    pub unchanged: usize,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.missing.is_empty() && self.conflicts.is_empty()
    }
}

/// Controller that owns the interactive flow
///
/// # Example
/// ```ignore
/// let mut controller = ModController::new(
///     state_manager,
///     config_manager,
///     user_config,
///     TerminalPrompt::new(false),
///     runtime.handle().clone(),
/// )?;
/// controller.open_root("C:/Games/3DMigoto/Mods")?;
/// controller.toggle("SomeMod")?;
/// controller.wait_idle().await;
/// controller.shutdown()?;
/// ```
pub struct ModController<P: Prompt> {
    state_manager: StateManager,
    config_manager: ConfigManager,
    user_config: UserConfig,
    presets: PresetStore,
    metadata: MetadataReader,
    moves: MoveService,
    reports: mpsc::UnboundedReceiver<MoveReport>,
    prompt: P,
    metrics: Arc<Metrics>,
}

impl<P: Prompt> ModController<P> {
    /// Create a controller. Opens the configured root if there is one.
    pub fn new(
        state_manager: StateManager,
        config_manager: ConfigManager,
        user_config: UserConfig,
        prompt: P,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let presets = PresetStore::new(config_manager.presets_path(&user_config));
        let metadata = MetadataReader::new(user_config.settings.metadata_file.clone());
        let (moves, reports) = MoveService::new(tokio_handle);

        state_manager.load_from_user_config(&user_config);

        let mut controller = Self {
            state_manager,
            config_manager,
            user_config,
            presets,
            metadata,
            moves,
            reports,
            prompt,
            metrics: Arc::new(Metrics::new()),
        };

        if let Some(root) = controller.user_config.root_path().map(Utf8PathBuf::from) {
            if let Err(e) = controller.open_root(&root) {
                tracing::warn!("Configured root is unusable, ignoring: {:#}", e);
            }
        }

        tracing::info!("Controller initialized, presets at {}", controller.presets.path());
        Ok(controller)
    }

    pub fn state(&self) -> &StateManager {
        &self.state_manager
    }

    pub fn user_config(&self) -> &UserConfig {
        &self.user_config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    /// Current layout, or an error if no root has been opened
    pub fn layout(&self) -> Result<ModLayout> {
        self.state_manager
            .read(|s| s.layout.clone())
            .ok_or_else(|| anyhow!("No mods folder configured; pass --root <PATH>"))
    }

    /// Use `root` as the enabled root and remember it as the last used one.
    pub fn open_root<R: AsRef<Utf8Path>>(&mut self, root: R) -> Result<()> {
        let root = root.as_ref();
        if !root.is_dir() {
            bail!("Mods folder does not exist: {}", root);
        }

        let layout = ModLayout::from_enabled_root(root)?;
        self.state_manager.set_layout(Some(layout));
        self.user_config.settings.root_path = root.to_string();
        tracing::info!("Opened mods folder: {}", root);

        self.refresh()?;
        Ok(())
    }

    /// Reconcile the state table with the filesystem.
    pub fn refresh(&self) -> Result<Classification> {
        let layout = self.layout()?;
        let classification = classify(&layout)?;
        self.state_manager
            .apply_classification(classification.clone());
        self.metrics.record_refresh();
        Ok(classification)
    }

    /// Dispatch a move without waiting for it.
    ///
    /// Returns false if a move for the same folder is still in flight.
    pub fn dispatch_move(&self, request: MoveRequest) -> Result<bool> {
        let layout = self.layout()?;
        if !self.state_manager.begin_move(&request.name) {
            tracing::warn!("Move already in progress for '{}'", request.name);
            return Ok(false);
        }
        self.moves.dispatch(layout, request);
        Ok(true)
    }

    fn current_state(&self, name: &str) -> Result<ModState> {
        match self.state_manager.read(|s| s.state_of(name)) {
            Some(state) => Ok(state),
            None => {
                let layout = self.layout()?;
                Err(MoveError::NotFound(layout.path_of(name, ModState::Enabled)).into())
            }
        }
    }

    /// Flip a mod between enabled and disabled.
    pub fn toggle(&self, name: &str) -> Result<bool> {
        let from = self.current_state(name)?;
        let to = from
            .toggled()
            .ok_or_else(|| anyhow!("Mod '{}' is broken and cannot be toggled", name))?;
        self.dispatch_move(MoveRequest::new(name, from, to))
    }

    /// Move a mod into `target`. Does nothing if it is already there.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<bool> {
        let from = self.current_state(name)?;
        let to = if enabled {
            ModState::Enabled
        } else {
            ModState::Disabled
        };
        if from == to {
            tracing::info!("'{}' is already {}", name, to);
            return Ok(false);
        }
        self.dispatch_move(MoveRequest::new(name, from, to))
    }

    fn apply_report(&self, report: &MoveReport) {
        self.state_manager.finish_move(report);
        self.metrics
            .record_move(report.outcome.is_success(), report.duration);

        if report.outcome.is_success() {
            tracing::info!(
                "{} '{}' finished in {:.0}ms",
                report.request.action(),
                report.name(),
                report.duration.as_secs_f64() * 1000.0
            );
        } else {
            tracing::error!(
                "{} '{}' failed: {}",
                report.request.action(),
                report.name(),
                report.outcome
            );
        }
    }

    /// Apply one terminal move report: clear the pending flag, surface
    /// failures and re-classify.
    pub fn handle_report(&self, report: &MoveReport) {
        self.apply_report(report);

        if !report.outcome.is_success() {
            self.prompt.notify(Notice::Error, &report.outcome.to_string());
        }

        if let Err(e) = self.refresh() {
            tracing::warn!("Refresh after move failed: {:#}", e);
        }
    }

    /// Wait for the next move report and apply it.
    pub async fn next_report(&mut self) -> Option<MoveReport> {
        let report = self.reports.recv().await?;
        self.handle_report(&report);
        Some(report)
    }

    /// Wait until no moves are in flight.
    pub async fn wait_idle(&mut self) -> Vec<MoveReport> {
        let mut reports = Vec::new();
        while self.state_manager.read(|s| !s.pending_moves.is_empty()) {
            match self.next_report().await {
                Some(report) => reports.push(report),
                None => break,
            }
        }
        reports
    }

    /// Quarantine a mod in the broken root.
    ///
    /// The first use ever requires confirmation; once accepted the answer is
    /// persisted and later calls go straight through. Returns false when the
    /// user declines.
    pub fn mark_broken(&mut self, name: &str) -> Result<bool> {
        let from = self.current_state(name)?;

        if !self.user_config.settings.broken_confirmation_shown {
            if !self.prompt.confirm(BROKEN_CONFIRMATION) {
                tracing::info!("Mark as broken declined for '{}'", name);
                return Ok(false);
            }
            self.user_config.settings.broken_confirmation_shown = true;
            self.config_manager
                .save_user_config(&self.user_config)
                .context("Failed to persist broken confirmation")?;
        }

        self.dispatch_move(MoveRequest::mark_broken(name, from))
    }

    /// Rename a mod folder and rewrite its name in every preset of this root.
    ///
    /// Returns the number of presets updated.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<usize> {
        let layout = self.layout()?;
        if self.state_manager.read(|s| s.is_pending(old_name)) {
            bail!("Cannot rename '{}' while it is being moved", old_name);
        }
        self.refresh()?;
        let state = self.current_state(old_name)?;

        // A folder of that name in the other root would become a conflict
        let holder = self.state_manager.read(|s| {
            if s.conflicts.iter().any(|c| c == new_name) {
                Some(ModState::Enabled)
            } else {
                s.state_of(new_name)
            }
        });
        let result = match holder {
            Some(held) if old_name != new_name => Err(MoveError::AlreadyExists {
                name: new_name.to_string(),
                root: layout.root_for(held).to_path_buf(),
            }),
            _ => rename_folder(layout.root_for(state), old_name, new_name),
        };
        if let Err(e) = result {
            self.prompt
                .notify(Notice::Error, &format!("Rename failed: {}", e));
            return Err(e.into());
        }

        let touched = self
            .presets
            .rename_references(layout.preset_key(), old_name, new_name)?;
        self.refresh()?;
        Ok(touched)
    }

    /// Snapshot the current enabled/disabled membership.
    pub fn snapshot_preset(&self) -> Result<Preset> {
        self.refresh()?;
        Ok(self.state_manager.read(|s| {
            Preset::new(
                s.names_in(ModState::Enabled),
                s.names_in(ModState::Disabled),
            )
        }))
    }

    pub fn list_presets(&self) -> Result<Vec<String>> {
        let layout = self.layout()?;
        self.presets.list(layout.preset_key())
    }

    fn report_preset_error(&self, err: PresetError) -> anyhow::Error {
        let notice = match err {
            PresetError::Storage(_) => Notice::Error,
            _ => Notice::Warning,
        };
        self.prompt.notify(notice, &err.to_string());
        err.into()
    }

    /// Save the current state under `name`, overwriting any preset of that name.
    pub fn save_preset(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(self.report_preset_error(PresetError::EmptyName));
        }
        let layout = self.layout()?;
        let preset = self.snapshot_preset()?;

        self.presets
            .save_preset(layout.preset_key(), name, preset)
            .map_err(|e| self.report_preset_error(e))?;
        self.prompt.notify(Notice::Info, "Preset saved successfully");
        Ok(())
    }

    /// Re-snapshot an existing preset after confirmation.
    ///
    /// Returns false when the user declines.
    pub fn update_preset(&self, name: &str) -> Result<bool> {
        let layout = self.layout()?;
        self.presets
            .get(layout.preset_key(), name)
            .map_err(|e| self.report_preset_error(e))?;

        if !self
            .prompt
            .confirm(&format!("Overwrite preset '{}' with the current mods?", name))
        {
            return Ok(false);
        }

        let preset = self.snapshot_preset()?;
        self.presets
            .update_preset(layout.preset_key(), name, preset)
            .map_err(|e| self.report_preset_error(e))?;
        self.prompt
            .notify(Notice::Info, "Preset updated successfully");
        Ok(true)
    }

    /// Delete a preset after confirmation. Returns false when the user declines.
    pub fn delete_preset(&self, name: &str) -> Result<bool> {
        let layout = self.layout()?;
        self.presets
            .get(layout.preset_key(), name)
            .map_err(|e| self.report_preset_error(e))?;

        if !self
            .prompt
            .confirm(&format!("Delete preset '{}'?", name))
        {
            return Ok(false);
        }

        self.presets
            .delete_preset(layout.preset_key(), name)
            .map_err(|e| self.report_preset_error(e))?;
        self.prompt
            .notify(Notice::Info, "Preset deleted successfully");
        Ok(true)
    }

    /// Move every folder whose state disagrees with the preset, then wait
    /// for all of those moves to finish.
    ///
    /// Names referenced by the preset but present in neither root are
    /// collected and reported once at the end; they do not stop the apply.
    /// Names present in both roots are reported separately and not moved.
    pub async fn apply_preset(&mut self, name: &str) -> Result<ApplyReport> {
        let layout = self.layout()?;
        let preset = self
            .presets
            .get(layout.preset_key(), name)
            .map_err(|e| self.report_preset_error(e))?;

        self.refresh()?;

        let mut report = ApplyReport::default();
        let mut awaiting = BTreeSet::new();
        let targets = preset
            .enabled
            .iter()
            .map(|n| (n, ModState::Enabled))
            .chain(preset.disabled.iter().map(|n| (n, ModState::Disabled)));

        let conflicts = self.state_manager.read(|s| s.conflicts.clone());

        for (mod_name, target) in targets {
            if conflicts.contains(mod_name) {
                report.conflicts.push(mod_name.clone());
                continue;
            }
            match self.state_manager.read(|s| s.state_of(mod_name)) {
                Some(current) if current == target => report.unchanged += 1,
                Some(current) => {
                    let request = MoveRequest::new(mod_name.as_str(), current, target);
                    if self.dispatch_move(request)? {
                        awaiting.insert(mod_name.clone());
                    } else {
                        tracing::warn!("Skipping '{}': a move is already in flight", mod_name);
                    }
                }
                None => report.missing.push(mod_name.clone()),
            }
        }

        while !awaiting.is_empty() {
            let Some(move_report) = self.reports.recv().await else {
                break;
            };
            self.apply_report(&move_report);
            if awaiting.remove(move_report.name()) {
                if move_report.outcome.is_success() {
                    report.moved.push(move_report.name().to_string());
                } else {
                    report.failed.push(move_report);
                }
            }
        }

        self.refresh()?;
        self.metrics.record_preset_applied(report.missing.len());

        for failed in &report.failed {
            self.prompt.notify(Notice::Error, &failed.outcome.to_string());
        }
        if !report.missing.is_empty() {
            self.prompt.notify(
                Notice::Warning,
                &format!(
                    "Preset loaded, but these mods are missing: {}",
                    report.missing.join(", ")
                ),
            );
        }
        if !report.conflicts.is_empty() {
            self.prompt.notify(
                Notice::Warning,
                &format!(
                    "Preset loaded, but these mods exist in both folders and were left alone: {}",
                    report.conflicts.join(", ")
                ),
            );
        }
        if report.is_clean() {
            self.prompt
                .notify(Notice::Info, "Preset loaded successfully");
        }

        tracing::info!(
            "Applied preset '{}': {} moved, {} failed, {} missing, {} conflicted, {} unchanged",
            name,
            report.moved.len(),
            report.failed.len(),
            report.missing.len(),
            report.conflicts.len(),
            report.unchanged
        );
        Ok(report)
    }

    /// Hotkey bindings declared by a mod
    pub fn read_keys(&self, name: &str) -> Result<Vec<String>> {
        let layout = self.layout()?;
        let state = self.current_state(name)?;
        self.metadata.read_keys(&layout.path_of(name, state))
    }

    pub fn find_fixer(&self) -> Result<Option<Utf8PathBuf>> {
        find_fixer(&self.layout()?)
    }

    /// Launch the fixer if one is present. Returns false when none was found.
    pub fn run_fixer(&self) -> Result<bool> {
        match self.find_fixer()? {
            Some(path) => {
                launch_fixer(&path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.user_config.settings.auto_refresh = enabled;
        self.state_manager.set_auto_refresh(enabled);
    }

    /// Persist settings and log the session summary.
    pub fn shutdown(self) -> Result<()> {
        let pending = self.state_manager.read(|s| s.pending_moves.len());
        if pending > 0 {
            tracing::warn!("Shutting down with {} move(s) still in flight", pending);
        }

        self.config_manager.save_user_config(&self.user_config)?;
        self.metrics.log_summary();
        Ok(())
    }
}
