// Command-line front end
//
// Parses arguments with clap and drives the ModController. Each command
// dispatches its moves and waits for every terminal report before returning.

use crate::models::{ModState, SortOrder, StateFilter};
use crate::state::StateChange;
use crate::ui::controller::ModController;
use crate::ui::prompt::Prompt;
use anyhow::{Result, bail};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Toggle game mod folders between enabled and disabled, with presets
#[derive(Debug, Parser)]
#[command(name = "modswitch", version, about)]
pub struct Cli {
    /// Enabled mods folder (remembered for later runs)
    #[arg(long, global = true)]
    pub root: Option<Utf8PathBuf>,

    /// Directory holding settings and presets
    #[arg(long, global = true, default_value = "ModSwitch Data")]
    pub config_dir: Utf8PathBuf,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Verbose logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List mods with their state
    List {
        #[arg(long, default_value = "all")]
        filter: StateFilter,
        /// Case-insensitive substring to match
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "name")]
        sort: SortOrder,
    },
    /// Move mods into the enabled folder
    Enable { names: Vec<String> },
    /// Move mods into the disabled folder
    Disable { names: Vec<String> },
    /// Flip mods between enabled and disabled
    Toggle { names: Vec<String> },
    /// Quarantine a mod in the brokenMods folder
    Broken { name: String },
    /// Rename a mod folder and update presets that reference it
    Rename { old: String, new: String },
    /// Show the hotkeys declared in a mod's config file
    Keys { name: String },
    /// Manage presets
    #[command(subcommand)]
    Preset(PresetCommand),
    /// Detect (and optionally run) the mod fixer
    Fixer {
        #[arg(long)]
        run: bool,
    },
    /// Keep re-scanning the mods folders and print changes
    Watch,
    /// Turn periodic re-scanning on or off for `watch`
    AutoRefresh { state: Switch },
}

#[derive(Debug, Subcommand)]
pub enum PresetCommand {
    /// List presets saved for the current folder
    List,
    /// Save the current state as a preset
    Save { name: String },
    /// Overwrite an existing preset with the current state
    Update { name: String },
    /// Apply a preset
    Load { name: String },
    /// Delete a preset
    Delete { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

/// Execute one command against the controller
pub async fn run_command<P: Prompt>(
    controller: &mut ModController<P>,
    command: Command,
) -> Result<()> {
    match command {
        Command::List {
            filter,
            search,
            sort,
        } => {
            controller.refresh()?;
            let state = controller.state();
            state.set_filter(filter);
            state.set_search(search.as_deref().unwrap_or_default());
            state.set_sort(sort);
            print_mods(controller);
        }
        Command::Enable { names } => {
            move_all(controller, &names, |c, n| c.set_enabled(n, true)).await?
        }
        Command::Disable { names } => {
            move_all(controller, &names, |c, n| c.set_enabled(n, false)).await?
        }
        Command::Toggle { names } => move_all(controller, &names, |c, n| c.toggle(n)).await?,
        Command::Broken { name } => {
            if controller.mark_broken(&name)? {
                controller.wait_idle().await;
            }
        }
        Command::Rename { old, new } => {
            let touched = controller.rename(&old, &new)?;
            println!("Renamed '{}' to '{}' ({} preset(s) updated)", old, new, touched);
        }
        Command::Keys { name } => {
            let keys = controller.read_keys(&name)?;
            if keys.is_empty() {
                println!("No key bindings found for '{}'", name);
            }
            for key in keys {
                println!("{}", key);
            }
        }
        Command::Preset(preset) => run_preset_command(controller, preset).await?,
        Command::Fixer { run } => match controller.find_fixer()? {
            Some(path) if run => {
                controller.run_fixer()?;
                println!("Launched {}", path);
            }
            Some(path) => println!("Fixer found: {}", path),
            None => println!("No fixer found"),
        },
        Command::Watch => watch(controller).await?,
        Command::AutoRefresh { state } => {
            controller.set_auto_refresh(state == Switch::On);
            println!(
                "Auto refresh {}",
                if state == Switch::On { "enabled" } else { "disabled" }
            );
        }
    }

    Ok(())
}

async fn move_all<P, F>(controller: &mut ModController<P>, names: &[String], dispatch: F) -> Result<()>
where
    P: Prompt,
    F: Fn(&ModController<P>, &str) -> Result<bool>,
{
    if names.is_empty() {
        bail!("No mod names given");
    }

    for name in names {
        if let Err(e) = dispatch(controller, name) {
            tracing::error!("Cannot move '{}': {:#}", name, e);
            eprintln!("Error: {:#}", e);
        }
    }

    for report in controller.wait_idle().await {
        if report.outcome.is_success() {
            println!("{} '{}'", report.request.past_tense(), report.name());
        }
    }
    Ok(())
}

async fn run_preset_command<P: Prompt>(
    controller: &mut ModController<P>,
    command: PresetCommand,
) -> Result<()> {
    match command {
        PresetCommand::List => {
            let names = controller.list_presets()?;
            if names.is_empty() {
                println!("No presets saved for this folder");
            }
            for name in names {
                println!("{}", name);
            }
        }
        PresetCommand::Save { name } => controller.save_preset(&name)?,
        PresetCommand::Update { name } => {
            controller.update_preset(&name)?;
        }
        PresetCommand::Load { name } => {
            controller.apply_preset(&name).await?;
        }
        PresetCommand::Delete { name } => {
            controller.delete_preset(&name)?;
        }
    }
    Ok(())
}

fn print_mods<P: Prompt>(controller: &ModController<P>) {
    let state = controller.state().snapshot();

    for folder in state.visible_mods() {
        let marker = match folder.state {
            ModState::Enabled => "[x]",
            ModState::Disabled => "[ ]",
            ModState::Broken => "[!]",
        };
        println!("{} {}", marker, folder.name);
    }

    for name in &state.conflicts {
        eprintln!(
            "Warning: '{}' exists in both the enabled and disabled folders",
            name
        );
    }

    let (enabled, disabled) = state.counts();
    println!("{} enabled, {} disabled", enabled, disabled);
}

async fn watch<P: Prompt>(controller: &mut ModController<P>) -> Result<()> {
    controller.refresh()?;
    print_mods(controller);

    if !controller.user_config().settings.auto_refresh {
        println!("Auto refresh is off; enable it with `modswitch auto-refresh on`");
        return Ok(());
    }

    let interval_ms = controller.user_config().settings.refresh_interval_ms.max(100);
    let period = Duration::from_millis(interval_ms);
    let mut ticker = tokio::time::interval(period);
    let mut changes = controller.state().subscribe();
    println!("Watching for changes every {}ms (Ctrl+C to stop)", period.as_millis());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if let Err(e) = controller.refresh() {
                    tracing::warn!("Refresh failed: {:#}", e);
                }
            }
            change = changes.recv() => match change {
                Ok(StateChange::ModsRefreshed { .. }) => print_mods(controller),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => tracing::debug!("Skipped {} state events", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}
