//! ModSwitch - command-line entry point.
//!
//! # Overview
//!
//! Initializes:
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime (folder moves run as tasks on it)
//! - Configuration loading ([`ConfigManager`])
//! - State management ([`StateManager`])
//! - The [`ModController`] that executes the requested command
//!
//! # Execution Flow
//!
//! 1. Parse arguments
//! 2. Load `ModSwitch Data/ModSwitch Settings.yaml`
//! 3. Initialize logging → logs/modswitch.<date>
//! 4. Create the tokio runtime
//! 5. Open the mods root (`--root`, last used, or a detected 3DMigoto `Mods` folder)
//! 6. Run the command, waiting for every move it dispatched
//! 7. Save settings and log the session summary

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use modswitch::services::detect_default_root;
use modswitch::ui::{Cli, TerminalPrompt, run_command};
use modswitch::{APP_NAME, ConfigManager, ModController, StateManager, VERSION};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let user_config = config_manager.load_user_config()?;

    let debug_mode = cli.debug || user_config.settings.debug_mode;
    let _log_guard =
        modswitch::logging::setup_logging_with_console("logs", "modswitch", debug_mode, debug_mode)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("modswitch-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let state_manager = StateManager::new();
    let mut controller = ModController::new(
        state_manager,
        config_manager,
        user_config,
        TerminalPrompt::new(cli.yes),
        runtime.handle().clone(),
    )?;

    let root = match cli.root {
        Some(root) => Some(root),
        None if controller.user_config().root_path().is_none() => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            Utf8PathBuf::try_from(cwd)
                .ok()
                .and_then(|cwd| detect_default_root(&cwd))
        }
        None => None,
    };
    if let Some(root) = root {
        controller.open_root(&root)?;
    }

    let result = runtime.block_on(run_command(&mut controller, cli.command));
    if let Err(e) = &result {
        tracing::error!("Command failed: {:#}", e);
    }

    controller.shutdown()?;
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Shutdown complete");
    result
}
