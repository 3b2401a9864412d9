// UI module - interactive layer
//
// This module contains:
// - ModController: owns the interactive flow, dispatches moves and applies their reports
// - Prompt: confirmation/notification surface (dialoguer in the terminal, mocks in tests)
// - cli: clap command definitions and dispatch

pub mod cli;
pub mod controller;
pub mod prompt;

pub use cli::{Cli, Command, PresetCommand, run_command};
pub use controller::{ApplyReport, ModController};
pub use prompt::{Notice, Prompt, TerminalPrompt};
