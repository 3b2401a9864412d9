// User prompts - confirmations and blocking notifications
//
// The controller never talks to a terminal directly. It asks a `Prompt`, so
// the CLI can use dialoguer while tests substitute a mock.

use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use std::fmt;

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Notice::Info => "Success",
            Notice::Warning => "Warning",
            Notice::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Interaction surface used by the controller
pub trait Prompt {
    /// Ask a yes/no question. Returns true when the user accepts.
    fn confirm(&self, message: &str) -> bool;

    /// Show a notification the user must see.
    fn notify(&self, notice: Notice, message: &str);
}

/// Terminal prompt backed by dialoguer.
///
/// With `assume_yes` set, confirmations are accepted without asking.
#[derive(Debug, Clone, Default)]
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            tracing::debug!("Auto-confirmed: {}", message);
            return true;
        }

        match Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("Confirmation prompt failed, treating as no: {}", e);
                false
            }
        }
    }

    fn notify(&self, notice: Notice, message: &str) {
        match notice {
            Notice::Info => println!("{}", message),
            Notice::Warning | Notice::Error => eprintln!("{}: {}", notice, message),
        }
    }
}
