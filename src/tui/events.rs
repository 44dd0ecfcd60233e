//! TUI Event System
//!
//! Maps terminal key presses onto wizard commands for the current step.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::onboarding::{ProviderChoice, Step};

/// What the user asked the wizard to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardCommand {
    /// Continue (or finish on the last step)
    Next,
    /// Go one step back along the path taken
    Back,
    /// Pick a provider on the selection step
    Select(ProviderChoice),
    /// Skip the remaining steps and mark onboarding done
    Skip,
    /// Leave without finishing; progress stays persisted
    Quit,
    /// Key has no meaning on this step
    None,
}

/// Translate a key press on `step` into a command
pub fn map_key(event: KeyEvent, step: Step) -> WizardCommand {
    // Key release/repeat events arrive on some platforms; only presses count
    if event.kind != KeyEventKind::Press {
        return WizardCommand::None;
    }

    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return match event.code {
            KeyCode::Char('c') | KeyCode::Char('q') => WizardCommand::Quit,
            _ => WizardCommand::None,
        };
    }

    match event.code {
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => WizardCommand::Next,
        KeyCode::Left | KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => {
            WizardCommand::Back
        }
        KeyCode::Char('q') => WizardCommand::Quit,
        KeyCode::Char('s') if !step.is_terminal() => WizardCommand::Skip,
        KeyCode::Char(c) if step == Step::ProviderSelection => c
            .to_digit(10)
            .and_then(|digit| ProviderChoice::from_index(digit as usize))
            .map(WizardCommand::Select)
            .unwrap_or(WizardCommand::None),
        _ => WizardCommand::None,
    }
}
