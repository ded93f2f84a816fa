//! Named gallery commands and the default key bindings.
//!
//! Hosts (browser glue, terminal, test harness) translate their input
//! into a [`KeyEvent`] or a command name; the session's command router
//! dispatches the resulting [`Command`].

use std::str::FromStr;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    NextImage,
    PreviousImage,
    Close,
    ToggleTagMode,
    ClearSelection,
    ToggleSearch,
    ToggleQuality,
    OpenUploader,
}

/// Every command, in help-listing order.
pub const ALL_COMMANDS: &[Command] = &[
    Command::NextImage,
    Command::PreviousImage,
    Command::Close,
    Command::ToggleTagMode,
    Command::ClearSelection,
    Command::ToggleSearch,
    Command::ToggleQuality,
    Command::OpenUploader,
];

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::NextImage => "next-image",
            Command::PreviousImage => "previous-image",
            Command::Close => "close",
            Command::ToggleTagMode => "toggle-tag-mode",
            Command::ClearSelection => "clear-selection",
            Command::ToggleSearch => "toggle-search",
            Command::ToggleQuality => "toggle-quality",
            Command::OpenUploader => "open-uploader",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        // "escape" is accepted as an alias for close.
        if name.eq_ignore_ascii_case("escape") {
            return Ok(Command::Close);
        }
        ALL_COMMANDS
            .iter()
            .copied()
            .find(|command| command.name() == name)
            .ok_or_else(|| CoreError::Validation(format!("Unknown command '{name}'")))
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// A key press as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key name in DOM `KeyboardEvent.key` style, e.g. `ArrowRight`, `t`.
    pub key: String,
    /// The key was pressed while a text field had focus.
    pub in_text_input: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            in_text_input: false,
        }
    }

    pub fn in_text_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }
}

/// Default key bindings.
pub const DEFAULT_BINDINGS: &[(&str, Command)] = &[
    ("ArrowRight", Command::NextImage),
    ("ArrowLeft", Command::PreviousImage),
    ("Escape", Command::Close),
    ("t", Command::ToggleTagMode),
    ("c", Command::ClearSelection),
    ("/", Command::ToggleSearch),
    ("q", Command::ToggleQuality),
    ("u", Command::OpenUploader),
];

/// Map a key press to a command.
///
/// Keys typed into a text field belong to that field, so only `Escape`
/// is honoured there.
pub fn command_for_key(event: &KeyEvent) -> Option<Command> {
    let command = DEFAULT_BINDINGS
        .iter()
        .find(|(key, _)| *key == event.key)
        .map(|(_, command)| *command)?;
    if event.in_text_input && command != Command::Close {
        return None;
    }
    Some(command)
}
