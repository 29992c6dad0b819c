//! Terminal UI components

pub mod commands;
pub mod terminal;

pub use commands::{SlashCommand, get_help_text, parse_slash_command};
pub use terminal::TerminalView;
