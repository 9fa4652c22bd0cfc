//! Terminal UI components for the consultation screen

pub mod chat;
pub mod commands;
pub mod composer;
pub mod disclaimer;
pub mod session_list;

pub use chat::ChatView;
pub use commands::{get_help_text, parse_slash_command, SlashCommand};
pub use composer::{Composer, ComposerResult};
pub use disclaimer::DisclaimerOverlay;
pub use session_list::{SessionEntry, SessionList};
