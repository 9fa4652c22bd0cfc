use std::str::FromStr;

use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start a new consultation session
    New,
    /// Show the medical disclaimer again
    Disclaimer,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub keyword: &'static str,
    pub description: &'static str,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            keyword: command.keyword(),
            description: command.description(),
        })
        .collect()
}

impl SlashCommand {
    /// User-visible description shown in help and the command palette.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::New => "start a new consultation",
            SlashCommand::Disclaimer => "show the medical disclaimer",
            SlashCommand::Help => "show available commands",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn keyword(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let rest = input.strip_prefix('/')?;
    let head = rest.split_whitespace().next()?;

    SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "n" => Some(SlashCommand::New),
            "d" => Some(SlashCommand::Disclaimer),
            "h" => Some(SlashCommand::Help),
            "q" | "exit" | "bye" => Some(SlashCommand::Quit),
            _ => None,
        })
}

/// One-line help summary, shown in the status bar
pub fn get_help_text() -> String {
    let parts: Vec<String> = SlashCommand::iter()
        .map(|command| format!("/{} — {}", command.keyword(), command.description()))
        .collect();
    parts.join("   ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_keywords() {
        assert_eq!(parse_slash_command("/new"), Some(SlashCommand::New));
        assert_eq!(parse_slash_command("/disclaimer"), Some(SlashCommand::Disclaimer));
        assert_eq!(parse_slash_command("/help"), Some(SlashCommand::Help));
        assert_eq!(parse_slash_command("/quit"), Some(SlashCommand::Quit));
    }

    #[test]
    fn parses_aliases() {
        assert_eq!(parse_slash_command("/n"), Some(SlashCommand::New));
        assert_eq!(parse_slash_command("/q"), Some(SlashCommand::Quit));
        assert_eq!(parse_slash_command("/bye"), Some(SlashCommand::Quit));
    }

    #[test]
    fn ignores_plain_messages_and_unknown_commands() {
        assert_eq!(parse_slash_command("my eyes are red"), None);
        assert_eq!(parse_slash_command("/unknown"), None);
        assert_eq!(parse_slash_command("/"), None);
    }
}
