//! Slash command parsing for the chat application.
//!
//! Input that starts with `/` controls the client and is never posted to
//! the endpoint.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Redraw the gauges.
    Gauges,

    /// Redraw the whole transcript.
    History,

    /// Report how many requests are still in flight.
    Pending,

    /// Probe the service's health endpoint.
    Status,

    /// Show the configured endpoint.
    Endpoint,

    /// Export the transcript to a file.
    Save(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a prompt.
///
/// # Examples
///
/// ```
/// # use emochat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/save transcript.json").is_some());
/// assert!(parse_command("How do you feel?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "gauges" | "state" => ChatCommand::Gauges,
        "history" => ChatCommand::History,
        "pending" => ChatCommand::Pending,
        "status" | "health" => ChatCommand::Status,
        "endpoint" => ChatCommand::Endpoint,
        "save" => match argument {
            Some(path) => ChatCommand::Save(path.to_string()),
            None => ChatCommand::Invalid("/save requires a file path".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "" => ChatCommand::Invalid("Empty command. Type /help for commands.".to_string()),
        other => ChatCommand::Invalid(format!(
            "Unknown command: /{other}. Type /help for commands."
        )),
    };
    Some(result)
}

/// Returns the help text for all commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /gauges                Show the current emotional gauges
  /history               Show the conversation so far
  /pending               Show how many prompts await a reply
  /status                Check that the service is up
  /endpoint              Show the endpoint prompts are sent to
  /save <file>           Save the transcript as JSON
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_display_commands() {
        assert_eq!(parse_command("/gauges"), Some(ChatCommand::Gauges));
        assert_eq!(parse_command("/STATE"), Some(ChatCommand::Gauges));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/pending"), Some(ChatCommand::Pending));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Status));
        assert_eq!(parse_command("/endpoint"), Some(ChatCommand::Endpoint));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn parse_save() {
        assert_eq!(
            parse_command("/save  out/chat.json "),
            Some(ChatCommand::Save("out/chat.json".to_string()))
        );
        assert!(matches!(
            parse_command("/save"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn regular_text_is_not_a_command() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("what about a/b?"), None);
    }

    #[test]
    fn unknown_command_is_invalid() {
        match parse_command("/model gpt") {
            Some(ChatCommand::Invalid(message)) => assert!(message.contains("/model")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(parse_command("/"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/gauges"));
        assert!(help.contains("/save"));
    }
}
