//! Slash command definitions
//!
//! Lines starting with `/` are commands; anything else is a chat turn.
//! Arguments follow the command name on the same line, e.g. `/temp 0.3`.

/// A slash command definition
#[derive(Clone)]
pub struct SlashCommand {
    /// Command name (without the /)
    pub name: &'static str,
    /// Short alias (e.g., "h" for "help")
    pub alias: Option<&'static str>,
    /// Argument hint shown in help
    pub args: &'static str,
    /// Description shown in help
    pub description: &'static str,
}

/// All available slash commands
pub const SLASH_COMMANDS: &[SlashCommand] = &[
    SlashCommand {
        name: "show",
        alias: Some("s"),
        args: "[N]",
        description: "Show the last N messages (default 10, 0 for all)",
    },
    SlashCommand {
        name: "sessions",
        alias: Some("ls"),
        args: "",
        description: "List saved sessions",
    },
    SlashCommand {
        name: "new",
        alias: Some("n"),
        args: "[NAME]",
        description: "Start a new session",
    },
    SlashCommand {
        name: "load",
        alias: Some("l"),
        args: "NAME",
        description: "Load a saved session",
    },
    SlashCommand {
        name: "export",
        alias: Some("e"),
        args: "[FILE]",
        description: "Export the history to a text file",
    },
    SlashCommand {
        name: "clear",
        alias: Some("c"),
        args: "",
        description: "Clear the current history",
    },
    SlashCommand {
        name: "temp",
        alias: Some("t"),
        args: "VALUE",
        description: "Set the response temperature (0-2)",
    },
    SlashCommand {
        name: "max",
        alias: Some("m"),
        args: "[N]",
        description: "Set the response token limit (no value removes it)",
    },
    SlashCommand {
        name: "limit",
        alias: None,
        args: "[N]",
        description: "Set the auto-compaction threshold (at least 4)",
    },
    SlashCommand {
        name: "tokens",
        alias: None,
        args: "",
        description: "Show session token statistics",
    },
    SlashCommand {
        name: "system",
        alias: None,
        args: "[TEXT]",
        description: "Replace the system prompt (no text clears it)",
    },
    SlashCommand {
        name: "tools",
        alias: None,
        args: "",
        description: "List tools from the MCP server",
    },
    SlashCommand {
        name: "help",
        alias: Some("h"),
        args: "",
        description: "Show available commands",
    },
    SlashCommand {
        name: "exit",
        alias: Some("q"),
        args: "",
        description: "Exit the chat",
    },
];

/// Messages shown by `/show` when no count is given
pub const DEFAULT_SHOW_LIMIT: usize = 10;

/// A parsed slash command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `None` shows everything
    Show(Option<usize>),
    Sessions,
    New(Option<String>),
    Load(String),
    Export(Option<String>),
    Clear,
    Temperature(f64),
    MaxTokens(Option<u32>),
    /// `None` reports the current threshold
    Limit(Option<usize>),
    Tokens,
    SystemPrompt(Option<String>),
    Tools,
    Help,
    Exit,
}

/// Find a command by name or alias
pub fn find_command(name: &str) -> Option<&'static SlashCommand> {
    let name = name.to_lowercase();
    SLASH_COMMANDS
        .iter()
        .find(|cmd| cmd.name == name || cmd.alias == Some(name.as_str()))
}

/// Parse a line of input
///
/// Returns `None` for chat text, `Some(Err(..))` for an unknown command or
/// bad arguments.
pub fn parse_command(input: &str) -> Option<Result<Command, String>> {
    let line = input.trim();
    let rest = line.strip_prefix('/')?;

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };

    let Some(cmd) = find_command(name) else {
        return Some(Err(format!(
            "Unknown command: /{}. Type /help for the list of commands",
            name
        )));
    };

    Some(build(cmd.name, arg))
}

fn build(name: &str, arg: Option<&str>) -> Result<Command, String> {
    let owned = || arg.map(str::to_string);

    match name {
        "show" => match arg {
            None => Ok(Command::Show(Some(DEFAULT_SHOW_LIMIT))),
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => Ok(Command::Show(None)),
                Ok(n) => Ok(Command::Show(Some(n))),
                Err(_) => Err(format!("Invalid count: {}", raw)),
            },
        },
        "sessions" => Ok(Command::Sessions),
        "new" => Ok(Command::New(owned())),
        "load" => arg
            .map(|a| Command::Load(a.to_string()))
            .ok_or_else(|| "Usage: /load NAME".to_string()),
        "export" => Ok(Command::Export(owned())),
        "clear" => Ok(Command::Clear),
        "temp" => {
            let raw = arg.ok_or_else(|| "Usage: /temp VALUE (0-2)".to_string())?;
            raw.parse::<f64>()
                .ok()
                .filter(|v| (0.0..=2.0).contains(v))
                .map(Command::Temperature)
                .ok_or_else(|| format!("Invalid temperature: {}. Enter a number from 0 to 2", raw))
        }
        "max" => match arg {
            None => Ok(Command::MaxTokens(None)),
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .map(|n| Command::MaxTokens(Some(n)))
                .ok_or_else(|| format!("Invalid token limit: {}. Enter a positive integer", raw)),
        },
        "limit" => match arg {
            None => Ok(Command::Limit(None)),
            Some(raw) => raw
                .parse::<usize>()
                .map(|n| Command::Limit(Some(n)))
                .map_err(|_| format!("Invalid threshold: {}. Enter an integer of at least 4", raw)),
        },
        "tokens" => Ok(Command::Tokens),
        "system" => Ok(Command::SystemPrompt(owned())),
        "tools" => Ok(Command::Tools),
        "help" => Ok(Command::Help),
        "exit" => Ok(Command::Exit),
        other => Err(format!("Unknown command: /{}", other)),
    }
}
