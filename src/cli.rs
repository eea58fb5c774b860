use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "parley")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Console chat client with persistent, self-compacting history")]
#[command(long_about = "Chat with an OpenAI-compatible completion API from the terminal. Sessions are saved as JSON after every change, and older turns are folded into a summary once the history grows past a configurable threshold.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding session files (overrides the config)
    #[arg(long, global = true, value_name = "DIR", env = "PARLEY_HISTORY_DIR")]
    pub history_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Start an interactive chat (default)
    Chat {
        /// Resume a saved session
        #[arg(short, long, value_name = "NAME", conflicts_with = "new")]
        session: Option<String>,

        /// Start a new session with this name
        #[arg(long, value_name = "NAME")]
        new: Option<String>,

        /// System prompt for a new session
        #[arg(long, value_name = "TEXT")]
        system_prompt: Option<String>,

        /// Compact history once it holds more than this many messages
        #[arg(long, value_name = "N")]
        compress_after: Option<usize>,

        /// Model to chat with
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List saved sessions, newest first
    Sessions,

    /// Print the history of a saved session
    Show {
        /// Session name
        #[arg(value_name = "SESSION")]
        session: String,

        /// Show only the last N messages
        #[arg(short = 'n', long, value_name = "N")]
        limit: Option<usize>,
    },

    /// Export a saved session as a text transcript
    Export {
        /// Session name
        #[arg(value_name = "SESSION")]
        session: String,

        /// Output file; relative names land in the history directory
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,
    },

    /// List tools exposed by an MCP server
    Tools {
        /// Server URL (overrides the config)
        #[arg(long)]
        url: Option<String>,

        /// Show only this tool
        #[arg(long, value_name = "TOOL")]
        name: Option<String>,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Chat {
            session: None,
            new: None,
            system_prompt: None,
            compress_after: None,
            model: None,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        let level = if self.quiet {
            log::LevelFilter::Error
        } else {
            match self.verbose {
                0 => log::LevelFilter::Warn,
                1 => log::LevelFilter::Info,
                2 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            }
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_chat() {
        let cli = Cli::try_parse_from(["parley"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.command.unwrap_or_default(), Commands::default());
    }

    #[test]
    fn test_chat_flags() {
        let cli = Cli::try_parse_from([
            "parley",
            "chat",
            "--session",
            "work",
            "--compress-after",
            "6",
            "-m",
            "sonar",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Chat {
                session,
                compress_after,
                model,
                ..
            }) => {
                assert_eq!(session.as_deref(), Some("work"));
                assert_eq!(compress_after, Some(6));
                assert_eq!(model.as_deref(), Some("sonar"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_session_and_new_conflict() {
        assert!(Cli::try_parse_from(["parley", "chat", "--session", "a", "--new", "b"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["parley", "show", "work", "-n", "3", "-vv", "--history-dir", "h"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.history_dir, Some(PathBuf::from("h")));
        assert_eq!(
            cli.command,
            Some(Commands::Show {
                session: "work".to_string(),
                limit: Some(3)
            })
        );
    }
}
