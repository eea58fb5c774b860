//! # parley
//!
//! A console chat client for OpenAI-compatible completion APIs with
//! persistent, self-compacting conversation history.
//!
//! ## Features
//!
//! - **Persistent Sessions**: Each session is a JSON document rewritten after every change
//! - **History Compaction**: Older turns are folded into one summary message once the
//!   history passes a threshold, keeping the most recent turns verbatim
//! - **Pluggable Summarizer**: Model-backed, custom function, or a local fallback digest
//! - **Tool Discovery**: Lists tools exposed by an MCP server
//!
//! ## Example
//!
//! ```rust,no_run
//! use parley::agent::compact::{CompactionPolicy, CompressAfter, Summarizer};
//! use parley::agent::history::{ChatHistory, SessionDefaults};
//! use parley::agent::message::Role;
//! use parley::agent::persistence::SessionStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SessionStore::open("chat_history")?;
//! let summarizer = Summarizer::with_fn(|messages| Ok(format!("{} earlier messages", messages.len())));
//! let defaults = SessionDefaults {
//!     compress_after: CompressAfter::new(6)?,
//!     ..Default::default()
//! };
//! let mut history = ChatHistory::start(store, CompactionPolicy::new(summarizer), &defaults, Some("demo"))?;
//! history.append(Role::User, "hello", None)?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mcp;
pub mod provider;

pub use error::{ChatError, Result};
use cli::Commands;
use config::Config;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Chat {
            session,
            new,
            system_prompt,
            compress_after,
            model,
        } => handlers::handle_chat(
            config,
            handlers::ChatOptions {
                session,
                new,
                system_prompt,
                compress_after,
                model,
            },
        ),
        Commands::Sessions => handlers::handle_sessions(&config),
        Commands::Show { session, limit } => handlers::handle_show(&config, &session, limit),
        Commands::Export { session, output } => {
            handlers::handle_export(&config, &session, output.as_deref())
        }
        Commands::Tools { url, name } => {
            handlers::handle_tools(&config.mcp, url.as_deref(), name.as_deref())
        }
    }
}
