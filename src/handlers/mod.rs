// Handler modules
pub mod chat;
pub mod export;
pub mod sessions;
pub mod show;
pub mod tools;

// Re-export all handler functions
pub use chat::{ChatOptions, handle_chat};
pub use export::handle_export;
pub use sessions::handle_sessions;
pub use show::handle_show;
pub use tools::handle_tools;

use crate::agent::compact::{CompactionPolicy, Summarizer};
use crate::agent::history::ChatHistory;
use crate::agent::persistence::SessionStore;
use crate::config::Config;

/// Open a stored session for read-only use; nothing is appended, so no summarizer is wired
fn open_stored(config: &Config, session: &str) -> crate::Result<ChatHistory> {
    let store = SessionStore::open(&config.history.dir)?;
    let policy = CompactionPolicy::new(Summarizer::unconfigured());
    Ok(ChatHistory::resume(store, policy, session)?)
}
