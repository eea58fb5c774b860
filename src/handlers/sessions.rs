use crate::agent::persistence::SessionStore;
use crate::agent::ui;
use crate::config::Config;

pub fn handle_sessions(config: &Config) -> crate::Result<()> {
    let store = SessionStore::open(&config.history.dir)?;
    let sessions = store.list_sessions()?;
    ui::print_sessions(&sessions, None);
    Ok(())
}
