use crate::agent::ui;
use crate::config::Config;

pub fn handle_show(config: &Config, session: &str, limit: Option<usize>) -> crate::Result<()> {
    let history = super::open_stored(config, session)?;
    ui::print_history(history.show_history(limit), history.len());
    println!("{}", history.status());
    Ok(())
}
