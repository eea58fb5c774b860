use crate::agent::ui;
use crate::config::Config;

pub fn handle_export(config: &Config, session: &str, output: Option<&str>) -> crate::Result<()> {
    let history = super::open_stored(config, session)?;
    let path = history.export(output)?;
    ui::print_success(&format!(
        "Exported {} messages to {}",
        history.len(),
        path.display()
    ));
    Ok(())
}
