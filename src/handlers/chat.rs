use crate::agent::compact::CompressAfter;
use crate::agent::history::HistoryError;
use crate::agent::{self, SessionChoice};
use crate::config::Config;

/// Command-line overrides for an interactive chat
#[derive(Debug, Default, Clone)]
pub struct ChatOptions {
    pub session: Option<String>,
    pub new: Option<String>,
    pub system_prompt: Option<String>,
    pub compress_after: Option<usize>,
    pub model: Option<String>,
}

pub fn handle_chat(mut config: Config, options: ChatOptions) -> crate::Result<()> {
    apply_overrides(&mut config, &options)?;

    let choice = match options.session {
        Some(name) => SessionChoice::Resume(name),
        None => SessionChoice::New(options.new),
    };
    log::debug!("Starting chat with {:?}", choice);

    agent::run_interactive(&config, &choice)?;
    Ok(())
}

fn apply_overrides(config: &mut Config, options: &ChatOptions) -> crate::Result<()> {
    if let Some(model) = &options.model {
        config.chat.model = model.clone();
    }
    if let Some(prompt) = &options.system_prompt {
        config.chat.system_prompt = Some(prompt.clone()).filter(|p| !p.trim().is_empty());
    }
    if let Some(value) = options.compress_after {
        config.history.compress_after = CompressAfter::new(value).map_err(HistoryError::from)?;
    }
    Ok(())
}
