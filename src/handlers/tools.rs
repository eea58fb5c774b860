use crate::agent::ui;
use crate::config::McpConfig;
use crate::mcp::{DiscoveryError, McpClient};

pub fn handle_tools(config: &McpConfig, url: Option<&str>, name: Option<&str>) -> crate::Result<()> {
    let mut config = config.clone();
    if let Some(url) = url {
        config.base_url = url.to_string();
    }
    let client = McpClient::from_config(&config)?;

    let spinner = ui::Spinner::start("Querying MCP server...");
    let result = match name {
        Some(name) => client.get_tool_info(name).and_then(|tool| {
            tool.map(|t| vec![t])
                .ok_or_else(|| DiscoveryError::Unavailable(format!("no tool named '{}'", name)))
        }),
        None => client.list_tools(),
    };
    spinner.stop();

    match result {
        Ok(tools) => {
            ui::print_tools(&tools, client.base_url());
            Ok(())
        }
        Err(e) => {
            ui::print_info(&format!(
                "Check that the MCP server is running at {}",
                client.base_url()
            ));
            Err(e.into())
        }
    }
}
