//! Tool-discovery client
//!
//! Asks a tool server which tools it exposes. Servers disagree on the
//! transport, so several routes are tried in order:
//! - JSON-RPC `tools/list` posted to `/mcp`
//! - plain GETs on `/tools`, `/mcp/tools` and `/api/tools`
//! - a GET on `/sse/tools`
//!
//! The result is informational only; nothing in the chat history depends on it.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use super::types::{JsonRpcRequest, McpTool};
use super::{DiscoveryError, Result};
use crate::config::McpConfig;

const USER_AGENT: &str = concat!("parley/", env!("CARGO_PKG_VERSION"));

const DIRECT_ENDPOINTS: [&str; 3] = ["/tools", "/mcp/tools", "/api/tools"];
const SSE_ENDPOINT: &str = "/sse/tools";

/// Client for a tool-discovery server
pub struct McpClient {
    http_client: Client,
    base_url: String,
}

impl McpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &McpConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a JSON-RPC call to `{base}/mcp` and return the raw response body
    pub fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let url = format!("{}/mcp", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&JsonRpcRequest::new(method, params))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json::<Value>()
            .map_err(|e| DiscoveryError::ParseError(e.to_string()))
    }

    /// List the tools the server exposes
    ///
    /// Routes are tried in order; the first non-empty list wins. If every route
    /// answered with an empty list the result is empty; if any failed, the last
    /// failure is returned.
    pub fn list_tools(&self) -> Result<Vec<McpTool>> {
        let attempts: [fn(&Self) -> Result<Vec<McpTool>>; 3] =
            [Self::try_jsonrpc, Self::try_direct, Self::try_sse];

        let mut last_error = None;
        for attempt in attempts {
            match attempt(self) {
                Ok(tools) if !tools.is_empty() => return Ok(tools),
                Ok(_) => {}
                Err(e) => {
                    log::debug!("Tool discovery route failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    /// Find one tool by name
    pub fn get_tool_info(&self, name: &str) -> Result<Option<McpTool>> {
        Ok(self.list_tools()?.into_iter().find(|t| t.name == name))
    }

    /// Check whether the server answers on `/` or `/health`
    pub fn test_connection(&self) -> bool {
        ["/", "/health"].iter().any(|path| {
            let url = format!("{}{}", self.base_url, path);
            match self.http_client.get(&url).send() {
                Ok(response) => response.status().is_success(),
                Err(e) => {
                    log::debug!("GET {} failed: {}", url, e);
                    false
                }
            }
        })
    }

    fn try_jsonrpc(&self) -> Result<Vec<McpTool>> {
        let body = self.call("tools/list", None)?;
        parse_rpc_tools(body)
    }

    fn try_direct(&self) -> Result<Vec<McpTool>> {
        for endpoint in DIRECT_ENDPOINTS {
            match self.get_tools(endpoint) {
                Ok(tools) => return Ok(tools),
                Err(e) => log::debug!("GET {} failed: {}", endpoint, e),
            }
        }
        Err(DiscoveryError::Unavailable(format!(
            "no tool listing at {}",
            DIRECT_ENDPOINTS.join(", ")
        )))
    }

    fn try_sse(&self) -> Result<Vec<McpTool>> {
        self.get_tools(SSE_ENDPOINT).map_err(|e| {
            DiscoveryError::Unavailable(format!("no tool listing at {}: {}", SSE_ENDPOINT, e))
        })
    }

    fn get_tools(&self, endpoint: &str) -> Result<Vec<McpTool>> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.http_client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let body = response
            .json::<Value>()
            .map_err(|e| DiscoveryError::ParseError(e.to_string()))?;
        Ok(parse_tool_list(&body))
    }
}

/// Interpret a `tools/list` response body
///
/// Accepts `result` as a list or as an object with `tools`, a JSON-RPC
/// `error`, or a non-standard body that is itself a list or has `tools`.
pub fn parse_rpc_tools(body: Value) -> Result<Vec<McpTool>> {
    if let Some(result) = body.get("result") {
        return Ok(parse_tool_list(result));
    }
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(DiscoveryError::Rpc(message.to_string()));
    }
    Ok(parse_tool_list(&body))
}

/// Extract tools from a bare list or an object with a `tools` field
pub fn parse_tool_list(value: &Value) -> Vec<McpTool> {
    let items: &[Value] = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("tools") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<McpTool>(item.clone()) {
            Ok(tool) => Some(tool),
            Err(e) => {
                log::debug!("Skipping malformed tool entry: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> McpClient {
        McpClient::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parse_result_list() {
        let tools = parse_rpc_tools(json!({"jsonrpc": "2.0", "id": 1, "result": [{"name": "a"}]})).unwrap();
        assert_eq!(tools[0].name, "a");
    }

    #[test]
    fn test_parse_result_object() {
        let body = json!({"result": {"tools": [{"name": "a"}, {"name": "b", "description": "B"}]}});
        let tools = parse_rpc_tools(body).unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[1].description.as_deref(), Some("B"));
    }

    #[test]
    fn test_parse_rpc_error() {
        let err = parse_rpc_tools(json!({"error": {"code": -32601, "message": "Method not found"}})).unwrap_err();
        assert!(matches!(err, DiscoveryError::Rpc(m) if m == "Method not found"));
    }

    #[test]
    fn test_parse_nonstandard_bodies() {
        assert_eq!(parse_rpc_tools(json!([{"name": "x"}])).unwrap().len(), 1);
        assert_eq!(parse_rpc_tools(json!({"tools": [{"name": "y"}]})).unwrap().len(), 1);
        assert!(parse_rpc_tools(json!({"status": "ok"})).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let tools = parse_tool_list(&json!([{"name": "ok"}, {"description": "no name"}, 42]));
        assert_eq!(tools.len(), 1);
    }

    #[test]
    fn test_list_tools_over_jsonrpc() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/mcp")
            .match_body(Matcher::PartialJson(json!({"jsonrpc": "2.0", "method": "tools/list"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[{"name":"create_issue"}]}}"#)
            .expect(3)
            .create();

        let client = client_for(&server);
        let tools = client.list_tools().unwrap();
        assert_eq!(tools[0].name, "create_issue");
        assert!(client.get_tool_info("create_issue").unwrap().is_some());
        assert!(client.get_tool_info("missing").unwrap().is_none());
        mock.assert();
    }

    #[test]
    fn test_list_tools_falls_back_to_direct_endpoint() {
        let mut server = mockito::Server::new();
        let _rpc = server.mock("POST", "/mcp").with_status(404).create();
        let _tools = server.mock("GET", "/tools").with_status(500).create();
        let _mcp_tools = server
            .mock("GET", "/mcp/tools")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name":"list_branches","description":"List branches"}]"#)
            .create();

        let tools = client_for(&server).list_tools().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "list_branches");
    }

    #[test]
    fn test_list_tools_reports_last_failure() {
        let server = mockito::Server::new();
        let client = client_for(&server);
        assert!(client.list_tools().is_err());
        assert!(!client.test_connection());
    }

    #[test]
    fn test_connection_accepts_health_route() {
        let mut server = mockito::Server::new();
        let _health = server.mock("GET", "/health").with_status(200).create();
        assert!(client_for(&server).test_connection());
    }
}
