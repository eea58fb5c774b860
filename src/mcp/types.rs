//! Tool-discovery wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method: method.into(),
            params,
        }
    }
}

/// A tool advertised by the discovery service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "inputSchema", alias = "input_schema")]
    pub input_schema: Option<ToolSchema>,
}

impl McpTool {
    /// Parameters in name order, with whether each is required
    pub fn parameters(&self) -> Vec<(&str, &ToolParam, bool)> {
        self.input_schema
            .as_ref()
            .map(|schema| {
                schema
                    .properties
                    .iter()
                    .map(|(name, param)| (name.as_str(), param, schema.required.contains(name)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// JSON Schema subset describing a tool's arguments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(default)]
    pub properties: BTreeMap<String, ToolParam>,
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolParam {
    #[serde(default, rename = "type")]
    pub kind: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ToolParam {
    /// Type name for display; unions are joined with `|`
    pub fn type_name(&self) -> String {
        match &self.kind {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("|"),
            _ => "any".to_string(),
        }
    }
}
