//! Tool registry - central routing for MCP tools.
//!
//! Every tool is a [`ToolSpec`]: a descriptor, an argument parser producing a
//! [`RemoteOp`] and a renderer turning the remote JSON into text. One helper
//! drives them all: acquire a credential, execute the operation, render.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::CredentialSource;
use crate::error::{Error, RemoteError};
use crate::google::{RemoteBackend, RemoteOp, Service};
use crate::mcp::content::ToolResult;

use super::{drive, forms, sheets};

/// Tool descriptor as advertised by `tools/list`.
#[derive(Debug, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub struct ToolSpec {
    pub name: &'static str,
    pub descriptor: fn() -> ToolDescriptor,
    pub prepare: fn(Option<Value>) -> Result<RemoteOp, String>,
    pub render: fn(Value) -> Result<String, String>,
}

fn builtin_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: drive::LIST_SPREADSHEETS_TOOL,
            descriptor: drive::list_spreadsheets_descriptor,
            prepare: drive::prepare_list_spreadsheets,
            render: drive::render_list_spreadsheets,
        },
        ToolSpec {
            name: sheets::READ_SHEET_TOOL,
            descriptor: sheets::read_sheet_descriptor,
            prepare: sheets::prepare_read_sheet,
            render: sheets::render_read_sheet,
        },
        ToolSpec {
            name: sheets::WRITE_SHEET_TOOL,
            descriptor: sheets::write_sheet_descriptor,
            prepare: sheets::prepare_write_sheet,
            render: sheets::render_write_sheet,
        },
        ToolSpec {
            name: sheets::APPEND_SHEET_TOOL,
            descriptor: sheets::append_sheet_descriptor,
            prepare: sheets::prepare_append_sheet,
            render: sheets::render_append_sheet,
        },
        ToolSpec {
            name: sheets::CREATE_SPREADSHEET_TOOL,
            descriptor: sheets::create_spreadsheet_descriptor,
            prepare: sheets::prepare_create_spreadsheet,
            render: sheets::render_create_spreadsheet,
        },
        ToolSpec {
            name: forms::CREATE_FORM_TOOL,
            descriptor: forms::create_form_descriptor,
            prepare: forms::prepare_create_form,
            render: forms::render_create_form,
        },
    ]
}

/// Central registry for all MCP tools. Immutable once built.
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
    credentials: Arc<dyn CredentialSource>,
    backend: Arc<dyn RemoteBackend>,
}

impl ToolRegistry {
    pub fn new(credentials: Arc<dyn CredentialSource>, backend: Arc<dyn RemoteBackend>) -> Self {
        Self {
            tools: builtin_tools(),
            credentials,
            backend,
        }
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|tool| (tool.descriptor)()).collect()
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name).collect()
    }

    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> ToolResult {
        let Some(tool) = self.tools.iter().find(|tool| tool.name == name) else {
            return ToolResult::error(format!(
                "Tool '{}' is not available. Available tools: {}",
                name,
                self.tool_names().join(", ")
            ));
        };

        let op = match (tool.prepare)(arguments) {
            Ok(op) => op,
            Err(err) => return ToolResult::error(err),
        };

        log::info!("Calling tool {} ({})", name, op.name());
        let response = match self.invoke(&op).await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("Tool {} failed: {}", name, err);
                return ToolResult::error(format!("{} failed: {}", name, err));
            }
        };

        match (tool.render)(response) {
            Ok(text) => ToolResult::success_text(text),
            Err(err) => ToolResult::error(err),
        }
    }

    /// Acquire a credential and run one remote operation with it.
    pub async fn invoke(&self, op: &RemoteOp) -> Result<Value, Error> {
        let credential = self.credentials.acquire().await?;
        let response = self.backend.execute(&credential, op).await?;
        Ok(response)
    }

    /// The `read_sheet` fetch, shared with the sheet resource.
    pub async fn fetch_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<Value>>, Error> {
        let op = RemoteOp::GetValues {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
        };
        let response = self.invoke(&op).await?;
        sheets::values_of(response).map_err(|reason| {
            Error::Remote(RemoteError::Decode {
                service: Service::Sheets.label(),
                reason,
            })
        })
    }
}

/// Missing or null arguments parse as an empty object so defaults apply.
pub fn parse_arguments<T: for<'de> Deserialize<'de>>(
    arguments: Option<Value>,
) -> Result<T, String> {
    let value = match arguments {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    };
    serde_json::from_value(value).map_err(|err| format!("Invalid arguments: {}", err))
}

pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("Failed to encode result: {}", err))
}
