//! MCP Service - Core JSON-RPC 2.0 request handler.

use crate::mcp::prompts::{self, PromptTemplate};
use crate::mcp::resources::{self, ResourceTemplate, SheetUri};
use crate::mcp::rpc::{self, OutboundResponse, RpcRequest};
use crate::mcp::tools::{ToolDescriptor, ToolRegistry};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_TITLE: &str = "Google Sheets & Forms MCP Server";

/// Core MCP request handler.
#[derive(Clone)]
pub struct McpService {
    registry: Arc<ToolRegistry>,
}

impl McpService {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Handle one raw JSON-RPC message; `None` means nothing is sent back.
    pub async fn handle_message(&self, raw: &str) -> Option<OutboundResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!("discarding unparseable message: {}", err);
                return Some(OutboundResponse::parse_error(format!(
                    "Parse error: {}",
                    err
                )));
            }
        };

        let id = value.get("id").cloned();
        match serde_json::from_value::<RpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(err) => Some(OutboundResponse::invalid_request(
                id,
                format!("Invalid request: {}", err),
            )),
        }
    }

    pub async fn handle_request(&self, request: RpcRequest) -> Option<OutboundResponse> {
        if request.jsonrpc != "2.0" {
            warn!("received unsupported jsonrpc version: {}", request.jsonrpc);
            return Some(OutboundResponse::invalid_request(
                request.id.clone(),
                "Unsupported jsonrpc version (expected 2.0)",
            ));
        }

        let notification = request.is_notification();
        let RpcRequest {
            method, params, id, ..
        } = request;
        debug!("routing {}", method);

        let response = match method.as_str() {
            "initialize" => self.handle_initialize(id, params),
            "ping" => OutboundResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, params).await,
            "resources/list" => self.handle_resources_list(id),
            "resources/templates/list" => self.handle_resource_templates_list(id),
            "resources/read" => self.handle_resources_read(id, params).await,
            "prompts/list" => self.handle_prompts_list(id),
            "prompts/get" => self.handle_prompts_get(id, params),
            method if method.starts_with("notifications/") => {
                info!("received client notification: {}", method);
                return None;
            }
            other => OutboundResponse::method_not_found(id, other),
        };

        if notification {
            debug!("dropping response to notification {}", method);
            return None;
        }
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>, params: Option<Value>) -> OutboundResponse {
        let parsed: InitializeParams = match parse_params(params) {
            Ok(value) => value,
            Err(message) => return OutboundResponse::invalid_params(id, message),
        };

        let client = parsed.client_info.unwrap_or_default();
        info!(
            "client requested initialization: {} v{} (protocol {})",
            client.name.as_deref().unwrap_or("unknown"),
            client.version.as_deref().unwrap_or("unknown"),
            parsed.protocol_version.as_deref().unwrap_or("unspecified")
        );

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            server_info: ImplementationInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some(SERVER_TITLE.to_string()),
            },
            capabilities: ServerCapabilities {
                tools: ListChangedCapability {
                    list_changed: false,
                },
                resources: ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                },
                prompts: ListChangedCapability {
                    list_changed: false,
                },
            },
        };

        success(id, &result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> OutboundResponse {
        let payload = ListToolsResult {
            tools: self.registry.list_tools(),
            next_cursor: None,
        };
        success(id, &payload)
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> OutboundResponse {
        let parsed: CallToolParams = match parse_params(params) {
            Ok(value) => value,
            Err(message) => return OutboundResponse::invalid_params(id, message),
        };

        let result = self.registry.call_tool(&parsed.name, parsed.arguments).await;
        success(id, &result)
    }

    fn handle_resources_list(&self, id: Option<Value>) -> OutboundResponse {
        let payload = ListResourcesResult {
            resources: Vec::new(),
            next_cursor: None,
        };
        success(id, &payload)
    }

    fn handle_resource_templates_list(&self, id: Option<Value>) -> OutboundResponse {
        let payload = ResourceTemplateListResult {
            resource_templates: vec![resources::sheet_template()],
            next_cursor: None,
        };
        success(id, &payload)
    }

    async fn handle_resources_read(
        &self,
        id: Option<Value>,
        params: Option<Value>,
    ) -> OutboundResponse {
        let parsed: ResourceReadParams = match parse_params(params) {
            Ok(value) => value,
            Err(message) => return OutboundResponse::invalid_params(id, message),
        };

        let Some(target) = SheetUri::parse(&parsed.uri) else {
            return OutboundResponse::error_with_data(
                id,
                rpc::RESOURCE_NOT_FOUND,
                format!("Resource '{}' not found", parsed.uri),
                json!({ "uri": parsed.uri }),
            );
        };

        info!(
            "reading sheet resource {} ({})",
            target.spreadsheet_id, target.range_name
        );
        match self
            .registry
            .fetch_values(&target.spreadsheet_id, &target.range_name)
            .await
        {
            Ok(values) => {
                let payload = ResourceReadResult {
                    contents: vec![ResourceContents {
                        uri: parsed.uri,
                        mime_type: resources::TEXT_MIME_TYPE.to_string(),
                        text: resources::render_grid(&values),
                    }],
                };
                success(id, &payload)
            }
            Err(err) => {
                warn!("resource read failed for {}: {}", parsed.uri, err);
                OutboundResponse::error(
                    id,
                    rpc::SERVER_ERROR,
                    format!("Failed to read '{}': {}", parsed.uri, err),
                )
            }
        }
    }

    fn handle_prompts_list(&self, id: Option<Value>) -> OutboundResponse {
        let payload = PromptListResult {
            prompts: prompts::PROMPTS.iter().map(PromptDescriptor::from).collect(),
            next_cursor: None,
        };
        success(id, &payload)
    }

    fn handle_prompts_get(&self, id: Option<Value>, params: Option<Value>) -> OutboundResponse {
        let parsed: PromptGetParams = match parse_params(params) {
            Ok(value) => value,
            Err(message) => return OutboundResponse::invalid_params(id, message),
        };

        let Some(prompt) = prompts::find(&parsed.name) else {
            return OutboundResponse::invalid_params(
                id,
                format!("Prompt '{}' is not available.", parsed.name),
            );
        };

        let payload = PromptGetResult {
            description: prompt.description.to_string(),
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: PromptContent {
                    content_type: "text".to_string(),
                    text: prompt.text.to_string(),
                },
            }],
        };
        success(id, &payload)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct InitializeParams {
    #[serde(rename = "protocolVersion", default)]
    protocol_version: Option<String>,
    #[serde(rename = "clientInfo", default)]
    client_info: Option<ClientInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct ClientInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Serialize)]
struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    protocol_version: String,
    #[serde(rename = "serverInfo")]
    server_info: ImplementationInfo,
    capabilities: ServerCapabilities,
}

#[derive(Debug, Serialize)]
struct ImplementationInfo {
    name: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

#[derive(Debug, Serialize)]
struct ServerCapabilities {
    tools: ListChangedCapability,
    resources: ResourcesCapability,
    prompts: ListChangedCapability,
}

#[derive(Debug, Serialize)]
struct ListChangedCapability {
    #[serde(rename = "listChanged")]
    list_changed: bool,
}

#[derive(Debug, Serialize)]
struct ResourcesCapability {
    subscribe: bool,
    #[serde(rename = "listChanged")]
    list_changed: bool,
}

#[derive(Debug, Serialize)]
struct ListToolsResult {
    tools: Vec<ToolDescriptor>,
    #[serde(rename = "nextCursor")]
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ListResourcesResult {
    resources: Vec<Value>,
    #[serde(rename = "nextCursor")]
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResourceTemplateListResult {
    #[serde(rename = "resourceTemplates")]
    resource_templates: Vec<ResourceTemplate>,
    #[serde(rename = "nextCursor")]
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    uri: String,
}

#[derive(Debug, Serialize)]
struct ResourceReadResult {
    contents: Vec<ResourceContents>,
}

#[derive(Debug, Serialize)]
struct ResourceContents {
    uri: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct PromptListResult {
    prompts: Vec<PromptDescriptor>,
    #[serde(rename = "nextCursor")]
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct PromptDescriptor {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    arguments: Vec<Value>,
}

impl From<&PromptTemplate> for PromptDescriptor {
    fn from(prompt: &PromptTemplate) -> Self {
        Self {
            name: prompt.name.to_string(),
            description: Some(prompt.description.to_string()),
            arguments: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PromptGetParams {
    name: String,
}

#[derive(Debug, Serialize)]
struct PromptGetResult {
    description: String,
    messages: Vec<PromptMessage>,
}

#[derive(Debug, Serialize)]
struct PromptMessage {
    role: String,
    content: PromptContent,
}

#[derive(Debug, Serialize)]
struct PromptContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    let value = match params {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(value) => value,
    };
    serde_json::from_value(value).map_err(|err| err.to_string())
}

fn success<T: Serialize>(id: Option<Value>, payload: &T) -> OutboundResponse {
    match serde_json::to_value(payload) {
        Ok(result) => OutboundResponse::success(id, result),
        Err(err) => OutboundResponse::error(
            id,
            rpc::SERVER_ERROR,
            format!("Failed to encode result: {}", err),
        ),
    }
}
