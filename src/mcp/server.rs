//! MCP request loop.

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use crate::types::config::Config;
use crate::QaSphereResult;

use super::protocol::{
    CallToolParams, InitializeResult, JsonRpcError, JsonRpcId, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult,
};
use super::tools::ToolHandler;
use super::transport::{Incoming, LineTransport, StdioTransport, TrafficLog};

/// MCP server exposing the QA Sphere tools.
pub struct McpServer<R, W> {
    transport: LineTransport<R, W>,
    tools: ToolHandler,
    initialized: bool,
}

impl McpServer<std::io::BufReader<std::io::Stdin>, std::io::BufWriter<std::io::Stdout>> {
    /// Server on stdin/stdout, with the traffic log if one is configured.
    pub fn new(config: &Config) -> QaSphereResult<Self> {
        let mut transport = StdioTransport::stdio();
        if let Some(path) = &config.logging.traffic_log {
            let log = TrafficLog::open(path)?;
            tracing::info!(path = %log.path().display(), "Logging MCP traffic to file");
            transport = transport.with_traffic_log(log);
        }

        Ok(Self::with_transport(ToolHandler::new(config)?, transport))
    }
}

impl<R: BufRead, W: Write> McpServer<R, W> {
    pub fn with_transport(tools: ToolHandler, transport: LineTransport<R, W>) -> Self {
        Self {
            transport,
            tools,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn transport(&self) -> &LineTransport<R, W> {
        &self.transport
    }

    /// Serves requests until the client closes the input.
    pub async fn run(&mut self) -> QaSphereResult<()> {
        tracing::info!("QA Sphere MCP server started");

        loop {
            let incoming = match self.transport.read_message() {
                Ok(Some(incoming)) => incoming,
                Ok(None) => {
                    tracing::info!("Client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read message");
                    break;
                }
            };

            let response = match incoming {
                Incoming::Request(request) => {
                    let is_notification = request.is_notification();
                    let response = self.handle_request(request).await;
                    if is_notification {
                        continue;
                    }
                    response
                }
                Incoming::Malformed(error) => JsonRpcResponse::error(None, error),
            };

            if let Err(e) = self.transport.write_response(&response) {
                tracing::error!(error = %e, "Failed to write response");
            }
        }

        self.transport.close();
        tracing::info!("QA Sphere MCP server stopped");
        Ok(())
    }

    /// Handles one request. The caller drops the response for notifications.
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!(method = %request.method, "Handling request");

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "notifications/initialized" | "initialized" => {
                tracing::info!("Client initialization complete");
                JsonRpcResponse::success(request.id, json!({}))
            }
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "shutdown" => self.handle_shutdown(request),

            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,

            _ => JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(&request.method)),
        }
    }

    fn handle_initialize(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let client = request
            .params
            .as_ref()
            .and_then(|p| p.get("clientInfo"))
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        tracing::info!(client = client, "Client initializing connection");

        self.initialized = true;
        to_response(request.id, &InitializeResult::default())
    }

    fn handle_shutdown(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        tracing::info!("Client requested shutdown");
        self.initialized = false;
        JsonRpcResponse::success(request.id, Value::Null)
    }

    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let result = ListToolsResult {
            tools: self.tools.list_tools(),
        };
        to_response(request.id, &result)
    }

    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: CallToolParams = match request.params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        request.id,
                        JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params"),
                );
            }
        };

        tracing::info!(tool = %params.name, "Calling tool");

        let result = self
            .tools
            .handle_tool_call(&params.name, params.arguments)
            .await;

        to_response(request.id, &result)
    }
}

fn to_response<T: serde::Serialize>(id: Option<JsonRpcId>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
    }
}
