//! Tool registry and dispatch.
//!
//! Maps `tools/call` names onto the handlers in [`crate::tools`] and turns
//! their errors into `isError` results.

use serde_json::Value;

use crate::api::ApiClient;
use crate::tools::{
    custom_fields, folders, projects, requirements, shared_preconditions, shared_steps, tags,
    tcases,
};
use crate::types::config::Config;
use crate::QaSphereResult;

use super::protocol::{ToolDescription, ToolResult};

/// Dispatches tool calls to the QA Sphere API.
#[derive(Debug, Clone)]
pub struct ToolHandler {
    client: ApiClient,
}

impl ToolHandler {
    pub fn new(config: &Config) -> QaSphereResult<Self> {
        Ok(Self::with_client(ApiClient::new(config)?))
    }

    pub fn with_client(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// All tools, in a stable order.
    pub fn list_tools(&self) -> Vec<ToolDescription> {
        let tenant_url = self.client.tenant_url();

        let mut tools = Vec::new();
        tools.extend(projects::descriptions(tenant_url));
        tools.extend(tcases::descriptions(tenant_url));
        tools.extend(folders::descriptions());
        tools.extend(tags::descriptions());
        tools.extend(requirements::descriptions());
        tools.extend(shared_steps::descriptions());
        tools.extend(shared_preconditions::descriptions());
        tools.extend(custom_fields::descriptions());
        tools
    }

    /// Runs a tool. Never fails: errors become a result with `isError: true`.
    pub async fn handle_tool_call(&self, name: &str, arguments: Value) -> ToolResult {
        let client = &self.client;

        let result = match name {
            "list_projects" => projects::list_projects(client, arguments).await,
            "get_project" => projects::get_project(client, arguments).await,

            "get_test_case" => tcases::get_test_case(client, arguments).await,
            "list_test_cases" => tcases::list_test_cases(client, arguments).await,
            "create_test_case" => tcases::create_test_case(client, arguments).await,
            "update_test_case" => tcases::update_test_case(client, arguments).await,

            "list_test_cases_folders" => folders::list_test_cases_folders(client, arguments).await,
            "bulk_upsert_folders" => folders::bulk_upsert_folders(client, arguments).await,

            "list_test_cases_tags" => tags::list_test_cases_tags(client, arguments).await,

            "list_requirements" => requirements::list_requirements(client, arguments).await,

            "list_shared_steps" => shared_steps::list_shared_steps(client, arguments).await,
            "get_shared_step" => shared_steps::get_shared_step(client, arguments).await,
            "create_shared_step" => shared_steps::create_shared_step(client, arguments).await,
            "update_shared_step" => shared_steps::update_shared_step(client, arguments).await,

            "list_shared_preconditions" => {
                shared_preconditions::list_shared_preconditions(client, arguments).await
            }
            "get_shared_precondition" => {
                shared_preconditions::get_shared_precondition(client, arguments).await
            }
            "create_shared_precondition" => {
                shared_preconditions::create_shared_precondition(client, arguments).await
            }
            "update_shared_precondition" => {
                shared_preconditions::update_shared_precondition(client, arguments).await
            }

            "list_custom_fields" => custom_fields::list_custom_fields(client, arguments).await,

            _ => return ToolResult::error(format!("Unknown tool: {}", name)),
        };

        match result {
            Ok(text) => ToolResult::success(text),
            Err(e) => {
                tracing::warn!(tool = name, status = ?e.status(), error = %e, "Tool call failed");
                ToolResult::error(e.to_string())
            }
        }
    }
}
