//! CLI command implementations.

use serde_json::json;

use crate::mcp::{McpServer, ToolHandler};
use crate::types::config::{Config, ENV_LOG_TO_FILE};
use crate::{QaSphereError, QaSphereResult};

/// Serves MCP over stdin/stdout until the client disconnects.
pub async fn serve(config: &Config) -> QaSphereResult<()> {
    config.validate()?;

    tracing::info!(tenant = %config.api.tenant_url, "Starting QA Sphere MCP server");
    let mut server = McpServer::new(config)?;
    server.run().await
}

/// Prints every tool with the first line of its description.
pub fn tools(config: &Config) -> QaSphereResult<()> {
    let handler = ToolHandler::new(config)?;
    let tools = handler.list_tools();

    println!("{} tools:\n", tools.len());
    for tool in tools {
        let summary = tool.description.lines().next().unwrap_or_default();
        println!("  {:<28} {}", tool.name, summary);
    }

    Ok(())
}

/// Checks the configuration, then lists projects to prove the key works.
pub async fn doctor(config: &Config) -> QaSphereResult<()> {
    println!("Checking QA Sphere MCP configuration...\n");

    if let Err(e) = config.validate() {
        println!("✗ {}", e);
        return Err(e);
    }
    println!("✓ Tenant URL: {}", config.api.tenant_url);
    println!("✓ API key is set");

    match &config.logging.traffic_log {
        Some(path) => println!("✓ Traffic log: {}", path.display()),
        None => println!("○ Traffic log disabled (set {} to enable)", ENV_LOG_TO_FILE),
    }

    let handler = ToolHandler::new(config)?;
    let result = handler.handle_tool_call("list_projects", json!({})).await;

    println!();
    if result.is_error {
        println!("✗ Could not list projects: {}", result.text());
        return Err(QaSphereError::other(result.text().to_string()));
    }

    let count = serde_json::from_str::<serde_json::Value>(result.text())
        .ok()
        .and_then(|v| v["projects"].as_array().map(Vec::len));
    match count {
        Some(n) => println!("✓ Connected, {} project(s) visible", n),
        None => println!("✓ Connected"),
    }
    println!("\nAdd to an MCP client with: qasphere-mcp serve");

    Ok(())
}

/// Shows the version.
pub fn version() {
    println!("qasphere-mcp {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("MCP server for QA Sphere test management");
    println!("https://github.com/Hypersequent/qasphere-mcp");
}
