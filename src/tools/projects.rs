//! Project tools: `list_projects`, `get_project`.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ApiClient, QueryParams};
use crate::mcp::protocol::ToolDescription;
use crate::{QaSphereError, QaSphereResult};

use super::{array_field, describe_failure, parse_args, project_code_schema, truthy, validate_project_code};

/// Parameters for `get_project`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetProjectParams {
    pub project_code: String,
}

pub fn descriptions(tenant_url: &str) -> Vec<ToolDescription> {
    vec![
        ToolDescription::new(
            "get_project",
            format!(
                "Get a project information from QA Sphere using a project code (e.g., BDI). You can extract PROJECT_CODE from URLs {}/project/%PROJECT_CODE%/...",
                tenant_url
            ),
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code_schema()
                },
                "required": ["projectCode"]
            }),
        ),
        ToolDescription::new(
            "list_projects",
            "Get a list of all projects from current QA Sphere TMS account (qasphere.com)",
            json!({
                "type": "object",
                "properties": {}
            }),
        ),
    ]
}

pub async fn get_project(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: GetProjectParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;

    let project = client
        .get(&format!("/project/{}", params.project_code), &QueryParams::new())
        .await
        .map_err(|e| {
            describe_failure(e, "fetch project", |status, _| match status {
                404 => Some(format!("Project with code '{}' not found.", params.project_code)),
                _ => None,
            })
        })?;

    if !truthy(&project, "id") || !truthy(&project, "title") {
        return Err(QaSphereError::invalid_response(
            "Invalid project data: missing required fields (id or title)",
        ));
    }

    Ok(project.to_string())
}

pub async fn list_projects(client: &ApiClient, _arguments: Value) -> QaSphereResult<String> {
    let projects = client
        .get("/project", &QueryParams::new())
        .await
        .map_err(|e| describe_failure(e, "fetch projects", |_, _| None))?;

    let items = array_field(&projects, "projects").ok_or_else(|| {
        QaSphereError::invalid_response("Invalid response: expected an array of projects")
    })?;

    if let Some(first) = items.first() {
        if !truthy(first, "id") || !truthy(first, "title") {
            return Err(QaSphereError::invalid_response(
                "Invalid project data: missing required fields (id or title)",
            ));
        }
    }

    Ok(projects.to_string())
}
