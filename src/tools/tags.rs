//! Tag tools.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ApiClient, QueryParams};
use crate::mcp::protocol::ToolDescription;
use crate::{QaSphereError, QaSphereResult};

use super::{array_field, describe_failure, parse_args, present, truthy, validate_loose_project_code};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTagsParams {
    pub project_code: String,
}

pub fn descriptions() -> Vec<ToolDescription> {
    vec![ToolDescription::new(
        "list_test_cases_tags",
        "List all tags defined within a specific QA Sphere project.",
        json!({
            "type": "object",
            "properties": {
                "projectCode": {
                    "type": "string",
                    "pattern": "^[A-Z0-9]+$",
                    "description": "Project code identifier (e.g., BDI)"
                }
            },
            "required": ["projectCode"]
        }),
    )]
}

pub async fn list_test_cases_tags(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: ListTagsParams = parse_args(arguments)?;
    validate_loose_project_code(&params.project_code)?;

    let tags = client
        .get(&format!("/project/{}/tag", params.project_code), &QueryParams::new())
        .await
        .map_err(|e| {
            describe_failure(e, "fetch project tags", |status, _| match status {
                404 => Some(format!(
                    "Project with identifier '{}' not found.",
                    params.project_code
                )),
                _ => None,
            })
        })?;

    let items = array_field(&tags, "tags").ok_or_else(|| {
        QaSphereError::invalid_response("Invalid response: expected an object with a \"tags\" array")
    })?;

    if let Some(first) = items.first() {
        if !present(first, "id") || !truthy(first, "title") {
            return Err(QaSphereError::invalid_response(
                "Invalid tag data: missing required fields (id or title)",
            ));
        }
    }

    Ok(tags.to_string())
}
