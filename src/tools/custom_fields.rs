//! Custom field tools.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ApiClient, QueryParams};
use crate::mcp::protocol::ToolDescription;
use crate::QaSphereResult;

use super::{auth_failure, describe_failure, parse_args, project_code_schema, validate_project_code};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCustomFieldsParams {
    pub project_code: String,
}

pub fn descriptions() -> Vec<ToolDescription> {
    vec![ToolDescription::new(
        "list_custom_fields",
        "List all custom fields available for a project. This endpoint is useful when creating or updating test cases that include custom field values. Custom fields allow you to extend test cases with additional metadata specific to your organization's needs.",
        json!({
            "type": "object",
            "properties": {
                "projectCode": project_code_schema()
            },
            "required": ["projectCode"]
        }),
    )]
}

/// Returns the custom field list as the API sends it.
pub async fn list_custom_fields(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: ListCustomFieldsParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;

    let fields = client
        .get(
            &format!("/project/{}/custom-field", params.project_code),
            &QueryParams::new(),
        )
        .await
        .map_err(|e| {
            describe_failure(e, "fetch custom fields", |status, _| match status {
                404 => Some(format!("Project with code '{}' not found.", params.project_code)),
                other => auth_failure(other),
            })
        })?;

    Ok(fields.to_string())
}
