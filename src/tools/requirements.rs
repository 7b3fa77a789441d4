//! Requirement tools.
//!
//! Unlike the other listings, the requirement response is decoded into typed
//! structs: unknown fields are dropped and a malformed body is rejected with
//! the decoder's message.

use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};

use crate::api::{ApiClient, QueryParams};
use crate::mcp::protocol::ToolDescription;
use crate::{QaSphereError, QaSphereResult};

use super::{
    auth_failure, describe_failure, parse_args, project_code_schema, require_sort_field,
    sort_order_schema, validate_opt_one_of, validate_project_code, SORT_ORDERS,
};

pub const REQUIREMENT_SORT_FIELDS: &[&str] = &["created_at", "text"];
pub const REQUIREMENT_INCLUDES: &[&str] = &["tcaseCount"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequirementsParams {
    pub project_code: String,
    #[serde(default)]
    pub sort_field: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub include: Option<String>,
}

/// Link between a requirement and an issue tracker entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationLink {
    pub issue_id: String,
    pub issue_title: String,
    pub issue_url: String,
    pub remote_link_id: Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: String,
    pub text: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_link: Option<IntegrationLink>,
    /// Present only when requested with `include=tcaseCount`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcase_count: Option<Number>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementList {
    pub requirements: Vec<Requirement>,
}

pub fn descriptions() -> Vec<ToolDescription> {
    vec![ToolDescription::new(
        "list_requirements",
        "List requirements linked to test cases in a project. Requirements are references to external documentation or specifications (like Jira issues) that test cases verify. Use this tool to find requirement IDs when you need to filter test cases by requirement using list_test_cases with requirementIds parameter.",
        json!({
            "type": "object",
            "properties": {
                "projectCode": project_code_schema(),
                "sortField": {
                    "type": "string",
                    "enum": REQUIREMENT_SORT_FIELDS,
                    "description": "Field to sort results by"
                },
                "sortOrder": sort_order_schema("Sort direction (ascending or descending). Requires sortField."),
                "include": {
                    "type": "string",
                    "enum": REQUIREMENT_INCLUDES,
                    "description": "Include optional fields like the number of test cases linked to each requirement"
                }
            },
            "required": ["projectCode"]
        }),
    )]
}

pub async fn list_requirements(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: ListRequirementsParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;
    validate_opt_one_of("sortField", params.sort_field.as_deref(), REQUIREMENT_SORT_FIELDS)?;
    validate_opt_one_of("sortOrder", params.sort_order.as_deref(), SORT_ORDERS)?;
    validate_opt_one_of("include", params.include.as_deref(), REQUIREMENT_INCLUDES)?;
    require_sort_field(params.sort_field.as_deref(), params.sort_order.as_deref())?;

    let mut query = QueryParams::new();
    query
        .push_opt("sortField", params.sort_field.as_deref())
        .push_opt("sortOrder", params.sort_order.as_deref())
        .push_opt("include", params.include.as_deref());

    let body = client
        .get(&format!("/project/{}/requirement", params.project_code), &query)
        .await
        .map_err(|e| {
            describe_failure(e, "fetch requirements", |status, message| match status {
                400 => Some(format!("Invalid request data: {}", message)),
                404 => Some(format!("Project with code '{}' not found.", params.project_code)),
                500 => Some("Internal server error while fetching requirements".to_string()),
                other => auth_failure(other),
            })
        })?;

    let requirements = decode_requirements(body)?;
    Ok(serde_json::to_string(&requirements)?)
}

fn decode_requirements(body: Value) -> QaSphereResult<RequirementList> {
    serde_json::from_value(body)
        .map_err(|e| QaSphereError::invalid_response(format!("Invalid response data: {}", e)))
}
