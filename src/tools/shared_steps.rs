//! Shared step tools.
//!
//! A shared step is a titled, versioned list of sub-steps that test cases
//! reference by ID. Sub-step text is trimmed before sending and every sub-step
//! needs a description or an expected result.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{ApiClient, QueryParams};
use crate::mcp::protocol::ToolDescription;
use crate::{QaSphereError, QaSphereResult};

use super::{
    array_field, auth_failure, describe_failure, parse_args, project_code_schema,
    require_sort_field, sort_order_schema, truthy, validate_len, validate_opt_one_of,
    validate_project_code, SORT_ORDERS,
};

pub const SHARED_STEP_SORT_FIELDS: &[&str] = &["created_at", "title"];
pub const SHARED_STEP_INCLUDES: &[&str] = &["tcaseCount"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSharedStepsParams {
    pub project_code: String,
    #[serde(default)]
    pub sort_field: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub include: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSharedStepParams {
    pub project_code: String,
    pub shared_step_id: u64,
}

/// A sub-step as given by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubStepInput {
    /// Existing sub-step to update. Only honored by `update_shared_step`.
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
}

/// A sub-step as sent to the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubStepBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSharedStepParams {
    pub project_code: String,
    pub title: String,
    pub sub_steps: Vec<SubStepInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSharedStepParams {
    pub project_code: String,
    pub shared_step_id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sub_steps: Option<Vec<SubStepInput>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedStepBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_steps: Option<Vec<SubStepBody>>,
}

fn non_empty_trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims sub-step text and drops empty fields.
fn sanitize_sub_steps(
    sub_steps: Vec<SubStepInput>,
    keep_ids: bool,
    empty_message: &str,
) -> QaSphereResult<Vec<SubStepBody>> {
    if sub_steps.is_empty() {
        return Err(QaSphereError::invalid_params(empty_message));
    }

    sub_steps
        .into_iter()
        .map(|step| {
            let id = if keep_ids { step.id } else { None };
            if id == Some(0) {
                return Err(QaSphereError::invalid_params(
                    "Sub-step ID must be a positive integer",
                ));
            }

            let description = non_empty_trimmed(step.description);
            let expected = non_empty_trimmed(step.expected);
            if description.is_none() && expected.is_none() {
                return Err(QaSphereError::invalid_params(
                    "Each sub-step must include at least a description or expected result",
                ));
            }

            Ok(SubStepBody {
                id,
                description,
                expected,
            })
        })
        .collect()
}

impl CreateSharedStepParams {
    fn into_body(self) -> QaSphereResult<SharedStepBody> {
        validate_len("Title", &self.title, 1, 255)?;
        let sub_steps = sanitize_sub_steps(self.sub_steps, false, "At least one sub-step is required")?;
        Ok(SharedStepBody {
            title: Some(self.title),
            sub_steps: Some(sub_steps),
        })
    }
}

impl UpdateSharedStepParams {
    fn into_body(self) -> QaSphereResult<SharedStepBody> {
        if self.title.is_none() && self.sub_steps.is_none() {
            return Err(QaSphereError::invalid_params(
                "Provide at least one of title or subSteps to update the shared step.",
            ));
        }
        if let Some(title) = &self.title {
            validate_len("Title", title, 1, 255)?;
        }
        let sub_steps = self
            .sub_steps
            .map(|steps| {
                sanitize_sub_steps(
                    steps,
                    true,
                    "At least one sub-step is required when updating sub-steps",
                )
            })
            .transpose()?;

        Ok(SharedStepBody {
            title: self.title,
            sub_steps,
        })
    }
}

fn validate_id(id: u64) -> QaSphereResult<()> {
    if id == 0 {
        return Err(QaSphereError::invalid_params(
            "Shared step ID must be a positive integer",
        ));
    }
    Ok(())
}

fn has_shared_step_fields(step: &Value) -> bool {
    truthy(step, "id") && truthy(step, "title") && array_field(step, "subSteps").is_some()
}

fn id_schema() -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "description": "Identifier of the shared step"
    })
}

fn sub_step_schema(with_id: bool) -> Value {
    let mut properties = json!({
        "description": {
            "type": "string",
            "description": "Details of the sub-step (HTML format)"
        },
        "expected": {
            "type": "string",
            "description": "Expected result of the sub-step (HTML format)"
        }
    });
    if with_id {
        properties["id"] = json!({
            "type": "integer",
            "minimum": 1,
            "description": "Existing sub-step ID. Omit to create a new sub-step."
        });
    }
    json!({ "type": "object", "properties": properties })
}

pub fn descriptions() -> Vec<ToolDescription> {
    vec![
        ToolDescription::new(
            "list_shared_steps",
            "List reusable shared steps for a project. Supports sorting by title or creation date and can include test case usage counts.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code_schema(),
                    "sortField": {
                        "type": "string",
                        "enum": SHARED_STEP_SORT_FIELDS,
                        "description": "Field to sort results by"
                    },
                    "sortOrder": sort_order_schema("Sort direction (ascending or descending). Requires sortField."),
                    "include": {
                        "type": "string",
                        "enum": SHARED_STEP_INCLUDES,
                        "description": "Include optional fields like the number of test cases referencing each shared step"
                    }
                },
                "required": ["projectCode"]
            }),
        ),
        ToolDescription::new(
            "get_shared_step",
            "Fetch details for a single shared step by ID.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code_schema(),
                    "sharedStepId": id_schema()
                },
                "required": ["projectCode", "sharedStepId"]
            }),
        ),
        ToolDescription::new(
            "create_shared_step",
            "Create a reusable shared step comprised of one or more sub-steps. Each sub-step must include a description, expected result, or both.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code_schema(),
                    "title": {
                        "type": "string",
                        "minLength": 1,
                        "maxLength": 255,
                        "description": "Title of the shared step"
                    },
                    "subSteps": {
                        "type": "array",
                        "minItems": 1,
                        "items": sub_step_schema(false),
                        "description": "List of sub-steps. Order determines execution order."
                    }
                },
                "required": ["projectCode", "title", "subSteps"]
            }),
        ),
        ToolDescription::new(
            "update_shared_step",
            "Update the title and/or sub-steps of an existing shared step. Updates create a new version while preserving history.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code_schema(),
                    "sharedStepId": id_schema(),
                    "title": {
                        "type": "string",
                        "minLength": 1,
                        "maxLength": 255,
                        "description": "Updated title of the shared step"
                    },
                    "subSteps": {
                        "type": "array",
                        "minItems": 1,
                        "items": sub_step_schema(true),
                        "description": "Updated list of sub-steps. Omitted IDs create new sub-steps."
                    }
                },
                "required": ["projectCode", "sharedStepId"]
            }),
        ),
    ]
}

pub async fn list_shared_steps(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: ListSharedStepsParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;
    validate_opt_one_of("sortField", params.sort_field.as_deref(), SHARED_STEP_SORT_FIELDS)?;
    validate_opt_one_of("sortOrder", params.sort_order.as_deref(), SORT_ORDERS)?;
    validate_opt_one_of("include", params.include.as_deref(), SHARED_STEP_INCLUDES)?;
    require_sort_field(params.sort_field.as_deref(), params.sort_order.as_deref())?;

    let mut query = QueryParams::new();
    query
        .push_opt("sortField", params.sort_field.as_deref())
        .push_opt("sortOrder", params.sort_order.as_deref())
        .push_opt("include", params.include.as_deref());

    let steps = client
        .get(&format!("/project/{}/shared-step", params.project_code), &query)
        .await
        .map_err(|e| {
            describe_failure(e, "fetch shared steps", |status, message| match status {
                400 => Some(format!("Invalid request data: {}", message)),
                404 => Some(format!("Project with code '{}' not found.", params.project_code)),
                500 => Some("Internal server error while fetching shared steps".to_string()),
                other => auth_failure(other),
            })
        })?;

    let items = array_field(&steps, "sharedSteps").ok_or_else(|| {
        QaSphereError::invalid_response(
            "Invalid response: expected an object with a \"sharedSteps\" array",
        )
    })?;

    if let Some(first) = items.first() {
        if !has_shared_step_fields(first) {
            return Err(QaSphereError::invalid_response(
                "Invalid shared step data: missing required fields (id, title, or subSteps)",
            ));
        }
    }

    Ok(steps.to_string())
}

pub async fn get_shared_step(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: GetSharedStepParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;
    validate_id(params.shared_step_id)?;

    let step = client
        .get(
            &format!(
                "/project/{}/shared-step/{}",
                params.project_code, params.shared_step_id
            ),
            &QueryParams::new(),
        )
        .await
        .map_err(|e| {
            describe_failure(e, "fetch shared step", |status, message| match status {
                400 => Some(format!("Invalid request data: {}", message)),
                404 => Some(format!("Project or shared step not found: {}", message)),
                500 => Some("Internal server error while fetching shared step".to_string()),
                other => auth_failure(other),
            })
        })?;

    if !has_shared_step_fields(&step) {
        return Err(QaSphereError::invalid_response(
            "Invalid shared step data: missing required fields (id, title, or subSteps)",
        ));
    }

    Ok(step.to_string())
}

pub async fn create_shared_step(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: CreateSharedStepParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;

    let path = format!("/project/{}/shared-step", params.project_code);
    let project_code = params.project_code.clone();
    let body = params.into_body()?;

    let created = client
        .post(&path, &serde_json::to_value(&body)?)
        .await
        .map_err(|e| {
            describe_failure(e, "create shared step", |status, message| match status {
                400 => Some(format!("Invalid request data: {}", message)),
                404 => Some(format!("Project with code '{}' not found.", project_code)),
                409 => Some(format!(
                    "A shared step with the same title already exists: {}",
                    message
                )),
                500 => Some("Internal server error while creating shared step".to_string()),
                other => auth_failure(other),
            })
        })?;

    if !truthy(&created, "id") {
        return Err(QaSphereError::invalid_response(
            "Invalid response: missing id for created shared step",
        ));
    }

    Ok(created.to_string())
}

pub async fn update_shared_step(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: UpdateSharedStepParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;
    validate_id(params.shared_step_id)?;

    let path = format!(
        "/project/{}/shared-step/{}",
        params.project_code, params.shared_step_id
    );
    let body = params.into_body()?;

    let updated = client
        .patch(&path, &serde_json::to_value(&body)?)
        .await
        .map_err(|e| {
            describe_failure(e, "update shared step", |status, message| match status {
                400 => Some(format!(
                    "Invalid request data, validation errors, or invalid sub-step ID: {}",
                    message
                )),
                404 => Some(format!("Project or shared step not found: {}", message)),
                500 => Some("Internal server error while updating shared step".to_string()),
                other => auth_failure(other),
            })
        })?;

    if !truthy(&updated, "message") {
        return Err(QaSphereError::invalid_response(
            "Invalid response: missing confirmation message for updated shared step",
        ));
    }

    Ok(updated.to_string())
}
