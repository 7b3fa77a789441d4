//! Shared precondition tools.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{ApiClient, QueryParams};
use crate::mcp::protocol::ToolDescription;
use crate::{QaSphereError, QaSphereResult};

use super::{
    auth_failure, describe_failure, parse_args, present, project_code_schema, require_sort_field,
    sort_order_schema, truthy, validate_len, validate_opt_one_of, validate_project_code,
    SORT_ORDERS,
};

pub const SHARED_PRECONDITION_SORT_FIELDS: &[&str] = &["created_at", "title"];
pub const SHARED_PRECONDITION_INCLUDES: &[&str] = &["tcaseCount"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSharedPreconditionsParams {
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
pub struct GetSharedPreconditionParams {
    pub project_code: String,
    pub shared_precondition_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSharedPreconditionParams {
    pub project_code: String,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSharedPreconditionParams {
    pub project_code: String,
    pub shared_precondition_id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Request body for create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SharedPreconditionBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl UpdateSharedPreconditionParams {
    fn into_body(self) -> QaSphereResult<SharedPreconditionBody> {
        if self.title.is_none() && self.text.is_none() {
            return Err(QaSphereError::invalid_params(
                "Provide at least one of title or text to update the shared precondition.",
            ));
        }
        if let Some(title) = &self.title {
            validate_len("Title", title, 1, usize::MAX)?;
        }
        if let Some(text) = &self.text {
            validate_len("Text", text, 1, usize::MAX)?;
        }
        Ok(SharedPreconditionBody {
            title: self.title,
            text: self.text,
        })
    }
}

fn validate_id(id: u64) -> QaSphereResult<()> {
    if id == 0 {
        return Err(QaSphereError::invalid_params(
            "Shared precondition ID must be a positive integer",
        ));
    }
    Ok(())
}

fn id_schema() -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "description": "Identifier of the shared precondition"
    })
}

pub fn descriptions() -> Vec<ToolDescription> {
    vec![
        ToolDescription::new(
            "list_shared_preconditions",
            "List reusable shared preconditions for a project. Supports sorting by title or creation date and can include test case usage counts.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code_schema(),
                    "sortField": {
                        "type": "string",
                        "enum": SHARED_PRECONDITION_SORT_FIELDS,
                        "description": "Field to sort results by"
                    },
                    "sortOrder": sort_order_schema("Sort direction (ascending or descending). Requires sortField."),
                    "include": {
                        "type": "string",
                        "enum": SHARED_PRECONDITION_INCLUDES,
                        "description": "Include optional fields like the number of test cases referencing each precondition"
                    }
                },
                "required": ["projectCode"]
            }),
        ),
        ToolDescription::new(
            "get_shared_precondition",
            "Fetch details for a single shared precondition by ID.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code_schema(),
                    "sharedPreconditionId": id_schema()
                },
                "required": ["projectCode", "sharedPreconditionId"]
            }),
        ),
        ToolDescription::new(
            "create_shared_precondition",
            "Create a reusable shared precondition that can be referenced across multiple test cases.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code_schema(),
                    "title": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Title of the shared precondition"
                    },
                    "text": {
                        "type": "string",
                        "minLength": 1,
                        "description": "HTML content describing the precondition"
                    }
                },
                "required": ["projectCode", "title", "text"]
            }),
        ),
        ToolDescription::new(
            "update_shared_precondition",
            "Update the title and/or text of an existing shared precondition. Updates create a new version while preserving history.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code_schema(),
                    "sharedPreconditionId": id_schema(),
                    "title": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Updated title of the shared precondition"
                    },
                    "text": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Updated HTML content of the shared precondition"
                    }
                },
                "required": ["projectCode", "sharedPreconditionId"]
            }),
        ),
    ]
}

pub async fn list_shared_preconditions(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: ListSharedPreconditionsParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;
    validate_opt_one_of(
        "sortField",
        params.sort_field.as_deref(),
        SHARED_PRECONDITION_SORT_FIELDS,
    )?;
    validate_opt_one_of("sortOrder", params.sort_order.as_deref(), SORT_ORDERS)?;
    validate_opt_one_of("include", params.include.as_deref(), SHARED_PRECONDITION_INCLUDES)?;
    require_sort_field(params.sort_field.as_deref(), params.sort_order.as_deref())?;

    let mut query = QueryParams::new();
    query
        .push_opt("sortField", params.sort_field.as_deref())
        .push_opt("sortOrder", params.sort_order.as_deref())
        .push_opt("include", params.include.as_deref());

    let preconditions = client
        .get(
            &format!("/project/{}/shared-precondition", params.project_code),
            &query,
        )
        .await
        .map_err(|e| {
            describe_failure(e, "fetch shared preconditions", |status, message| match status {
                400 => Some(format!("Invalid request data: {}", message)),
                404 => Some(format!("Project with code '{}' not found.", params.project_code)),
                500 => Some("Internal server error while fetching shared preconditions".to_string()),
                other => auth_failure(other),
            })
        })?;

    // This endpoint answers with a bare array.
    let items = preconditions.as_array().ok_or_else(|| {
        QaSphereError::invalid_response("Invalid response: expected an array of shared preconditions")
    })?;

    if let Some(first) = items.first() {
        if !present(first, "id") || !truthy(first, "title") || !truthy(first, "text") {
            return Err(QaSphereError::invalid_response(
                "Invalid shared precondition data: missing required fields (id, title, or text)",
            ));
        }
    }

    Ok(preconditions.to_string())
}

pub async fn get_shared_precondition(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: GetSharedPreconditionParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;
    validate_id(params.shared_precondition_id)?;

    let id = params.shared_precondition_id;
    let precondition = client
        .get(
            &format!("/project/{}/shared-precondition/{}", params.project_code, id),
            &QueryParams::new(),
        )
        .await
        .map_err(|e| {
            describe_failure(e, "fetch shared precondition", |status, message| match status {
                400 => Some(format!("Invalid request data: {}", message)),
                404 => Some(format!("Project or shared precondition not found: {}", message)),
                500 => Some("Internal server error while fetching shared precondition".to_string()),
                other => auth_failure(other),
            })
        })?;

    if !truthy(&precondition, "id") || !truthy(&precondition, "title") || !truthy(&precondition, "text") {
        return Err(QaSphereError::invalid_response(
            "Invalid shared precondition data: missing required fields (id, title, or text)",
        ));
    }

    Ok(precondition.to_string())
}

pub async fn create_shared_precondition(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: CreateSharedPreconditionParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;
    validate_len("Title", &params.title, 1, usize::MAX)?;
    validate_len("Text", &params.text, 1, usize::MAX)?;

    let body = SharedPreconditionBody {
        title: Some(params.title),
        text: Some(params.text),
    };
    let created = client
        .post(
            &format!("/project/{}/shared-precondition", params.project_code),
            &serde_json::to_value(&body)?,
        )
        .await
        .map_err(|e| {
            describe_failure(e, "create shared precondition", |status, message| match status {
                400 => Some(format!("Invalid request data: {}", message)),
                404 => Some(format!("Project with code '{}' not found.", params.project_code)),
                409 => Some(format!(
                    "A shared precondition with the same title already exists: {}",
                    message
                )),
                500 => Some("Internal server error while creating shared precondition".to_string()),
                other => auth_failure(other),
            })
        })?;

    Ok(created.to_string())
}

pub async fn update_shared_precondition(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: UpdateSharedPreconditionParams = parse_args(arguments)?;
    validate_project_code(&params.project_code)?;
    validate_id(params.shared_precondition_id)?;

    let path = format!(
        "/project/{}/shared-precondition/{}",
        params.project_code, params.shared_precondition_id
    );
    let body = params.into_body()?;

    let updated = client
        .patch(&path, &serde_json::to_value(&body)?)
        .await
        .map_err(|e| {
            describe_failure(e, "update shared precondition", |status, message| match status {
                400 => Some(format!("Invalid request data: {}", message)),
                404 => Some(format!("Project or shared precondition not found: {}", message)),
                409 => Some(format!(
                    "A shared precondition with the same title already exists: {}",
                    message
                )),
                500 => Some("Internal server error while updating shared precondition".to_string()),
                other => auth_failure(other),
            })
        })?;

    Ok(updated.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_body(args: Value) -> QaSphereResult<SharedPreconditionBody> {
        parse_args::<UpdateSharedPreconditionParams>(args)?.into_body()
    }

    #[test]
    fn test_update_requires_a_field() {
        let err = update_body(json!({"projectCode": "BDI", "sharedPreconditionId": 1})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provide at least one of title or text to update the shared precondition."
        );
    }

    #[test]
    fn test_update_body_only_carries_given_fields() {
        let body = update_body(json!({
            "projectCode": "BDI",
            "sharedPreconditionId": 1,
            "text": "<p>Logged in</p>"
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"text": "<p>Logged in</p>"})
        );
    }

    #[test]
    fn test_update_rejects_empty_strings() {
        assert!(update_body(json!({"projectCode": "BDI", "sharedPreconditionId": 1, "title": ""})).is_err());
    }

    #[test]
    fn test_ids_must_be_positive() {
        assert!(validate_id(0).is_err());
        assert!(validate_id(7).is_ok());
        assert!(parse_args::<GetSharedPreconditionParams>(json!({
            "projectCode": "BDI",
            "sharedPreconditionId": -1
        }))
        .is_err());
    }
}
