//! Test case tools.
//!
//! Test case payloads are renamed on the way out so clients see
//! `precondition` and `steps[].action`/`steps[].expected_result` instead of
//! the API's `comment` and `steps[].description`/`steps[].expected`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{ApiClient, QueryParams};
use crate::mcp::protocol::ToolDescription;
use crate::rename::{json_stringify, RenameMap};
use crate::{QaSphereError, QaSphereResult};

use super::{
    array_field, auth_failure, describe_failure, parse_args, parse_marker, present,
    project_code_schema, sort_order_schema, truthy, validate_len, validate_one_of,
    validate_opt_one_of, validate_project_code, validate_url, PRIORITIES, SORT_ORDERS,
};

/// Default page size for test case listings.
pub const DEFAULT_TCASE_LIMIT: u32 = 20;

pub const TCASE_SORT_FIELDS: &[&str] = &[
    "id",
    "seq",
    "folder_id",
    "author_id",
    "pos",
    "title",
    "priority",
    "created_at",
    "updated_at",
    "legacy_id",
];

pub const TCASE_INCLUDES: &[&str] = &["steps", "tags", "project", "folder", "path"];

pub const TCASE_TYPES: &[&str] = &["standalone", "template"];

/// Renames applied to a single test case.
pub fn test_case_renames() -> RenameMap {
    RenameMap::new().rename("comment", "precondition").nested(
        "steps",
        RenameMap::new()
            .rename("description", "action")
            .rename("expected", "expected_result"),
    )
}

/// Renames applied to a paginated test case list.
pub fn test_case_list_renames() -> RenameMap {
    RenameMap::new().nested("data", test_case_renames())
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameters
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct GetTestCaseParams {
    pub marker: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTestCasesParams {
    pub project_code: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort_field: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub folders: Option<Vec<u64>>,
    #[serde(default)]
    pub tags: Option<Vec<u64>>,
    #[serde(default)]
    pub priorities: Option<Vec<String>>,
    #[serde(default)]
    pub requirement_ids: Option<Vec<String>>,
    #[serde(default)]
    pub draft: Option<bool>,
}

impl ListTestCasesParams {
    fn validate(&self) -> QaSphereResult<()> {
        validate_project_code(&self.project_code)?;
        validate_opt_one_of("sortField", self.sort_field.as_deref(), TCASE_SORT_FIELDS)?;
        validate_opt_one_of("sortOrder", self.sort_order.as_deref(), SORT_ORDERS)?;
        for item in self.include.iter().flatten() {
            validate_one_of("include", item, TCASE_INCLUDES)?;
        }
        for priority in self.priorities.iter().flatten() {
            validate_one_of("priorities", priority, PRIORITIES)?;
        }
        Ok(())
    }

    fn query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query
            .push_opt("page", self.page)
            .push("limit", self.limit.unwrap_or(DEFAULT_TCASE_LIMIT))
            .push_opt("sortField", self.sort_field.as_deref())
            .push_opt("sortOrder", self.sort_order.as_deref())
            .push_opt("search", self.search.as_deref().filter(|s| !s.is_empty()))
            .push_all("include", self.include.as_ref())
            .push_all("folders", self.folders.as_ref())
            .push_all("tags", self.tags.as_ref())
            .push_all("priorities", self.priorities.as_ref())
            .push_all("requirementIds", self.requirement_ids.as_ref())
            .push_opt("draft", self.draft);
        query
    }
}

/// A test case step: either inline text or a shared step reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_step_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// Requirement or link attached to a test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkInput {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

/// Parameter values for one filled test case of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterValues {
    /// Existing filled test case to update. Only honored by `update_test_case`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcase_id: Option<String>,
    pub values: BTreeMap<String, String>,
}

/// Body of `create_test_case`, sent as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestCaseBody {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub folder_id: u64,
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<LinkInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<LinkInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<BTreeMap<String, CustomFieldValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_values: Option<Vec<ParameterValues>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_t_case_title_suffix_params: Option<Vec<String>>,
    #[serde(default)]
    pub is_draft: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestCaseParams {
    pub project_id: String,
    #[serde(flatten)]
    pub body: CreateTestCaseBody,
}

/// Body of `update_test_case`. Omitted fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTestCaseBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<LinkInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<LinkInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<BTreeMap<String, CustomFieldValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_values: Option<Vec<ParameterValues>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTestCaseParams {
    pub project_id: String,
    pub tcase_or_legacy_id: String,
    #[serde(flatten)]
    pub body: UpdateTestCaseBody,
}

// ═══════════════════════════════════════════════════════════════════════════
// Input validation
// ═══════════════════════════════════════════════════════════════════════════

fn validate_title(title: &str) -> QaSphereResult<()> {
    validate_len("Title", title, 1, 511)
}

fn validate_steps(steps: Option<&Vec<StepInput>>) -> QaSphereResult<()> {
    for step in steps.into_iter().flatten() {
        if step.shared_step_id == Some(0) {
            return Err(QaSphereError::invalid_params(
                "sharedStepId must be a positive integer",
            ));
        }
    }
    Ok(())
}

fn validate_tags(tags: Option<&Vec<String>>) -> QaSphereResult<()> {
    for tag in tags.into_iter().flatten() {
        validate_len("Tag title", tag, 0, 255)?;
    }
    Ok(())
}

fn validate_links(kind: &str, links: Option<&Vec<LinkInput>>) -> QaSphereResult<()> {
    for link in links.into_iter().flatten() {
        validate_len(&format!("{} text", kind), &link.text, 1, 255)?;
        validate_len(&format!("{} URL", kind), &link.url, 1, 255)?;
        validate_url(&format!("{} URL", kind), &link.url)?;
    }
    Ok(())
}

impl CreateTestCaseBody {
    fn validate(&self) -> QaSphereResult<()> {
        validate_title(&self.title)?;
        validate_one_of("type", &self.kind, TCASE_TYPES)?;
        if self.folder_id == 0 {
            return Err(QaSphereError::invalid_params(
                "Folder ID must be a positive integer",
            ));
        }
        validate_one_of("priority", &self.priority, PRIORITIES)?;
        validate_steps(self.steps.as_ref())?;
        validate_tags(self.tags.as_ref())?;
        validate_links("Requirement", self.requirements.as_ref())?;
        validate_links("Link", self.links.as_ref())?;
        Ok(())
    }

    /// Template parameter values are created fresh, so any `tcaseId` is dropped.
    fn without_filled_ids(mut self) -> Self {
        for values in self.parameter_values.iter_mut().flatten() {
            values.tcase_id = None;
        }
        self
    }
}

impl UpdateTestCaseBody {
    fn validate(&self) -> QaSphereResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        validate_opt_one_of("priority", self.priority.as_deref(), PRIORITIES)?;
        validate_steps(self.steps.as_ref())?;
        validate_tags(self.tags.as_ref())?;
        validate_links("Requirement", self.requirements.as_ref())?;
        validate_links("Link", self.links.as_ref())?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Schemas
// ═══════════════════════════════════════════════════════════════════════════

fn steps_schema() -> Value {
    json!({
        "type": "array",
        "description": "List of test case steps",
        "items": {
            "type": "object",
            "properties": {
                "sharedStepId": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Unique identifier of the shared step"
                },
                "description": {
                    "type": "string",
                    "description": "Details of steps (HTML format)"
                },
                "expected": {
                    "type": "string",
                    "description": "Expected result from the step (HTML format)"
                }
            }
        }
    })
}

fn tags_schema() -> Value {
    json!({
        "type": "array",
        "items": { "type": "string", "maxLength": 255 },
        "description": "List of tag titles"
    })
}

fn links_schema(title: &str, url: &str, description: &str) -> Value {
    json!({
        "type": "array",
        "description": description,
        "items": {
            "type": "object",
            "properties": {
                "text": { "type": "string", "minLength": 1, "maxLength": 255, "description": title },
                "url": { "type": "string", "minLength": 1, "maxLength": 255, "format": "uri", "description": url }
            },
            "required": ["text", "url"]
        }
    })
}

fn custom_fields_schema() -> Value {
    json!({
        "type": "object",
        "description": "Custom field values. Use the systemName property from custom fields as the key. Only enabled fields should be used. Use list_custom_fields tool to get the custom fields.",
        "additionalProperties": {
            "type": "object",
            "properties": {
                "value": {
                    "type": "string",
                    "description": "The actual value for the field. For text fields: any string value. For dropdown fields: must match one of the option value strings from the field's options array."
                },
                "isDefault": {
                    "type": "boolean",
                    "description": "Boolean indicating whether to use the field's default value (if true, the value field is ignored)"
                }
            }
        }
    })
}

fn parameter_values_schema(with_tcase_id: bool) -> Value {
    let mut properties = json!({
        "values": {
            "type": "object",
            "additionalProperties": { "type": "string" },
            "description": "Values for the parameters in the template test case"
        }
    });
    if with_tcase_id {
        properties["tcaseId"] = json!({
            "type": "string",
            "description": "Should be specified to update existing filled test case"
        });
    }
    json!({
        "type": "array",
        "description": "Values to substitute for parameters in template test cases",
        "items": {
            "type": "object",
            "properties": properties,
            "required": ["values"]
        }
    })
}

fn priority_schema() -> Value {
    json!({
        "type": "string",
        "enum": PRIORITIES,
        "description": "Test case priority"
    })
}

fn title_schema() -> Value {
    json!({
        "type": "string",
        "minLength": 1,
        "maxLength": 511,
        "description": "Test case title"
    })
}

pub fn descriptions(tenant_url: &str) -> Vec<ToolDescription> {
    vec![
        ToolDescription::new(
            "get_test_case",
            format!(
                "Get a test case from QA Sphere using a marker in the format PROJECT_CODE-SEQUENCE (e.g., BDI-123). You can use URLs like: {}/project/%PROJECT_CODE%/tcase/%SEQUENCE%?any Extract %PROJECT_CODE% and %SEQUENCE% from the URL and use them as the marker.",
                tenant_url
            ),
            json!({
                "type": "object",
                "properties": {
                    "marker": {
                        "type": "string",
                        "pattern": "^[A-Z0-9]{2,5}-\\d+$",
                        "description": "Test case marker in format PROJECT_CODE-SEQUENCE (e.g., BDI-123)"
                    }
                },
                "required": ["marker"]
            }),
        ),
        ToolDescription::new(
            "list_test_cases",
            "List test cases from a project in QA Sphere. Supports pagination and various filtering options. Usually it makes sense to call get_project tool first to get the project context.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code_schema(),
                    "page": { "type": "number", "description": "Page number for pagination" },
                    "limit": {
                        "type": "number",
                        "default": DEFAULT_TCASE_LIMIT,
                        "description": "Number of items per page"
                    },
                    "sortField": {
                        "type": "string",
                        "enum": TCASE_SORT_FIELDS,
                        "description": "Field to sort results by"
                    },
                    "sortOrder": sort_order_schema("Sort direction (ascending or descending)"),
                    "search": { "type": "string", "description": "Search term to filter test cases" },
                    "include": {
                        "type": "array",
                        "items": { "type": "string", "enum": TCASE_INCLUDES },
                        "description": "Related data to include in the response"
                    },
                    "folders": {
                        "type": "array",
                        "items": { "type": "number" },
                        "description": "Filter by folder IDs"
                    },
                    "tags": {
                        "type": "array",
                        "items": { "type": "number" },
                        "description": "Filter by tag IDs"
                    },
                    "priorities": {
                        "type": "array",
                        "items": { "type": "string", "enum": PRIORITIES },
                        "description": "Filter by priority levels"
                    },
                    "requirementIds": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Filter by requirement IDs (see list_requirements)"
                    },
                    "draft": { "type": "boolean", "description": "Filter draft vs published test cases" }
                },
                "required": ["projectCode"]
            }),
        ),
        ToolDescription::new(
            "create_test_case",
            "Create a new test case in QA Sphere. Supports both standalone and template test cases with various options like steps, tags, requirements, and parameter values for templates.",
            json!({
                "type": "object",
                "properties": {
                    "projectId": project_code_schema(),
                    "title": title_schema(),
                    "type": {
                        "type": "string",
                        "enum": TCASE_TYPES,
                        "description": "Type of test case (standalone or template)"
                    },
                    "folderId": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "ID of the folder where the test case will be placed. Use bulk_upsert_folders tool to create new folders or get existing folders."
                    },
                    "priority": priority_schema(),
                    "pos": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Position within the folder (0-based index)"
                    },
                    "comment": { "type": "string", "description": "Test case precondition (HTML format)" },
                    "steps": steps_schema(),
                    "tags": tags_schema(),
                    "requirements": links_schema("Title of the requirement", "URL of the requirement", "Test case requirements"),
                    "links": links_schema("Title of the link", "URL of the link", "Additional links relevant to the test case"),
                    "customFields": custom_fields_schema(),
                    "parameterValues": parameter_values_schema(false),
                    "filledTCaseTitleSuffixParams": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Parameters to append to filled test case titles"
                    },
                    "isDraft": {
                        "type": "boolean",
                        "default": false,
                        "description": "Whether to create as draft"
                    }
                },
                "required": ["projectId", "title", "type", "folderId", "priority"]
            }),
        ),
        ToolDescription::new(
            "update_test_case",
            "Update an existing test case in QA Sphere. Only users with role User or higher are allowed to update test cases. Optional fields can be omitted to keep the current value.",
            json!({
                "type": "object",
                "properties": {
                    "projectId": project_code_schema(),
                    "tcaseOrLegacyId": {
                        "type": "string",
                        "description": "Test case identifier (can be one of test case UUID, sequence or legacy ID)"
                    },
                    "title": title_schema(),
                    "priority": priority_schema(),
                    "comment": { "type": "string", "description": "Test case precondition (HTML format)" },
                    "isDraft": {
                        "type": "boolean",
                        "description": "To publish a draft test case. A published test case cannot be converted to draft"
                    },
                    "steps": steps_schema(),
                    "tags": tags_schema(),
                    "requirements": links_schema("Title of the requirement", "URL of the requirement", "Test case requirements"),
                    "links": links_schema("Title of the link", "URL of the link", "Additional links relevant to the test case"),
                    "customFields": custom_fields_schema(),
                    "parameterValues": parameter_values_schema(true)
                },
                "required": ["projectId", "tcaseOrLegacyId"]
            }),
        ),
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
// Handlers
// ═══════════════════════════════════════════════════════════════════════════

pub async fn get_test_case(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: GetTestCaseParams = parse_args(arguments)?;
    let (project_code, sequence) = parse_marker(&params.marker)?;

    let tcase = client
        .get(
            &format!("/project/{}/tcase/{}", project_code, sequence),
            &QueryParams::new(),
        )
        .await
        .map_err(|e| describe_failure(e, "fetch test case", |_, _| None))?;

    if !truthy(&tcase, "id") || !truthy(&tcase, "title") || !truthy(&tcase, "version") {
        return Err(QaSphereError::invalid_response(
            "Invalid test case data: missing required fields (id, title, or version)",
        ));
    }

    Ok(json_stringify(&tcase, &test_case_renames()))
}

pub async fn list_test_cases(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: ListTestCasesParams = parse_args(arguments)?;
    params.validate()?;

    let list = client
        .get(&format!("/project/{}/tcase", params.project_code), &params.query())
        .await
        .map_err(|e| {
            describe_failure(e, "fetch test cases", |status, _| match status {
                404 => Some(format!("Project with code '{}' not found.", params.project_code)),
                _ => None,
            })
        })?;

    let items = array_field(&list, "data").ok_or_else(|| {
        QaSphereError::invalid_response("Invalid response: expected a list of test cases")
    })?;

    if !present(&list, "total") || !present(&list, "page") || !present(&list, "limit") {
        return Err(QaSphereError::invalid_response(
            "Invalid response: missing required fields (total, page, or limit)",
        ));
    }

    if let Some(first) = items.first() {
        if !truthy(first, "id") || !truthy(first, "title") {
            return Err(QaSphereError::invalid_response(
                "Invalid test case data: missing required fields (id or title)",
            ));
        }
    }

    Ok(json_stringify(&list, &test_case_list_renames()))
}

pub async fn create_test_case(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: CreateTestCaseParams = parse_args(arguments)?;
    validate_project_code(&params.project_id)?;
    params.body.validate()?;

    let body = serde_json::to_value(params.body.without_filled_ids())?;
    let created = client
        .post(&format!("/project/{}/tcase", params.project_id), &body)
        .await
        .map_err(|e| {
            describe_failure(e, "create test case", |status, message| match status {
                400 => Some(format!("Invalid request data: {}", message)),
                404 => Some(format!("Project or folder not found: {}", message)),
                409 => Some(format!(
                    "Position conflict or duplicate requirement: {}",
                    message
                )),
                500 => Some("Internal server error while creating test case".to_string()),
                other => auth_failure(other),
            })
        })?;

    Ok(created.to_string())
}

pub async fn update_test_case(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: UpdateTestCaseParams = parse_args(arguments)?;
    validate_project_code(&params.project_id)?;
    params.body.validate()?;

    let body = serde_json::to_value(&params.body)?;
    let updated = client
        .patch(
            &format!(
                "/project/{}/tcase/{}",
                params.project_id, params.tcase_or_legacy_id
            ),
            &body,
        )
        .await
        .map_err(|e| {
            describe_failure(e, "update test case", |status, message| match status {
                400 => Some(format!(
                    "Invalid request data or converting a published test case to draft: {}",
                    message
                )),
                404 => Some(format!("Project or test case not found: {}", message)),
                500 => Some("Internal server error while updating test case".to_string()),
                other => auth_failure(other),
            })
        })?;

    Ok(updated.to_string())
}
