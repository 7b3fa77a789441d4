//! Folder tools: `list_test_cases_folders`, `bulk_upsert_folders`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{ApiClient, QueryParams};
use crate::mcp::protocol::ToolDescription;
use crate::{QaSphereError, QaSphereResult};

use super::{
    array_field, auth_failure, describe_failure, parse_args, present, sort_order_schema, truthy,
    validate_len, validate_loose_project_code, validate_opt_one_of, SORT_ORDERS,
};

/// Default page size for folder listings.
pub const DEFAULT_FOLDER_LIMIT: u32 = 100;

/// Sortable folder columns.
pub const FOLDER_SORT_FIELDS: &[&str] = &[
    "id",
    "project_id",
    "title",
    "pos",
    "parent_id",
    "created_at",
    "updated_at",
];

/// Parameters for `list_test_cases_folders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFoldersParams {
    pub project_code: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort_field: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

/// One folder path to create or update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderUpsert {
    /// Folder names from the root to the leaf.
    pub path: Vec<String>,
    /// Comment for the leaf folder (HTML).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Parameters for `bulk_upsert_folders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpsertFoldersParams {
    pub project_code: String,
    pub folders: Vec<FolderUpsert>,
}

impl BulkUpsertFoldersParams {
    fn validate(&self) -> QaSphereResult<()> {
        validate_loose_project_code(&self.project_code)?;

        if self.folders.is_empty() {
            return Err(QaSphereError::invalid_params(
                "folders must contain at least one folder",
            ));
        }

        for folder in &self.folders {
            if folder.path.is_empty() {
                return Err(QaSphereError::invalid_params(
                    "Folder path must contain at least one folder name",
                ));
            }
            for name in &folder.path {
                validate_len("Folder name", name, 1, 255)?;
                if name.contains('/') {
                    return Err(QaSphereError::invalid_params(
                        "Folder names cannot contain forward slash (/) characters",
                    ));
                }
                if name.trim().is_empty() {
                    return Err(QaSphereError::invalid_params(
                        "Folder names cannot be empty strings",
                    ));
                }
            }
        }

        Ok(())
    }
}

pub fn descriptions() -> Vec<ToolDescription> {
    let project_code = json!({
        "type": "string",
        "pattern": "^[A-Z0-9]+$",
        "description": "Project code identifier (e.g., BDI)"
    });

    vec![
        ToolDescription::new(
            "list_test_cases_folders",
            "List folders for test cases within a specific QA Sphere project. Allows pagination and sorting.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code,
                    "page": {
                        "type": "number",
                        "description": "Page number for pagination"
                    },
                    "limit": {
                        "type": "number",
                        "default": DEFAULT_FOLDER_LIMIT,
                        "description": "Number of items per page"
                    },
                    "sortField": {
                        "type": "string",
                        "enum": FOLDER_SORT_FIELDS,
                        "description": "Field to sort results by"
                    },
                    "sortOrder": sort_order_schema("Sort direction (ascending or descending)")
                },
                "required": ["projectCode"]
            }),
        ),
        ToolDescription::new(
            "bulk_upsert_folders",
            "Creates or updates multiple folders in a single request using folder path hierarchies. Automatically creates nested folder structures and updates existing folders' comments.",
            json!({
                "type": "object",
                "properties": {
                    "projectCode": project_code,
                    "folders": {
                        "type": "array",
                        "minItems": 1,
                        "description": "Array of folder requests to create or update",
                        "items": {
                            "type": "object",
                            "properties": {
                                "path": {
                                    "type": "array",
                                    "minItems": 1,
                                    "items": { "type": "string", "minLength": 1, "maxLength": 255 },
                                    "description": "Array of folder names representing the hierarchy"
                                },
                                "comment": {
                                    "type": "string",
                                    "description": "Additional notes or description for the leaf folder (HTML format). Set null or omit to keep existing comment of an existing folder."
                                }
                            },
                            "required": ["path"]
                        }
                    }
                },
                "required": ["projectCode", "folders"]
            }),
        ),
    ]
}

pub async fn list_test_cases_folders(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: ListFoldersParams = parse_args(arguments)?;
    validate_loose_project_code(&params.project_code)?;
    validate_opt_one_of("sortField", params.sort_field.as_deref(), FOLDER_SORT_FIELDS)?;
    validate_opt_one_of("sortOrder", params.sort_order.as_deref(), SORT_ORDERS)?;

    let mut query = QueryParams::new();
    query
        .push_opt("page", params.page)
        .push("limit", params.limit.unwrap_or(DEFAULT_FOLDER_LIMIT))
        .push_opt("sortField", params.sort_field.as_deref())
        .push_opt("sortOrder", params.sort_order.as_deref());

    let folders = client
        .get(&format!("/project/{}/tcase/folders", params.project_code), &query)
        .await
        .map_err(|e| {
            describe_failure(e, "fetch test case folders", |status, _| match status {
                404 => Some(format!("Project with code '{}' not found.", params.project_code)),
                _ => None,
            })
        })?;

    let items = array_field(&folders, "data").ok_or_else(|| {
        QaSphereError::invalid_response("Invalid response: expected a list of folders")
    })?;

    if !present(&folders, "total") || !present(&folders, "page") || !present(&folders, "limit") {
        return Err(QaSphereError::invalid_response(
            "Invalid response: missing required fields (total, page, or limit)",
        ));
    }

    if let Some(first) = items.first() {
        if !present(first, "id") || !truthy(first, "title") {
            return Err(QaSphereError::invalid_response(
                "Invalid folder data: missing required fields (id or title)",
            ));
        }
    }

    Ok(folders.to_string())
}

/// Upserts folder paths and returns the created or matched IDs, pretty-printed.
pub async fn bulk_upsert_folders(client: &ApiClient, arguments: Value) -> QaSphereResult<String> {
    let params: BulkUpsertFoldersParams = parse_args(arguments)?;
    params.validate()?;

    let body = json!({ "folders": params.folders });
    let result = client
        .post(&format!("/project/{}/tcase/folder/bulk", params.project_code), &body)
        .await
        .map_err(|e| {
            let server_message = e.server_message().map(str::to_string);
            describe_failure(e, "bulk upsert folders", |status, _| match status {
                400 => Some(format!(
                    "Invalid request: {}",
                    server_message
                        .as_deref()
                        .unwrap_or("Invalid request body or folder path format")
                )),
                404 => Some(format!("Project with code '{}' not found", params.project_code)),
                500 => Some("Internal server error".to_string()),
                other => auth_failure(other),
            })
        })?;

    check_folder_ids(&result, &params.folders)?;

    Ok(serde_json::to_string_pretty(&result)?)
}

/// The response must carry one ID array per requested path, each as long as its path.
fn check_folder_ids(result: &Value, folders: &[FolderUpsert]) -> QaSphereResult<()> {
    let ids = array_field(result, "ids").ok_or_else(|| {
        QaSphereError::invalid_response("Invalid response: expected an array of folder ID arrays")
    })?;

    if ids.len() != folders.len() {
        return Err(QaSphereError::invalid_response(format!(
            "Invalid response: expected {} folder ID arrays, got {}",
            folders.len(),
            ids.len()
        )));
    }

    for (i, (entry, folder)) in ids.iter().zip(folders).enumerate() {
        let got = entry.as_array().map_or(0, Vec::len);
        if entry.as_array().is_none() || got != folder.path.len() {
            return Err(QaSphereError::invalid_response(format!(
                "Invalid response: folder {} expected {} IDs, got {}",
                i,
                folder.path.len(),
                got
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(args: Value) -> QaSphereResult<()> {
        parse_args::<BulkUpsertFoldersParams>(args)?.validate()
    }

    #[test]
    fn test_bulk_upsert_validation() {
        assert!(upsert(json!({"projectCode": "BDI", "folders": [{"path": ["A", "B"]}]})).is_ok());

        let err = upsert(json!({"projectCode": "BDI", "folders": []})).unwrap_err();
        assert_eq!(err.to_string(), "folders must contain at least one folder");

        let err = upsert(json!({"projectCode": "BDI", "folders": [{"path": ["A/B"]}]})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Folder names cannot contain forward slash (/) characters"
        );

        let err = upsert(json!({"projectCode": "BDI", "folders": [{"path": ["  "]}]})).unwrap_err();
        assert_eq!(err.to_string(), "Folder names cannot be empty strings");

        assert!(upsert(json!({"projectCode": "BDI", "folders": [{"path": []}]})).is_err());
        assert!(upsert(json!({"projectCode": "BDI", "folders": [{"path": [""]}]})).is_err());
        assert!(upsert(json!({"projectCode": "bdi", "folders": [{"path": ["A"]}]})).is_err());
    }

    #[test]
    fn test_request_body_omits_missing_comment() {
        let params: BulkUpsertFoldersParams = parse_args(json!({
            "projectCode": "BDI",
            "folders": [{"path": ["A"]}, {"path": ["B"], "comment": "<p>c</p>"}]
        }))
        .unwrap();
        let body = json!({ "folders": params.folders });
        assert_eq!(
            body,
            json!({"folders": [{"path": ["A"]}, {"path": ["B"], "comment": "<p>c</p>"}]})
        );
    }

    #[test]
    fn test_check_folder_ids() {
        let folders = vec![
            FolderUpsert { path: vec!["A".into(), "B".into()], comment: None },
            FolderUpsert { path: vec!["C".into()], comment: None },
        ];

        assert!(check_folder_ids(&json!({"ids": [[1, 2], [3]]}), &folders).is_ok());

        let err = check_folder_ids(&json!({"ids": [[1, 2]]}), &folders).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid response: expected 2 folder ID arrays, got 1"
        );

        let err = check_folder_ids(&json!({"ids": [[1], [3]]}), &folders).unwrap_err();
        assert_eq!(err.to_string(), "Invalid response: folder 0 expected 2 IDs, got 1");

        let err = check_folder_ids(&json!({"ids": [[1, 2], 3]}), &folders).unwrap_err();
        assert_eq!(err.to_string(), "Invalid response: folder 1 expected 1 IDs, got 0");

        assert!(check_folder_ids(&json!({}), &folders).is_err());
    }
}
