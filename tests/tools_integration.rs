//! Tool calls against an in-process mock of the QA Sphere API.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use qasphere_mcp::mcp::{ToolHandler, ToolResult};
use qasphere_mcp::Config;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// A request as seen by the mock API.
#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: String,
    body: Value,
}

#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Recorder {
    fn last(&self) -> Recorded {
        self.requests.lock().unwrap().last().cloned().expect("a request was made")
    }

    fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn mock_api(State(recorder): State<Recorder>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri
        .path()
        .strip_prefix("/api/public/v0")
        .unwrap_or(uri.path())
        .to_string();
    recorder.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().unwrap_or_default().to_string(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    match (method.as_str(), path.as_str()) {
        ("GET", "/project") => Json(json!({
            "projects": [{ "id": "p1", "code": "BDI", "title": "Bistro Delivery" }]
        }))
        .into_response(),
        ("GET", "/project/BDI") => {
            Json(json!({ "id": "p1", "code": "BDI", "title": "Bistro Delivery" })).into_response()
        }
        ("GET", "/project/MISS") => error(StatusCode::NOT_FOUND, "Project not found"),

        ("GET", "/project/BDI/tcase/1") => Json(json!({
            "id": "tc1",
            "seq": 1,
            "title": "Login works",
            "version": 1,
            "comment": "<p>User exists</p>",
            "steps": [
                { "description": "Open login page", "expected": "Form is shown" },
                { "sharedStepId": 4, "description": "Shared", "expected": "Done" }
            ],
            "folder": { "id": 3, "comment": "folder note" }
        }))
        .into_response(),
        ("GET", "/project/BDI/tcase/2") => error(StatusCode::NOT_FOUND, "Test case not found"),
        ("GET", "/project/BDI/tcase") => Json(json!({
            "total": 1,
            "page": 1,
            "limit": 20,
            "data": [{
                "id": "tc1",
                "title": "Login works",
                "comment": "<p>User exists</p>",
                "steps": [{ "description": "Open", "expected": "Shown" }]
            }]
        }))
        .into_response(),

        ("POST", "/project/BDI/tcase") => Json(json!({ "id": "tc9", "seq": 9 })).into_response(),
        ("POST", "/project/DENY/tcase") => error(StatusCode::UNAUTHORIZED, "unauthorized"),
        ("POST", "/project/BAN/tcase") => error(StatusCode::FORBIDDEN, "forbidden"),
        ("PATCH", "/project/BDI/tcase/tc1") => {
            Json(json!({ "message": "Test case updated" })).into_response()
        }

        ("POST", "/project/BDI/tcase/folder/bulk") => {
            Json(json!({ "ids": [[1, 2], [3]] })).into_response()
        }
        ("POST", "/project/SHORT/tcase/folder/bulk") => {
            Json(json!({ "ids": [[1], [3]] })).into_response()
        }
        ("POST", "/project/FULL/tcase/folder/bulk") => (StatusCode::BAD_REQUEST, "").into_response(),

        ("GET", "/project/BDI/requirement") => Json(json!({
            "requirements": [{
                "id": "r1",
                "text": "Login",
                "url": "https://jira.example.com/browse/J-1",
                "internalNote": "dropped",
                "integrationLink": {
                    "issueId": "J-1",
                    "issueTitle": "Login",
                    "issueUrl": "https://jira.example.com/browse/J-1",
                    "remoteLinkId": 5
                }
            }]
        }))
        .into_response(),
        ("GET", "/project/RQB/requirement") => {
            Json(json!({ "requirements": [{ "id": "r1" }] })).into_response()
        }

        ("POST", "/project/BDI/shared-step") => Json(json!({ "id": 12 })).into_response(),
        ("POST", "/project/DUP/tcase/folder/bulk") => {
            error(StatusCode::BAD_REQUEST, "Duplicate folder path")
        }

        ("GET", "/project/BDI/tcase/folders") => Json(json!({
            "total": 1,
            "page": 1,
            "limit": 100,
            "data": [{ "id": 0, "title": "Root", "parentId": null }]
        }))
        .into_response(),
        ("GET", "/project/NOTOT/tcase/folders") => Json(json!({ "data": [] })).into_response(),

        ("GET", "/project/BDI/tag") => {
            Json(json!({ "tags": [{ "id": 0, "title": "smoke" }] })).into_response()
        }
        ("GET", "/project/UNT/tag") => {
            Json(json!({ "tags": [{ "id": 1, "title": "" }] })).into_response()
        }
        ("GET", "/project/NOTAG/tag") => error(StatusCode::NOT_FOUND, "Project not found"),

        ("GET", "/project/BDI/custom-field") => Json(json!({
            "customFields": [{ "id": "cf1", "systemName": "browser", "type": "dropdown" }]
        }))
        .into_response(),
        ("GET", "/project/DENY/custom-field") => error(StatusCode::UNAUTHORIZED, "unauthorized"),

        ("GET", "/project/BDI/shared-step") => Json(json!({
            "sharedSteps": [{ "id": 4, "title": "Log in", "subSteps": [] }]
        }))
        .into_response(),
        ("GET", "/project/NOSUB/shared-step") => {
            Json(json!({ "sharedSteps": [{ "id": 4, "title": "Log in" }] })).into_response()
        }
        ("GET", "/project/BDI/shared-step/4") => Json(json!({
            "id": 4,
            "title": "Log in",
            "subSteps": [{ "id": 1, "description": "Open page" }]
        }))
        .into_response(),
        ("GET", "/project/BDI/shared-step/5") => error(StatusCode::NOT_FOUND, "Shared step not found"),
        ("PATCH", "/project/BDI/shared-step/4") => {
            Json(json!({ "message": "Shared step updated" })).into_response()
        }
        ("PATCH", "/project/BDI/shared-step/6") => Json(json!({})).into_response(),
        ("POST", "/project/DUP/shared-step") => error(StatusCode::CONFLICT, "Title taken"),

        ("GET", "/project/BDI/shared-precondition") => Json(json!([
            { "id": 0, "title": "Logged in", "text": "<p>User is logged in</p>" }
        ]))
        .into_response(),
        ("GET", "/project/OBJ/shared-precondition") => Json(json!({ "data": [] })).into_response(),
        ("GET", "/project/BDI/shared-precondition/3") => Json(json!({
            "id": 3,
            "title": "Logged in",
            "text": "<p>User is logged in</p>"
        }))
        .into_response(),
        ("POST", "/project/BDI/shared-precondition") => Json(json!({ "id": 8 })).into_response(),
        ("POST", "/project/DUP/shared-precondition") => error(StatusCode::CONFLICT, "Title taken"),
        ("PATCH", "/project/BDI/shared-precondition/3") => {
            Json(json!({ "message": "Shared precondition updated" })).into_response()
        }
        ("PATCH", "/project/BDI/shared-precondition/9") => {
            (StatusCode::INTERNAL_SERVER_ERROR, "").into_response()
        }

        _ => error(StatusCode::NOT_FOUND, "No route"),
    }
}

async fn spawn_api() -> (ToolHandler, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/{*path}", any(mock_api))
        .with_state(recorder.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move { axum::serve(listener, app).await });

    let mut config = Config::default();
    config.api.tenant_url = format!("http://{addr}");
    config.api.api_key = "test-key".to_string();
    (ToolHandler::new(&config).unwrap(), recorder)
}

fn parse(result: &ToolResult) -> Value {
    assert!(!result.is_error, "tool failed: {}", result.text());
    serde_json::from_str(result.text()).expect("tool output is JSON")
}

#[tokio::test]
async fn test_list_and_get_project() {
    let (tools, recorder) = spawn_api().await;

    let projects = parse(&tools.handle_tool_call("list_projects", json!({})).await);
    assert_eq!(projects["projects"][0]["code"], "BDI");

    let project = parse(
        &tools
            .handle_tool_call("get_project", json!({ "projectCode": "BDI" }))
            .await,
    );
    assert_eq!(project["title"], "Bistro Delivery");
    assert_eq!(recorder.last().path, "/project/BDI");
}

#[tokio::test]
async fn test_get_project_not_found() {
    let (tools, _) = spawn_api().await;
    let result = tools
        .handle_tool_call("get_project", json!({ "projectCode": "MISS" }))
        .await;

    assert!(result.is_error);
    assert_eq!(result.text(), "Project with code 'MISS' not found.");
}

#[tokio::test]
async fn test_get_test_case_renames_fields() {
    let (tools, _) = spawn_api().await;
    let tcase = parse(
        &tools
            .handle_tool_call("get_test_case", json!({ "marker": "BDI-1" }))
            .await,
    );

    assert_eq!(tcase["precondition"], "<p>User exists</p>");
    assert!(tcase.get("comment").is_none());
    assert_eq!(tcase["steps"][0]["action"], "Open login page");
    assert_eq!(tcase["steps"][0]["expected_result"], "Form is shown");
    assert_eq!(tcase["steps"][1]["sharedStepId"], 4);
    // Keys without rules are copied as-is, including nested objects
    assert_eq!(tcase["folder"]["comment"], "folder note");
}

#[tokio::test]
async fn test_get_test_case_failure_uses_server_message() {
    let (tools, _) = spawn_api().await;
    let result = tools
        .handle_tool_call("get_test_case", json!({ "marker": "BDI-2" }))
        .await;

    assert!(result.is_error);
    assert_eq!(result.text(), "Failed to fetch test case: Test case not found");
}

#[tokio::test]
async fn test_list_test_cases_query_and_renames() {
    let (tools, recorder) = spawn_api().await;
    let list = parse(
        &tools
            .handle_tool_call(
                "list_test_cases",
                json!({ "projectCode": "BDI", "priorities": ["high", "low"], "search": "" }),
            )
            .await,
    );

    assert_eq!(list["data"][0]["precondition"], "<p>User exists</p>");
    assert_eq!(list["data"][0]["steps"][0]["action"], "Open");

    let request = recorder.last();
    assert_eq!(request.path, "/project/BDI/tcase");
    assert!(request.query.contains("limit=20"));
    assert!(request.query.contains("priorities=high&priorities=low"));
    assert!(!request.query.contains("search"));
}

#[tokio::test]
async fn test_invalid_arguments_never_reach_the_api() {
    let (tools, recorder) = spawn_api().await;

    let result = tools
        .handle_tool_call("list_test_cases", json!({ "projectCode": "bdi" }))
        .await;
    assert!(result.is_error);

    let result = tools
        .handle_tool_call(
            "list_test_cases",
            json!({ "projectCode": "BDI", "priorities": ["urgent"] }),
        )
        .await;
    assert!(result.is_error);

    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn test_create_test_case_sends_body() {
    let (tools, recorder) = spawn_api().await;
    let created = parse(
        &tools
            .handle_tool_call(
                "create_test_case",
                json!({
                    "projectId": "BDI",
                    "title": "Checkout",
                    "type": "standalone",
                    "folderId": 3,
                    "priority": "medium"
                }),
            )
            .await,
    );
    assert_eq!(created["id"], "tc9");

    let request = recorder.last();
    assert_eq!(request.method, "POST");
    assert_eq!(request.body["type"], "standalone");
    assert_eq!(request.body["isDraft"], false);
}

#[tokio::test]
async fn test_create_test_case_auth_failures() {
    let (tools, _) = spawn_api().await;
    let args = |project: &str| {
        json!({
            "projectId": project,
            "title": "Checkout",
            "type": "standalone",
            "folderId": 3,
            "priority": "medium"
        })
    };

    let result = tools.handle_tool_call("create_test_case", args("DENY")).await;
    assert_eq!(result.text(), "Invalid or missing API key");

    let result = tools.handle_tool_call("create_test_case", args("BAN")).await;
    assert_eq!(result.text(), "Insufficient permissions or suspended tenant");
}

#[tokio::test]
async fn test_update_test_case_patches() {
    let (tools, recorder) = spawn_api().await;
    let updated = parse(
        &tools
            .handle_tool_call(
                "update_test_case",
                json!({ "projectId": "BDI", "tcaseOrLegacyId": "tc1", "title": "Renamed" }),
            )
            .await,
    );
    assert_eq!(updated["message"], "Test case updated");

    let request = recorder.last();
    assert_eq!(request.method, "PATCH");
    assert_eq!(request.body["title"], "Renamed");
}

#[tokio::test]
async fn test_bulk_upsert_folders_pretty_output() {
    let (tools, recorder) = spawn_api().await;
    let result = tools
        .handle_tool_call(
            "bulk_upsert_folders",
            json!({
                "projectCode": "BDI",
                "folders": [{ "path": ["Web", "Auth"] }, { "path": ["Mobile"], "comment": "<p>iOS</p>" }]
            }),
        )
        .await;

    let ids = parse(&result);
    assert_eq!(ids["ids"], json!([[1, 2], [3]]));
    assert!(result.text().contains('\n'));

    let body = recorder.last().body;
    assert_eq!(body["folders"][0]["path"], json!(["Web", "Auth"]));
    assert!(body["folders"][0].get("comment").is_none());
    assert_eq!(body["folders"][1]["comment"], "<p>iOS</p>");
}

#[tokio::test]
async fn test_bulk_upsert_folders_checks_id_lengths() {
    let (tools, _) = spawn_api().await;
    let result = tools
        .handle_tool_call(
            "bulk_upsert_folders",
            json!({ "projectCode": "SHORT", "folders": [{ "path": ["Web", "Auth"] }, { "path": ["Mobile"] }] }),
        )
        .await;

    assert!(result.is_error);
    assert_eq!(result.text(), "Invalid response: folder 0 expected 2 IDs, got 1");
}

#[tokio::test]
async fn test_bulk_upsert_folders_bad_request_without_message() {
    let (tools, _) = spawn_api().await;
    let result = tools
        .handle_tool_call(
            "bulk_upsert_folders",
            json!({ "projectCode": "FULL", "folders": [{ "path": ["Web"] }] }),
        )
        .await;

    assert!(result.is_error);
    assert_eq!(
        result.text(),
        "Invalid request: Invalid request body or folder path format"
    );
}

#[tokio::test]
async fn test_bulk_upsert_folders_bad_request_with_message() {
    let (tools, _) = spawn_api().await;
    let result = tools
        .handle_tool_call(
            "bulk_upsert_folders",
            json!({ "projectCode": "DUP", "folders": [{ "path": ["Web"] }] }),
        )
        .await;

    assert!(result.is_error);
    assert_eq!(result.text(), "Invalid request: Duplicate folder path");
}

#[tokio::test]
async fn test_bulk_upsert_folders_rejects_slashes() {
    let (tools, recorder) = spawn_api().await;
    let result = tools
        .handle_tool_call(
            "bulk_upsert_folders",
            json!({ "projectCode": "BDI", "folders": [{ "path": ["Web/Auth"] }] }),
        )
        .await;

    assert!(result.is_error);
    assert!(result.text().contains("forward slash"));
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn test_list_requirements_drops_unknown_fields() {
    let (tools, _) = spawn_api().await;
    let result = tools
        .handle_tool_call("list_requirements", json!({ "projectCode": "BDI" }))
        .await;

    let list = parse(&result);
    assert_eq!(list["requirements"][0]["id"], "r1");
    assert_eq!(list["requirements"][0]["integrationLink"]["remoteLinkId"], 5);
    assert!(!result.text().contains("internalNote"));
}

#[tokio::test]
async fn test_list_requirements_rejects_malformed_body() {
    let (tools, _) = spawn_api().await;
    let result = tools
        .handle_tool_call("list_requirements", json!({ "projectCode": "RQB" }))
        .await;

    assert!(result.is_error);
    assert!(result.text().starts_with("Invalid response data:"));
}

#[tokio::test]
async fn test_create_shared_step_trims_sub_steps() {
    let (tools, recorder) = spawn_api().await;
    let created = parse(
        &tools
            .handle_tool_call(
                "create_shared_step",
                json!({
                    "projectCode": "BDI",
                    "title": "Log in",
                    "subSteps": [
                        { "description": "  Open page  ", "expected": "" },
                        { "expected": "Form shown" }
                    ]
                }),
            )
            .await,
    );
    assert_eq!(created["id"], 12);

    let body = recorder.last().body;
    assert_eq!(
        body["subSteps"],
        json!([{ "description": "Open page" }, { "expected": "Form shown" }])
    );
}

#[tokio::test]
async fn test_unreachable_tenant_is_a_tool_error() {
    let mut config = Config::default();
    config.api.tenant_url = "http://127.0.0.1:9".to_string();
    config.api.api_key = "test-key".to_string();
    let tools = ToolHandler::new(&config).unwrap();

    let result = tools.handle_tool_call("list_projects", json!({})).await;
    assert!(result.is_error);
    assert!(result.text().starts_with("Failed to fetch projects:"));
}

#[tokio::test]
async fn test_list_folders_default_limit_and_zero_id() {
    let (tools, recorder) = spawn_api().await;
    let folders = parse(
        &tools
            .handle_tool_call("list_test_cases_folders", json!({ "projectCode": "BDI" }))
            .await,
    );

    // An id of 0 only has to be present
    assert_eq!(folders["data"][0]["id"], 0);
    let request = recorder.last();
    assert_eq!(request.path, "/project/BDI/tcase/folders");
    assert_eq!(request.query, "limit=100");
}

#[tokio::test]
async fn test_list_folders_requires_pagination_fields() {
    let (tools, _) = spawn_api().await;
    let result = tools
        .handle_tool_call("list_test_cases_folders", json!({ "projectCode": "NOTOT" }))
        .await;

    assert!(result.is_error);
    assert_eq!(
        result.text(),
        "Invalid response: missing required fields (total, page, or limit)"
    );
}

#[tokio::test]
async fn test_list_tags() {
    let (tools, _) = spawn_api().await;
    let tags = parse(
        &tools
            .handle_tool_call("list_test_cases_tags", json!({ "projectCode": "BDI" }))
            .await,
    );
    assert_eq!(tags["tags"][0]["title"], "smoke");

    let result = tools
        .handle_tool_call("list_test_cases_tags", json!({ "projectCode": "UNT" }))
        .await;
    assert_eq!(
        result.text(),
        "Invalid tag data: missing required fields (id or title)"
    );

    let result = tools
        .handle_tool_call("list_test_cases_tags", json!({ "projectCode": "NOTAG" }))
        .await;
    assert_eq!(result.text(), "Project with identifier 'NOTAG' not found.");
}

#[tokio::test]
async fn test_list_custom_fields() {
    let (tools, recorder) = spawn_api().await;
    let fields = parse(
        &tools
            .handle_tool_call("list_custom_fields", json!({ "projectCode": "BDI" }))
            .await,
    );
    assert_eq!(fields["customFields"][0]["systemName"], "browser");
    assert_eq!(recorder.last().path, "/project/BDI/custom-field");

    let result = tools
        .handle_tool_call("list_custom_fields", json!({ "projectCode": "DENY" }))
        .await;
    assert!(result.is_error);
    assert_eq!(result.text(), "Invalid or missing API key");
}

#[tokio::test]
async fn test_list_and_get_shared_steps() {
    let (tools, recorder) = spawn_api().await;

    let list = parse(
        &tools
            .handle_tool_call(
                "list_shared_steps",
                json!({ "projectCode": "BDI", "sortField": "title", "sortOrder": "asc" }),
            )
            .await,
    );
    assert_eq!(list["sharedSteps"][0]["id"], 4);
    assert_eq!(recorder.last().query, "sortField=title&sortOrder=asc");

    let result = tools
        .handle_tool_call("list_shared_steps", json!({ "projectCode": "NOSUB" }))
        .await;
    assert_eq!(
        result.text(),
        "Invalid shared step data: missing required fields (id, title, or subSteps)"
    );

    let step = parse(
        &tools
            .handle_tool_call("get_shared_step", json!({ "projectCode": "BDI", "sharedStepId": 4 }))
            .await,
    );
    assert_eq!(step["subSteps"][0]["description"], "Open page");

    let result = tools
        .handle_tool_call("get_shared_step", json!({ "projectCode": "BDI", "sharedStepId": 5 }))
        .await;
    assert_eq!(
        result.text(),
        "Project or shared step not found: Shared step not found"
    );
}

#[tokio::test]
async fn test_update_shared_step_needs_confirmation() {
    let (tools, recorder) = spawn_api().await;

    let updated = parse(
        &tools
            .handle_tool_call(
                "update_shared_step",
                json!({
                    "projectCode": "BDI",
                    "sharedStepId": 4,
                    "subSteps": [{ "id": 1, "description": "Open login page " }]
                }),
            )
            .await,
    );
    assert_eq!(updated["message"], "Shared step updated");
    let request = recorder.last();
    assert_eq!(request.method, "PATCH");
    assert_eq!(
        request.body,
        json!({ "subSteps": [{ "id": 1, "description": "Open login page" }] })
    );

    let result = tools
        .handle_tool_call(
            "update_shared_step",
            json!({ "projectCode": "BDI", "sharedStepId": 6, "title": "Log in" }),
        )
        .await;
    assert_eq!(
        result.text(),
        "Invalid response: missing confirmation message for updated shared step"
    );
}

#[tokio::test]
async fn test_create_shared_step_conflict() {
    let (tools, _) = spawn_api().await;
    let result = tools
        .handle_tool_call(
            "create_shared_step",
            json!({ "projectCode": "DUP", "title": "Log in", "subSteps": [{ "description": "Open" }] }),
        )
        .await;

    assert!(result.is_error);
    assert_eq!(
        result.text(),
        "A shared step with the same title already exists: Title taken"
    );
}

#[tokio::test]
async fn test_list_shared_preconditions_expects_bare_array() {
    let (tools, recorder) = spawn_api().await;

    let list = parse(
        &tools
            .handle_tool_call("list_shared_preconditions", json!({ "projectCode": "BDI" }))
            .await,
    );
    assert_eq!(list[0]["title"], "Logged in");

    let result = tools
        .handle_tool_call("list_shared_preconditions", json!({ "projectCode": "OBJ" }))
        .await;
    assert_eq!(
        result.text(),
        "Invalid response: expected an array of shared preconditions"
    );

    let before = recorder.count();
    let result = tools
        .handle_tool_call(
            "list_shared_preconditions",
            json!({ "projectCode": "BDI", "sortOrder": "desc" }),
        )
        .await;
    assert!(result.is_error);
    assert_eq!(recorder.count(), before);
}

#[tokio::test]
async fn test_shared_precondition_get_create_update() {
    let (tools, recorder) = spawn_api().await;

    let precondition = parse(
        &tools
            .handle_tool_call(
                "get_shared_precondition",
                json!({ "projectCode": "BDI", "sharedPreconditionId": 3 }),
            )
            .await,
    );
    assert_eq!(precondition["text"], "<p>User is logged in</p>");

    let created = parse(
        &tools
            .handle_tool_call(
                "create_shared_precondition",
                json!({ "projectCode": "BDI", "title": "Cart", "text": "<p>Cart has items</p>" }),
            )
            .await,
    );
    assert_eq!(created["id"], 8);
    assert_eq!(
        recorder.last().body,
        json!({ "title": "Cart", "text": "<p>Cart has items</p>" })
    );

    let updated = parse(
        &tools
            .handle_tool_call(
                "update_shared_precondition",
                json!({ "projectCode": "BDI", "sharedPreconditionId": 3, "title": "Signed in" }),
            )
            .await,
    );
    assert_eq!(updated["message"], "Shared precondition updated");
    assert_eq!(recorder.last().body, json!({ "title": "Signed in" }));
}

#[tokio::test]
async fn test_shared_precondition_failures() {
    let (tools, _) = spawn_api().await;

    let result = tools
        .handle_tool_call(
            "create_shared_precondition",
            json!({ "projectCode": "DUP", "title": "Cart", "text": "<p>x</p>" }),
        )
        .await;
    assert_eq!(
        result.text(),
        "A shared precondition with the same title already exists: Title taken"
    );

    let result = tools
        .handle_tool_call(
            "update_shared_precondition",
            json!({ "projectCode": "BDI", "sharedPreconditionId": 9, "text": "<p>x</p>" }),
        )
        .await;
    assert_eq!(
        result.text(),
        "Internal server error while updating shared precondition"
    );
}
