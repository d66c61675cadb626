use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Local;
use salesboard_server::app::build_router;
use salesboard_server::config::{CrmConfig, MediaConfig, RosterConfig, ServerConfig, Settings};
use salesboard_server::state::AppState;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "salesboard-test-boundary";

fn test_settings(crm_url: String, dir: &TempDir) -> Settings {
    let static_dir = dir.path().join("static");
    let uploads = static_dir.join("uploads");
    Settings {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_upload_bytes: 1024 * 1024,
        },
        crm: CrmConfig {
            base_url: crm_url,
            api_key: "test-token".to_string(),
            page_limit: 100,
            closed_won_stage: "2055465198".to_string(),
            timeout_seconds: Some(5),
        },
        roster: RosterConfig {
            data_file: dir.path().join("data.json"),
        },
        media: MediaConfig {
            static_dir,
            photos_dir: uploads.join("photos"),
            icons_dir: uploads.join("icons"),
            videos_dir: uploads.join("videos"),
        },
    }
}

async fn app_with_roster(crm: &MockServer, dir: &TempDir, roster: Value) -> Router {
    std::fs::write(dir.path().join("data.json"), roster.to_string()).unwrap();
    let state = AppState::new(test_settings(crm.uri(), dir)).await.unwrap();
    build_router(state)
}

async fn mount_owners(crm: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/crm/v3/owners"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": "1", "firstName": "John", "lastName": "Smith"},
                {"id": "2", "firstName": "Alice", "lastName": "Jones"}
            ]
        })))
        .expect(expected_calls)
        .mount(crm)
        .await;
}

fn john_smith_roster() -> Value {
    json!({
        "John Smith": {
            "short": "JS",
            "file_id": "john",
            "goal_name": "Q1",
            "photo": "john.png",
            "icon": "john-icon.png",
            "video": "john.mp4"
        }
    })
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_form(app: &Router, uri: &str, body: Vec<u8>) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_monthly_sales_for_roster_member() {
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_owners(&crm, 1).await;

    let this_month = Local::now().format("%Y-%m-%dT12:00:00Z").to_string();
    Mock::given(method("GET"))
        .and(path("/crm/v3/objects/deals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": "10", "properties": {
                    "amount": "1000", "hubspot_owner_id": "1",
                    "dealstage": "2055465198", "closedate": this_month
                }},
                {"id": "11", "properties": {
                    "amount": "700", "hubspot_owner_id": "1",
                    "dealstage": "appointmentscheduled", "closedate": this_month
                }},
                {"id": "12", "properties": {
                    "amount": "300", "hubspot_owner_id": "2",
                    "dealstage": "2055465198", "closedate": this_month
                }}
            ]
        })))
        .mount(&crm)
        .await;

    let app = app_with_roster(&crm, &dir, john_smith_roster()).await;

    let (status, body) = get(&app, "/data").await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Name"], "JS");
    assert_eq!(rows[0]["Sales"].as_f64(), Some(1000.0));

    // owner directory is loaded once and reused
    let (status, _) = get(&app, "/data").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_sales_survive_a_failing_deal_listing() {
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_owners(&crm, 1).await;

    Mock::given(method("GET"))
        .and(path("/crm/v3/objects/deals"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&crm)
        .await;

    let app = app_with_roster(&crm, &dir, john_smith_roster()).await;

    let (status, body) = get(&app, "/data").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_goals_filtered_to_roster_goals() {
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_owners(&crm, 1).await;

    Mock::given(method("GET"))
        .and(path("/crm/v3/objects/goal_targets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": "g1", "properties": {
                    "hs_goal_name": "Q1", "hs_target_amount": "5000",
                    "hs_start_datetime": "2024-01-01", "hs_end_datetime": "2024-03-31",
                    "hs_created_by_user_id": "1"
                }},
                {"id": "g2", "properties": {
                    "hs_goal_name": "Q2", "hs_target_amount": "6000",
                    "hs_created_by_user_id": "2"
                }}
            ]
        })))
        .mount(&crm)
        .await;

    let app = app_with_roster(&crm, &dir, john_smith_roster()).await;

    let (status, body) = get(&app, "/goals").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "Goal Name": "Q1",
            "Target": "5000",
            "Start": "2024-01-01",
            "End": "2024-03-31",
            "Created By": "John Smith"
        }])
    );
}

#[tokio::test]
async fn test_goals_relay_upstream_failure() {
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/crm/v3/objects/goal_targets"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired token"))
        .mount(&crm)
        .await;

    let app = app_with_roster(&crm, &dir, john_smith_roster()).await;

    let (status, body) = get(&app, "/goals").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Failed to fetch goals");
}

#[tokio::test]
async fn test_admin_create_then_delete_person() {
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let app = app_with_roster(&crm, &dir, json!({})).await;

    let body = multipart_body(
        &[
            ("full_name", "Jane Doe"),
            ("short_name", "JD"),
            ("file_id", " Jane "),
            ("goal_name", "Q1"),
        ],
        &[
            ("photo", "jane.png", b"photo-bytes".as_slice()),
            ("icon", "jane-icon.png", b"icon-bytes".as_slice()),
            ("video", "jane.mp4", b"video-bytes".as_slice()),
        ],
    );
    let response = post_form(&app, "/manage", body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/manage");

    let (status, people) = get(&app, "/people").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(people["Jane Doe"]["short"], "JD");
    assert_eq!(people["Jane Doe"]["file_id"], "jane");
    assert_eq!(people["Jane Doe"]["icon"], "jane-icon.png");

    let photo = dir.path().join("static/uploads/photos/jane.png");
    assert_eq!(std::fs::read(&photo).unwrap(), b"photo-bytes".as_slice());

    let (status, _) = get(&app, "/delete/Jane%20Doe").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(!photo.exists());

    let (_, people) = get(&app, "/people").await;
    assert_eq!(people, json!({}));
}

#[tokio::test]
async fn test_admin_create_requires_all_media() {
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let app = app_with_roster(&crm, &dir, json!({})).await;

    let body = multipart_body(
        &[
            ("full_name", "Jane Doe"),
            ("short_name", "JD"),
            ("file_id", "jane"),
            ("goal_name", "Q1"),
        ],
        &[("photo", "jane.png", b"photo-bytes".as_slice())],
    );
    let response = post_form(&app, "/manage", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, people) = get(&app, "/people").await;
    assert_eq!(people, json!({}));
}

#[tokio::test]
async fn test_update_unknown_person_is_not_found() {
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let app = app_with_roster(&crm, &dir, john_smith_roster()).await;

    let body = multipart_body(
        &[("short_name", "X"), ("file_id", "x"), ("goal_name", "Q1")],
        &[],
    );
    let response = post_form(&app, "/update/Nobody", body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_keeps_media_names_for_same_id() {
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let app = app_with_roster(&crm, &dir, john_smith_roster()).await;

    let body = multipart_body(
        &[("short_name", "Johnny"), ("file_id", "john"), ("goal_name", "Q2")],
        &[],
    );
    let response = post_form(&app, "/update/John%20Smith", body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let (_, people) = get(&app, "/people").await;
    assert_eq!(people["John Smith"]["short"], "Johnny");
    assert_eq!(people["John Smith"]["goal_name"], "Q2");
    assert_eq!(people["John Smith"]["photo"], "john.png");
}

#[tokio::test]
async fn test_health_reports_owner_cache() {
    let crm = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let app = app_with_roster(&crm, &dir, json!({})).await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["owners_loaded"], false);
}
