use std::sync::Arc;

use ac24dia_server::config::Settings;
use ac24dia_server::store::{demo, MemoryStore};
use ac24dia_server::{app, AppState};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

const KEY: &str = "anon-public-key";

async fn setup() -> Router {
    let store = Arc::new(MemoryStore::new());
    demo::seed_if_empty(store.as_ref()).await.unwrap();
    app(AppState::new(store, Settings::in_memory(KEY)))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    call_raw(app, method, uri, token, body.map(|body| body.to_string())).await
}

async fn call_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("apikey", KEY);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn requests_without_api_key_are_rejected() {
    let app = setup().await;
    let request = Request::builder()
        .method(Method::GET)
        .uri("/subjects")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "MissingCredentials");
}

#[tokio::test]
async fn login_returns_session_and_user() {
    let app = setup().await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": "student1", "password": "password" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["sessionId"].as_str().unwrap().len(), 64);
    assert_eq!(body["user"]["username"], "student1");
    assert_eq!(body["user"]["role"], "STUDENT");
    assert!(body["user"].get("password").is_none());

    let token = body["sessionId"].as_str().unwrap();
    let (status, me) = call(&app, Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["authResult"], "Success");
    assert_eq!(me["user"]["seatIndex"], 1);
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = setup().await;
    let admin = login(&app, "admin", "admin").await;
    let (status, _) = call(
        &app,
        Method::PUT,
        "/admin/users/student2/status",
        Some(&admin),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for (username, password) in [
        ("student1", "wrong"),
        ("nobody", "password"),
        ("student2", "password"),
    ] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "AuthenticationFailure");
        assert_eq!(body["message"], "Invalid credentials or inactive account");
    }
}

#[tokio::test]
async fn google_login_registers_once() {
    let app = setup().await;
    let identity = json!({
        "email": "student_google@gmail.com",
        "name": "Google Student User",
        "googleId": "123456789"
    });

    let (status, first) = call(&app, Method::POST, "/auth/google", None, Some(identity.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["id"], "google-123456789");
    assert_eq!(first["user"]["username"], "student_google@gmail.com");
    assert_eq!(first["user"]["role"], "STUDENT");

    let (status, second) = call(&app, Method::POST, "/auth/google", None, Some(identity.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["sessionId"], second["sessionId"]);

    let admin = login(&app, "admin", "admin").await;
    let (_, list) = call(&app, Method::GET, "/admin/users?search=google", Some(&admin), None).await;
    assert_eq!(list["users"].as_array().unwrap().len(), 1);

    let (status, _) = call(
        &app,
        Method::PUT,
        "/admin/users/google-123456789/status",
        Some(&admin),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/auth/google", None, Some(identity)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AuthenticationFailure");
    assert_eq!(body["message"], "Invalid credentials or inactive account");
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = setup().await;
    let token = login(&app, "student1", "password").await;

    let (status, body) = call(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dropSuccess"], true);

    let (status, body) = call(&app, Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "InvalidSession");
}

#[tokio::test]
async fn students_browse_but_cannot_manage_videos() {
    let app = setup().await;
    let staff = login(&app, "kurikulum", "kurikulum").await;
    let student = login(&app, "student1", "password").await;

    let (status, added) = call(
        &app,
        Method::POST,
        "/videos",
        Some(&staff),
        Some(json!({
            "title": "Limit Fungsi",
            "url": "https://www.youtube.com/watch?v=XYZ",
            "subject": "Matematika",
            "week": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(added["url"], "https://www.youtube.com/embed/XYZ");
    assert_eq!(added["uploadedBy"], "KURIKULUM");

    let (status, body) = call(
        &app,
        Method::POST,
        "/videos",
        Some(&student),
        Some(json!({
            "title": "Mine",
            "url": "https://youtu.be/abc",
            "subject": "Fisika",
            "week": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, list) = call(&app, Method::GET, "/videos", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["subject"], "ALL");
    assert_eq!(list["canManage"], false);
    assert_eq!(list["videos"].as_array().unwrap().len(), 1);

    let id = added["id"].as_str().unwrap();
    let (status, _) = call(&app, Method::DELETE, &format!("/videos/{}", id), Some(&student), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn videos_filter_by_subject_and_can_be_deleted() {
    let app = setup().await;
    let it = login(&app, "it_logistik", "it_logistik").await;

    for (title, subject) in [("A", "Matematika"), ("B", "Fisika"), ("C", "Matematika")] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/videos",
            Some(&it),
            Some(json!({
                "title": title,
                "url": "https://youtu.be/abc",
                "subject": subject,
                "week": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, list) = call(&app, Method::GET, "/videos?subject=Matematika", Some(&it), None).await;
    assert_eq!(list["canManage"], true);
    let videos = list["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 2);
    assert!(videos.iter().all(|v| v["subject"] == "Matematika"));
    assert!(videos.iter().all(|v| v["url"] == "https://www.youtube.com/embed/abc"));

    let (_, all) = call(&app, Method::GET, "/videos?subject=ALL", Some(&it), None).await;
    assert_eq!(all["videos"].as_array().unwrap().len(), 3);

    let id = videos[0]["id"].as_str().unwrap().to_string();
    let (status, deleted) = call(&app, Method::DELETE, &format!("/videos/{}", id), Some(&it), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"], true);

    let (status, body) = call(&app, Method::DELETE, &format!("/videos/{}", id), Some(&it), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");

    let admin = login(&app, "admin", "admin").await;
    let (_, logs) = call(&app, Method::GET, "/admin/logs", Some(&admin), None).await;
    let actions: Vec<_> = logs["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap().to_string())
        .collect();
    assert!(actions.contains(&"Seksi IT & Logistik added video \"A\"".to_string()));
    assert!(actions.contains(&"Seksi IT & Logistik added video \"C\"".to_string()));
    assert!(actions.contains(&format!("Seksi IT & Logistik deleted video {}", id)));
    assert_eq!(
        actions.iter().filter(|a| a.contains("deleted video")).count(),
        1
    );
}

#[tokio::test]
async fn malformed_requests_get_the_json_error_body() {
    let app = setup().await;
    let admin = login(&app, "admin", "admin").await;

    let (status, body) = call(
        &app,
        Method::PUT,
        "/admin/users/student1/role",
        Some(&admin),
        Some(json!({ "role": "TEACHER" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidPayload");

    let (status, body) = call(
        &app,
        Method::POST,
        "/videos",
        Some(&admin),
        Some(json!({ "title": "T", "url": "u", "subject": "Fisika", "week": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidPayload");

    let (status, body) = call_raw(&app, Method::POST, "/auth/login", None, Some("{".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidPayload");

    let (_, users) = call(&app, Method::GET, "/admin/users?search=student1", Some(&admin), None).await;
    assert_eq!(users["users"][0]["role"], "STUDENT");
}

#[tokio::test]
async fn invalid_videos_are_rejected() {
    let app = setup().await;
    let admin = login(&app, "admin", "admin").await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/videos",
        Some(&admin),
        Some(json!({ "title": "Zero", "url": "x", "subject": "Fisika", "week": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidPayload");
}

#[tokio::test]
async fn admin_changes_roles_but_not_of_admins() {
    let app = setup().await;
    let admin = login(&app, "admin", "admin").await;

    let (status, body) = call(
        &app,
        Method::PUT,
        "/admin/users/student1/role",
        Some(&admin),
        Some(json!({ "role": "IT_LOGISTIK" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "IT_LOGISTIK");

    let promoted = login(&app, "student1", "password").await;
    let (_, list) = call(&app, Method::GET, "/videos", Some(&promoted), None).await;
    assert_eq!(list["canManage"], true);

    let (status, body) = call(
        &app,
        Method::PUT,
        "/admin/users/admin/role",
        Some(&admin),
        Some(json!({ "role": "STUDENT" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _) = call(
        &app,
        Method::PUT,
        "/admin/users/admin/status",
        Some(&admin),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        Method::PUT,
        "/admin/users/ghost/role",
        Some(&admin),
        Some(json!({ "role": "KURIKULUM" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "UserDoesNotExist");
}

#[tokio::test]
async fn suspension_ends_live_sessions_and_is_logged() {
    let app = setup().await;
    let admin = login(&app, "admin", "admin").await;
    let student = login(&app, "student3", "password").await;

    let (status, body) = call(
        &app,
        Method::PUT,
        "/admin/users/student3/status",
        Some(&admin),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isActive"], false);

    let (status, _) = call(&app, Method::GET, "/videos", Some(&student), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, logs) = call(&app, Method::GET, "/admin/logs", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs["logs"].as_array().unwrap();
    assert_eq!(logs[0]["action"], "Suspended student3");
    assert_eq!(logs[0]["userId"], "admin");
    assert_eq!(logs.len(), 3);
}

#[tokio::test]
async fn admin_panel_is_admin_only() {
    let app = setup().await;
    let staff = login(&app, "kurikulum", "kurikulum").await;
    for uri in ["/admin/users", "/admin/logs", "/admin/deployment"] {
        let (status, body) = call(&app, Method::GET, uri, Some(&staff), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["error"], "Forbidden");
    }

    let (status, _) = call(&app, Method::GET, "/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_search_and_deployment_guide() {
    let app = setup().await;
    let admin = login(&app, "admin", "admin").await;

    let (_, all) = call(&app, Method::GET, "/admin/users", Some(&admin), None).await;
    assert_eq!(all["users"].as_array().unwrap().len(), 8);
    assert_eq!(all["roles"], json!(["ADMIN", "KURIKULUM", "IT_LOGISTIK", "STUDENT"]));

    let (_, found) = call(&app, Method::GET, "/admin/users?search=StUdEnT%204", Some(&admin), None).await;
    let users = found["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "student4");

    let (status, guide) = call(&app, Method::GET, "/admin/deployment", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(guide["tables"].as_array().unwrap().len(), 9);
    assert_eq!(guide["environment"], json!(["SUPABASE_URL", "SUPABASE_KEY"]));
    assert!(guide["sql"]
        .as_str()
        .unwrap()
        .contains("create table if not exists activity_logs"));
}

#[tokio::test]
async fn subjects_are_listed_for_signed_in_users() {
    let app = setup().await;
    let student = login(&app, "student5", "password").await;
    let (status, body) = call(&app, Method::GET, "/subjects", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["subjects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Matematika", "Fisika", "Bahasa Indonesia"]);
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let app = setup().await;
    let (status, body) = call(&app, Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}
