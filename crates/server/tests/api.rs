mod common;

use axum::http::{Method, StatusCode, header};
use common::TestApp;
use mapgen_core::TaskState;
use serde_json::json;

fn settings() -> serde_json::Value {
    json!({
        "coordinates": "45.2850, 20.2370",
        "gameCode": "FS25",
        "size": 2048,
        "rotation": 25,
        "demSettings": { "multiplier": 1, "addFoundations": true },
        "splineSettings": { "splineDensity": 2 }
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_preview_returns_backend_payload() {
    let app = TestApp::new();
    let (status, body) = app
        .request(Method::POST, "/api/generate/preview", Some(settings()))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game_code"], "FS25");
    assert_eq!(body["dtm_code"], "srtm30");
    assert_eq!(body["coordinates"], json!([45.285, 20.237]));
    assert_eq!(body["rotation"], 25);
    assert_eq!(body["dem_settings"]["add_foundations"], true);
    assert_eq!(body["spline_settings"]["spline_density"], 2);
    assert!(body.get("output_size").is_none());
}

#[tokio::test]
async fn test_preview_rejects_invalid_settings() {
    let app = TestApp::new();
    let mut invalid = settings();
    invalid["rotation"] = json!(400);

    let (status, body) = app
        .request(Method::POST, "/api/generate/preview", Some(invalid))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_SETTINGS");
}

#[tokio::test]
async fn test_generate_and_track_task() {
    let app = TestApp::new();

    let (status, body) = app
        .request(Method::POST, "/api/generate", Some(settings()))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["task_id"], "task-1");

    let (status, tasks) = app.request(Method::GET, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().map(Vec::len), Some(1));
    assert_eq!(tasks[0]["task_id"], "task-1");
    assert_eq!(tasks[0]["status"]["state"], "queued");

    app.backend.set_status("task-1", TaskState::Completed);
    let (status, body) = app.request(Method::GET, "/api/tasks/task-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task_id"], "task-1");
    assert_eq!(body["state"], "completed");

    let (_, tasks) = app.request(Method::GET, "/api/tasks", None).await;
    assert_eq!(tasks[0]["status"]["state"], "completed");

    let (status, _) = app.request(Method::DELETE, "/api/tasks/task-1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request(Method::DELETE, "/api/tasks/task-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TASK_NOT_FOUND");
}

#[tokio::test]
async fn test_task_status_errors() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/api/tasks/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TASK_NOT_FOUND");

    let (status, body) = app.request(Method::GET, "/api/tasks/bad$id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_TASK_ID");

    app.backend.go_offline();
    let (status, body) = app
        .request(Method::POST, "/api/generate", Some(settings()))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "BACKEND_UNAVAILABLE");
}

#[tokio::test]
async fn test_template_file_lifecycle() {
    let app = TestApp::new();
    let schema = r#"[{"name": "grass"}]"#;

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/templates/file",
            Some(json!({ "path": "custom/texture.json", "content": schema })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "custom/texture.json");

    let (status, body) = app
        .request(Method::GET, "/api/templates/file?path=custom/texture.json", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], schema);

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/templates/file",
            Some(json!({ "path": "custom/texture.json", "content": "[]" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_EXISTS");

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/templates/file",
            Some(json!({ "path": "custom/texture.json", "content": "[]", "overwrite": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/templates/copy",
            Some(json!({ "from": "custom/texture.json", "to": "custom/copy.json" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/templates/rename",
            Some(json!({ "from": "custom/copy.json", "to": "custom/renamed.json" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed.json");

    let (status, body) = app
        .request(Method::GET, "/api/templates?path=custom", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|file| file["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["renamed.json", "texture.json"]);
    assert_eq!(body["parent"], "");

    let (status, body) = app
        .request(Method::DELETE, "/api/templates/file?path=custom/renamed.json", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);
    assert!(!app.templates.path().join("custom/renamed.json").exists());
}

#[tokio::test]
async fn test_template_write_validation() {
    let app = TestApp::new();

    let cases = [
        (json!({ "path": "../escape.json", "content": "[]" }), StatusCode::FORBIDDEN, "PATH_TRAVERSAL"),
        (json!({ "path": "/etc/passwd.json", "content": "[]" }), StatusCode::BAD_REQUEST, "INVALID_PATH"),
        (json!({ "path": "script.sh", "content": "echo" }), StatusCode::BAD_REQUEST, "UNSUPPORTED_EXTENSION"),
        (json!({ "path": "broken.json", "content": "{not json" }), StatusCode::UNPROCESSABLE_ENTITY, "INVALID_CONTENT"),
        (json!({ "path": "big.json", "content": "x".repeat(2000) }), StatusCode::PAYLOAD_TOO_LARGE, "TOO_LARGE"),
    ];

    for (request, expected_status, expected_code) in cases {
        let (status, body) = app
            .request(Method::PUT, "/api/templates/file", Some(request.clone()))
            .await;
        assert_eq!(status, expected_status, "request: {request}");
        assert_eq!(body["code"], expected_code, "request: {request}");
    }
}

#[tokio::test]
async fn test_template_read_errors() {
    let app = TestApp::new();
    app.write_template("schemas/tree.json", "[]");

    let (status, body) = app
        .request(Method::GET, "/api/templates/file?path=missing.json", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PATH_NOT_FOUND");

    let (status, body) = app
        .request(Method::GET, "/api/templates/file?path=schemas", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NOT_A_FILE");

    let (status, body) = app
        .request(Method::DELETE, "/api/templates/file?path=schemas", None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DIRECTORY_NOT_EMPTY");
}

#[tokio::test]
async fn test_template_directory_and_search() {
    let app = TestApp::new();
    app.write_template("fs25/texture.json", "[]");
    app.write_template("fs25/nested/tree.json", "[]");
    app.write_template("notes.yml", "a: 1");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/templates/directory",
            Some(json!({ "path": "fs22" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_dir"], true);

    let (status, body) = app
        .request(Method::GET, "/api/templates/search?pattern=*.json", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["truncated"], false);

    let (status, body) = app
        .request(
            Method::GET,
            "/api/templates/search?pattern=*.json&recursive=false&path=fs25",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["files"][0]["path"], "fs25/texture.json");
}

#[tokio::test]
async fn test_default_schema() {
    let app = TestApp::new();
    app.write_template("fs25-texture-schema.json", r#"[{"name": "asphalt"}]"#);

    let (status, body) = app
        .request(Method::GET, "/api/schemas/FS25/texture", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "name": "asphalt" }]));

    let (status, body) = app.request(Method::GET, "/api/schemas/fs25/tree", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PATH_NOT_FOUND");

    for uri in ["/api/schemas/fs19/texture", "/api/schemas/fs25/buildings"] {
        let (status, body) = app.request(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SCHEMA_NOT_FOUND");
    }
}

#[tokio::test]
async fn test_artifact_download() {
    let app = TestApp::new();
    app.write_artifact("task-1/FS25_map.zip", "zip-bytes");

    let response = app
        .send(Method::GET, "/api/artifacts/download?path=task-1/FS25_map.zip", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    assert_eq!(headers[header::CONTENT_LENGTH], "9");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"FS25_map.zip\""
    );

    let (status, bytes) = app
        .raw(Method::GET, "/api/artifacts/download?path=task-1/FS25_map.zip", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"zip-bytes");

    let (status, body) = app
        .request(Method::GET, "/api/artifacts/download?path=task-1", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NOT_A_FILE");
}

#[tokio::test]
async fn test_artifact_listing_and_delete() {
    let app = TestApp::new();
    app.write_artifact("task-1/FS25_map.zip", "zip");
    app.write_artifact("task-1/preview.png", "png");

    let (status, body) = app.request(Method::GET, "/api/artifacts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["directories"][0]["name"], "task-1");
    assert!(body["parent"].is_null());

    let (status, body) = app
        .request(Method::DELETE, "/api/artifacts?path=task-1", None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DIRECTORY_NOT_EMPTY");

    let (status, body) = app
        .request(Method::DELETE, "/api/artifacts?path=task-1&recursive=true", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "path": "task-1", "deleted": true }));
    assert!(!app.artifacts.path().join("task-1").exists());
}
