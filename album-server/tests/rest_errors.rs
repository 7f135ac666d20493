use axum::body::Body;
use axum::http::{HeaderValue, Request};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use album_core::{AlbumApp, AlbumParams};
use album_server::AxumApp;

async fn test_app(dir: &tempfile::TempDir) -> AxumApp {
    let app: AlbumApp<Value, AlbumParams> = AlbumApp::new();
    let db = dir.path().join("photobook.db");
    app.set("database.url", db.to_str().unwrap());
    album_server::build_with(app).await.unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn as_user(req: axum::http::request::Builder, user: &Uuid) -> axum::http::request::Builder {
    req.header("x-user-id", user.to_string())
}

#[tokio::test]
async fn anonymous_requests_are_401() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;

    let res = ax
        .router()
        .oneshot(
            Request::builder()
                .uri("/categories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 401);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotAuthenticated");
    assert_eq!(body["code"], 401);
    assert_eq!(body["className"], "not-authenticated");
}

#[tokio::test]
async fn malformed_json_returns_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;
    let user = Uuid::new_v4();

    let res = ax
        .router()
        .oneshot(
            as_user(Request::builder().method("POST").uri("/categories"), &user)
                .header("content-type", "application/json")
                .body(Body::from("{\"categoryName\":\"x\""))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert!(res.headers().get("x-request-id").is_some());
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["code"], 400);
    assert_eq!(body["className"], "bad-request");
    assert!(body.get("errors").is_some());
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;
    let user = Uuid::new_v4();

    let provided = HeaderValue::from_static("req-test-123");
    let res = ax
        .router()
        .oneshot(
            as_user(Request::builder().uri("/categories"), &user)
                .header("x-request-id", provided.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn cross_partition_get_reads_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();

    let res = ax
        .router()
        .oneshot(
            as_user(Request::builder().method("POST").uri("/categories"), &owner)
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"categoryName": "Family"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let created = json_body(res).await;
    let id = created["id"].as_str().unwrap();

    let res = ax
        .router()
        .oneshot(
            as_user(
                Request::builder().uri(format!("/categories/{id}")),
                &intruder,
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 404);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotFound");
    assert_eq!(body["className"], "not-found");
}

#[tokio::test]
async fn cross_partition_reference_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    let res = ax
        .router()
        .oneshot(
            as_user(Request::builder().method("POST").uri("/locations"), &other)
                .header("content-type", "application/json")
                .body(Body::from(json!({"locationName": "Elsewhere"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let foreign = json_body(res).await;

    let res = ax
        .router()
        .oneshot(
            as_user(Request::builder().method("POST").uri("/photos"), &owner)
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "filename": "sneaky.jpg",
                        "locationId": foreign["id"],
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 422);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Unprocessable");
    assert_eq!(body["className"], "unprocessable");
    assert!(body["errors"].get("locationId").is_some());
}
