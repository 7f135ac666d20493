use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use album_core::{AlbumApp, AlbumParams};
use album_server::AxumApp;

async fn test_app(dir: &tempfile::TempDir) -> AxumApp {
    let app: AlbumApp<Value, AlbumParams> = AlbumApp::new();
    let db = dir.path().join("photobook.db");
    app.set("database.url", db.to_str().unwrap());
    app.set("auth.secret", "test-secret");
    app.set("images.folder", dir.path().join("images").to_str().unwrap());
    album_server::build_with(app).await.unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(ax: &AxumApp, user: &Uuid, method: &str, uri: &str, body: Option<Value>) -> (u16, Value) {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user.to_string());
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = ax
        .router()
        .oneshot(req.body(body).unwrap())
        .await
        .unwrap();
    let status = res.status().as_u16();
    (status, json_body(res).await)
}

#[tokio::test]
async fn category_crud_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;
    let user = Uuid::new_v4();

    let (status, created) = send(
        &ax,
        &user,
        "POST",
        "/categories",
        Some(json!({"categoryName": "Holidays", "color": "#ff0000"})),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(created["categoryName"], "Holidays");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, listed) = send(&ax, &user, "GET", "/categories", None).await;
    assert_eq!(status, 200);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["categoryName"], "Holidays");

    let (status, updated) = send(
        &ax,
        &user,
        "PUT",
        &format!("/categories/{id}"),
        Some(json!({"categoryName": "Trips", "color": "#00ff00"})),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(updated["categoryName"], "Trips");

    let (status, patched) = send(
        &ax,
        &user,
        "PATCH",
        &format!("/categories/{id}"),
        Some(json!({"icon": "plane"})),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(patched["categoryName"], "Trips");
    assert_eq!(patched["icon"], "plane");

    let (status, _) = send(&ax, &user, "DELETE", &format!("/categories/{id}"), None).await;
    assert_eq!(status, 200);

    let (_, listed) = send(&ax, &user, "GET", "/categories", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn find_is_scoped_per_tenant() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    send(
        &ax,
        &alice,
        "POST",
        "/persons",
        Some(json!({"personName": "Grandma"})),
    )
    .await;

    let (_, bobs) = send(&ax, &bob, "GET", "/persons", None).await;
    assert!(bobs.as_array().unwrap().is_empty());

    let (_, alices) = send(&ax, &alice, "GET", "/persons", None).await;
    assert_eq!(alices.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn photo_search_filters_apply() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;
    let user = Uuid::new_v4();

    send(
        &ax,
        &user,
        "POST",
        "/photos",
        Some(json!({"filename": "a.jpg", "title": "Sunset at the beach",
                    "takenOn": "2024-07-01T18:00:00Z"})),
    )
    .await;
    send(
        &ax,
        &user,
        "POST",
        "/photos",
        Some(json!({"filename": "b.jpg", "title": "Mountain hike",
                    "takenOn": "2024-08-01T09:00:00Z"})),
    )
    .await;

    let (_, all) = send(&ax, &user, "GET", "/photos", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    // Most recent first.
    assert_eq!(all[0]["filename"], "b.jpg");

    let (_, hits) = send(&ax, &user, "GET", "/photos?searchText=beach", None).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["filename"], "a.jpg");

    let (_, ranged) = send(
        &ax,
        &user,
        "GET",
        "/photos?dateFrom=2024-07-15T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(ranged.as_array().unwrap().len(), 1);
    assert_eq!(ranged[0]["filename"], "b.jpg");
}

#[tokio::test]
async fn image_endpoint_streams_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;
    let user = Uuid::new_v4();

    let images = dir.path().join("images");
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(images.join("beach.jpg"), b"not really a jpeg").unwrap();

    let (_, created) = send(
        &ax,
        &user,
        "POST",
        "/photos",
        Some(json!({"filename": "beach.jpg", "title": "Beach"})),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let res = ax
        .router()
        .oneshot(
            Request::builder()
                .uri(format!("/photos/{id}/image"))
                .header("x-user-id", user.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["content-type"], "image/jpeg");
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"not really a jpeg");

    // Another caller's partition never resolves the photo.
    let res = ax
        .router()
        .oneshot(
            Request::builder()
                .uri(format!("/photos/{id}/image"))
                .header("x-user-id", Uuid::new_v4().to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn image_endpoint_never_leaves_the_images_folder() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;
    let user = Uuid::new_v4();

    let images = dir.path().join("images");
    std::fs::create_dir_all(&images).unwrap();
    // Sits next to the images folder, not inside it.
    std::fs::write(dir.path().join("secret.txt"), b"top secret").unwrap();

    for filename in ["../secret.txt", "/etc/hostname", "a/../../secret.txt"] {
        let (_, created) = send(
            &ax,
            &user,
            "POST",
            "/photos",
            Some(json!({"filename": filename, "title": "Sneaky"})),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let res = ax
            .router()
            .oneshot(
                Request::builder()
                    .uri(format!("/photos/{id}/image"))
                    .header("x-user-id", user.to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 404, "served {filename}");
    }
}

#[tokio::test]
async fn bearer_token_authenticates_and_titles_the_photobook() {
    let dir = tempfile::tempdir().unwrap();
    let ax = test_app(&dir).await;
    let user = Uuid::new_v4();

    let exp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 3600;
    let token = encode(
        &Header::default(),
        &json!({"sub": user.to_string(), "name": "Ana", "exp": exp}),
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap();

    let res = ax
        .router()
        .oneshot(
            Request::builder()
                .uri("/photos")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let res = ax
        .router()
        .oneshot(
            Request::builder()
                .uri("/photos")
                .header("authorization", "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);
}
