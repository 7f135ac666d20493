//! HTTP surface of the PhotoBook backend.
//!
//! Wires the entity stores into an [`album_core::AlbumApp`], mounts the
//! generic CRUD routers plus the photo image endpoint, and handles
//! per-request authentication and partition resolution.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use album_core::{AlbumApp, AlbumParams};
use album_store::{CategoryStore, LocationStore, PersonStore, PhotoStore, TenantResolver};

mod app;
mod auth;
mod error;
mod images;
mod rest;
mod state;

pub use app::AxumApp;
pub use auth::{extract_bearer_token, AuthSettings};
pub use error::ServerError;
pub use state::ServerState;

/// Build the application from defaults plus `ALBUM__…` environment overrides.
pub async fn build() -> Result<AxumApp> {
    let app: AlbumApp<Value, AlbumParams> = AlbumApp::new();
    app.set("http.host", "127.0.0.1");
    app.set("http.port", "3030");
    app.set("database.url", "photobook.db");
    app.load_env_config("ALBUM__");
    build_with(app).await
}

/// Build the application from an already-configured container. Connects to
/// `database.url`, runs the migrations and mounts every service.
pub async fn build_with(app: AlbumApp<Value, AlbumParams>) -> Result<AxumApp> {
    let database = app
        .get("database.url")
        .unwrap_or_else(|| "photobook.db".to_string());
    let pool = album_store::connect(&database).await?;
    album_store::migrate(&pool).await?;

    let resolver = TenantResolver::new(pool.clone());
    let auth = AuthSettings::new(app.get("auth.secret"));
    let state = ServerState::new(app, resolver, auth);

    let images = images::image_router(state.clone());
    let ax = AxumApp::new(state)
        .use_service("/categories", Arc::new(CategoryStore::new(pool.clone())))
        .use_service("/locations", Arc::new(LocationStore::new(pool.clone())))
        .use_service("/persons", Arc::new(PersonStore::new(pool.clone())))
        .use_service("/photos", Arc::new(PhotoStore::new(pool)))
        .use_router("/photos", images);

    Ok(ax)
}
