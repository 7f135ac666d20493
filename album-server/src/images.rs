//! Photo image delivery.
//!
//! `GET /photos/{id}/image` streams the stored file for a photo. The photo is
//! looked up through the photos service, so the partition scoping applies: a
//! photo in another photobook reads as not-found, exactly like a missing one.

use std::path::{Component, Path as FsPath, PathBuf};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing, Router,
};

use album_core::errors::AlbumError;
use album_core::{bail_album, AlbumParams};

use crate::{ServerError, ServerState};

pub fn image_router(state: ServerState) -> Router<()> {
    Router::new()
        .route("/{id}/image", routing::get(get_image))
        .with_state(state)
}

async fn get_image(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let tenant = state.tenant_context(&headers).await?;

    let photo = state
        .app
        .service("photos")?
        .get(tenant, &id, AlbumParams::default())
        .await?;
    let filename = photo["filename"]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AlbumError::not_found("Photo image not found").into_anyhow())?;

    // The filename column is caller-supplied. Anything that is not a plain
    // file name (absolute, `..`, nested) must never escape the images folder.
    if !is_plain_filename(filename) {
        bail_album!(not_found, "Photo image not found");
    }

    let Some(folder) = state.app.get("images.folder") else {
        bail_album!(not_found, "Photo image not found");
    };
    let path: PathBuf = FsPath::new(&folder).join(filename);

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AlbumError::not_found("Photo image not found").into_anyhow())?;

    Ok((
        [(header::CONTENT_TYPE, content_type(filename))],
        bytes,
    )
        .into_response())
}

fn is_plain_filename(filename: &str) -> bool {
    let mut parts = FsPath::new(filename).components();
    matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None))
}

fn content_type(filename: &str) -> &'static str {
    let ext = FsPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::{content_type, is_plain_filename};

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type("beach.JPG"), "image/jpeg");
        assert_eq!(content_type("beach.png"), "image/png");
        assert_eq!(content_type("beach"), "application/octet-stream");
    }

    #[test]
    fn only_plain_filenames_are_served() {
        assert!(is_plain_filename("beach.jpg"));
        assert!(!is_plain_filename("../secret.txt"));
        assert!(!is_plain_filename("/etc/passwd"));
        assert!(!is_plain_filename("nested/beach.jpg"));
        assert!(!is_plain_filename(".."));
    }
}
