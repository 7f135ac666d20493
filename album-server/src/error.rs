use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use album_core::errors::AlbumError;

#[derive(Debug)]
pub struct ServerError(pub anyhow::Error);

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // An AlbumError anywhere in the chain keeps its structured fields.
        if let Some(album) = self.0.chain().find_map(|e| e.downcast_ref::<AlbumError>()) {
            let safe = album.sanitize_for_client();
            let status =
                StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, Json(safe.to_json())).into_response();
        }

        let album = AlbumError::general_error(self.0.to_string());
        let safe = album.sanitize_for_client();
        let status =
            StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
