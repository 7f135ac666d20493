//! Row-scoped entity stores.
//!
//! Each store implements [`AlbumService`] over `serde_json::Value` records.
//! The scoping contract is uniform: reads filter by the context's partition,
//! writes stamp it, and a direct-by-id hit on another partition's row is
//! answered exactly like a missing row.

mod categories;
mod locations;
mod persons;
mod photos;

pub use categories::CategoryStore;
pub use locations::LocationStore;
pub use persons::PersonStore;
pub use photos::PhotoStore;

use album_core::errors::AlbumError;

pub(crate) fn not_found(entity: &str) -> anyhow::Error {
    AlbumError::not_found(format!("{entity} not found")).into_anyhow()
}

pub(crate) fn invalid_payload(service: &str, err: serde_json::Error) -> anyhow::Error {
    AlbumError::unprocessable(format!("{service} payload is invalid"))
        .with_errors(serde_json::json!({ "_schema": [err.to_string()] }))
        .into_anyhow()
}

pub(crate) fn storage_error(err: sqlx::Error) -> anyhow::Error {
    AlbumError::unavailable("Photobook storage unavailable")
        .with_source(err.into())
        .into_anyhow()
}

pub(crate) fn to_value<T: serde::Serialize>(value: T) -> anyhow::Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| {
        AlbumError::general_error(format!("Failed to serialize record: {e}")).into_anyhow()
    })
}

/// Overlay the keys present in `patch` onto `base`. Both must be JSON
/// objects; a null value clears the field.
pub(crate) fn merge_patch(base: serde_json::Value, patch: &serde_json::Value) -> serde_json::Value {
    let mut merged = base;
    if let (Some(target), Some(source)) = (merged.as_object_mut(), patch.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    merged
}
