//! JSON batch import/export for locally curated albums.
//!
//! Reads `categories.json`, `locations.json` and `photos.json` from an asset
//! folder and loads them into the caller's partition. A missing file means an
//! empty batch, not an error. Export writes the same shapes back out as
//! pretty-printed camelCase JSON.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use album_core::errors::AlbumError;
use album_core::TenantContext;

use crate::models::{now_rfc3339, parse_taken_on};

const ASSET_PREFIX: &str = "assets/local/";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryImport {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub description: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationImport {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub is_reuse_location: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoImport {
    pub id: String,
    pub src: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location_id: Option<String>,
    pub category_ids: Vec<String>,
    pub is_privacy_protected: bool,
    pub is_reuse_location: bool,
}

/// Per-batch row counts from a completed import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub categories: usize,
    pub locations: usize,
    pub photos: usize,
}

/// Reads a JSON list, treating a missing file as an empty batch.
async fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AlbumError::general_error(format!(
                "Failed to read {}: {e}",
                path.display()
            ))
            .into_anyhow())
        }
    };
    serde_json::from_slice(&bytes).map_err(|e| {
        AlbumError::unprocessable(format!("Invalid import file {}", path.display()))
            .with_errors(json!({ "_schema": [e.to_string()] }))
            .into_anyhow()
    })
}

async fn write_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(items)?;
    tokio::fs::write(path, bytes).await.map_err(|e| {
        AlbumError::general_error(format!("Failed to write {}: {e}", path.display())).into_anyhow()
    })
}

pub async fn read_categories(path: &Path) -> Result<Vec<CategoryImport>> {
    read_list(path).await
}

pub async fn read_locations(path: &Path) -> Result<Vec<LocationImport>> {
    read_list(path).await
}

pub async fn read_photos(path: &Path) -> Result<Vec<PhotoImport>> {
    read_list(path).await
}

pub async fn export_categories(path: &Path, items: &[CategoryImport]) -> Result<()> {
    write_list(path, items).await
}

pub async fn export_locations(path: &Path, items: &[LocationImport]) -> Result<()> {
    write_list(path, items).await
}

pub async fn export_photos(path: &Path, items: &[PhotoImport]) -> Result<()> {
    write_list(path, items).await
}

pub struct LocalDataImporter {
    pool: SqlitePool,
}

impl LocalDataImporter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Loads `categories.json`, `locations.json` and `photos.json` from `dir`
    /// into the caller's partition, in that order so photo references resolve.
    /// The whole import commits atomically.
    pub async fn import_assets(&self, ctx: &TenantContext, dir: &Path) -> Result<ImportReport> {
        let categories = read_categories(&dir.join("categories.json")).await?;
        let locations = read_locations(&dir.join("locations.json")).await?;
        let photos = read_photos(&dir.join("photos.json")).await?;

        let partition = ctx.partition.to_string();
        let caller = ctx.caller.to_string();
        let mut tx = self.pool.begin().await?;

        for c in &categories {
            let now = now_rfc3339();
            sqlx::query(
                r#"INSERT INTO categories
                    (id, category_name, description, color, icon, disabled,
                     created_at, created_by, updated_at, updated_by, tenant_id)
                   VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)"#,
            )
            .bind(parse_import_id(&c.id, "categories")?)
            .bind(opt(&c.label))
            .bind(opt(&c.description))
            .bind(opt(&c.color))
            .bind(opt(&c.icon))
            .bind(&now)
            .bind(&caller)
            .bind(&now)
            .bind(&caller)
            .bind(&partition)
            .execute(&mut *tx)
            .await?;
        }

        for l in &locations {
            let now = now_rfc3339();
            sqlx::query(
                r#"INSERT INTO locations
                    (id, location_name, description, latitude, longitude, reusable, disabled,
                     created_at, created_by, updated_at, updated_by, tenant_id)
                   VALUES (?, ?, NULL, ?, ?, ?, 0, ?, ?, ?, ?, ?)"#,
            )
            .bind(parse_import_id(&l.id, "locations")?)
            .bind(opt(&l.name))
            .bind(l.lat)
            .bind(l.lng)
            .bind(l.is_reuse_location)
            .bind(&now)
            .bind(&caller)
            .bind(&now)
            .bind(&caller)
            .bind(&partition)
            .execute(&mut *tx)
            .await?;
        }

        for p in &photos {
            let id = parse_import_id(&p.id, "photos")?;
            let location_id = match &p.location_id {
                Some(raw) => Some(parse_import_id(raw, "photos")?),
                None => None,
            };
            let filename = p.src.strip_prefix(ASSET_PREFIX).unwrap_or(&p.src);
            let now = now_rfc3339();

            sqlx::query(
                r#"INSERT INTO photos
                    (id, filename, title, description, taken_on, location_id, disabled,
                     created_at, created_by, updated_at, updated_by, tenant_id)
                   VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)"#,
            )
            .bind(&id)
            .bind(opt(filename))
            .bind(opt(&p.title))
            .bind(opt(&p.description))
            .bind(parse_import_date(&p.date))
            .bind(location_id)
            .bind(&now)
            .bind(&caller)
            .bind(&now)
            .bind(&caller)
            .bind(&partition)
            .execute(&mut *tx)
            .await?;

            for raw in &p.category_ids {
                sqlx::query("INSERT INTO category_photo (categories_id, photo_id) VALUES (?, ?)")
                    .bind(parse_import_id(raw, "photos")?)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        let report = ImportReport {
            categories: categories.len(),
            locations: locations.len(),
            photos: photos.len(),
        };
        info!(
            partition = %ctx.partition,
            categories = report.categories,
            locations = report.locations,
            photos = report.photos,
            "imported local assets"
        );
        Ok(report)
    }
}

fn opt(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_import_id(raw: &str, file: &str) -> Result<String> {
    Uuid::parse_str(raw).map(|u| u.to_string()).map_err(|_| {
        AlbumError::unprocessable(format!("Invalid id in {file}.json"))
            .with_errors(json!({ "id": [raw] }))
            .into_anyhow()
    })
}

/// Import dates may be a full timestamp or a bare date; a bare date lands at
/// midnight UTC. Unparseable values import as untimed rather than failing the
/// whole batch.
fn parse_import_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(stamp) = parse_taken_on(raw) {
        return Some(stamp);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| {
            DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use album_core::{CallerIdentity, TenantContext};

    use crate::resolver::TenantResolver;
    use crate::{connect, migrate};

    async fn test_pool(dir: &tempfile::TempDir) -> SqlitePool {
        let path = dir.path().join("import.db");
        let pool = connect(path.to_str().unwrap()).await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    async fn test_context(pool: &SqlitePool) -> TenantContext {
        let caller = CallerIdentity::new(Uuid::new_v4());
        let partition = TenantResolver::new(pool.clone())
            .resolve(&caller)
            .await
            .unwrap();
        TenantContext::new(partition, caller.id)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_files_import_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool(&dir).await;
        let ctx = test_context(&pool).await;

        let report = LocalDataImporter::new(pool.clone())
            .import_assets(&ctx, &dir.path().join("no-such-assets"))
            .await
            .unwrap();
        assert_eq!(report, ImportReport::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn import_stamps_partition_and_strips_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let pool = test_pool(&dir).await;
        let ctx = test_context(&pool).await;

        let assets = dir.path().join("assets");
        std::fs::create_dir(&assets).unwrap();
        let category_id = Uuid::new_v4();
        let location_id = Uuid::new_v4();
        let photo_id = Uuid::new_v4();
        std::fs::write(
            assets.join("categories.json"),
            serde_json::to_vec(&json!([
                { "id": category_id, "label": "Holidays", "color": "#ff0000" }
            ]))
            .unwrap(),
        )
        .unwrap();
        std::fs::write(
            assets.join("locations.json"),
            serde_json::to_vec(&json!([
                { "id": location_id, "name": "Lisbon", "lat": 38.72, "lng": -9.14,
                  "isReuseLocation": true }
            ]))
            .unwrap(),
        )
        .unwrap();
        std::fs::write(
            assets.join("photos.json"),
            serde_json::to_vec(&json!([
                { "id": photo_id, "src": "assets/local/beach.jpg", "title": "Beach",
                  "date": "2024-07-14", "locationId": location_id,
                  "categoryIds": [category_id] }
            ]))
            .unwrap(),
        )
        .unwrap();

        let report = LocalDataImporter::new(pool.clone())
            .import_assets(&ctx, &assets)
            .await
            .unwrap();
        assert_eq!(
            report,
            ImportReport {
                categories: 1,
                locations: 1,
                photos: 1
            }
        );

        let (filename, taken_on, tenant_id): (String, String, String) = sqlx::query_as(
            "SELECT filename, taken_on, tenant_id FROM photos WHERE id = ?",
        )
        .bind(photo_id.to_string())
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(filename, "beach.jpg");
        assert_eq!(taken_on, "2024-07-14T00:00:00.000Z");
        assert_eq!(tenant_id, ctx.partition.to_string());

        let (linked,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM category_photo WHERE photo_id = ?")
                .bind(photo_id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(linked, 1);
    }

    #[test]
    fn bare_dates_land_at_midnight_utc() {
        assert_eq!(
            parse_import_date("2024-07-14").as_deref(),
            Some("2024-07-14T00:00:00.000Z")
        );
        assert_eq!(parse_import_date("").as_deref(), None);
        assert_eq!(parse_import_date("not a date"), None);
    }
}
