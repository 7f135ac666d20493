use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use album_core::{AlbumParams, AlbumService, TenantContext};

use crate::models::{now_rfc3339, LocationRow, LocationSummary, LocationViewModel, LocationWrite};

use super::{invalid_payload, merge_patch, not_found, storage_error, to_value};

pub struct LocationStore {
    pool: SqlitePool,
}

impl LocationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, ctx: &TenantContext, id: &str) -> Result<LocationRow> {
        sqlx::query_as::<_, LocationRow>("SELECT * FROM locations WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(ctx.partition.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| not_found("Location"))
    }

    async fn view_model(&self, ctx: &TenantContext, id: &str) -> Result<Value> {
        let row = self.fetch(ctx, id).await?;
        to_value(LocationViewModel::from(&row))
    }
}

#[async_trait]
impl AlbumService<Value, AlbumParams> for LocationStore {
    async fn find(&self, ctx: &TenantContext, params: AlbumParams) -> Result<Vec<Value>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM locations WHERE disabled = 0 AND tenant_id = ");
        query.push_bind(ctx.partition.to_string());

        if let Some(search) = params.search_text() {
            let pattern = format!("%{search}%");
            query.push(" AND (LOWER(location_name) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(description) LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        query.push(" ORDER BY location_name");

        let rows: Vec<LocationRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.iter()
            .map(|row| to_value(LocationSummary::from(row)))
            .collect()
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: AlbumParams) -> Result<Value> {
        self.view_model(ctx, id).await
    }

    async fn create(&self, ctx: &TenantContext, data: Value, _params: AlbumParams) -> Result<Value> {
        let write: LocationWrite =
            serde_json::from_value(data).map_err(|e| invalid_payload("Location", e))?;

        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        sqlx::query(
            r#"INSERT INTO locations
                (id, location_name, description, latitude, longitude, reusable, disabled,
                 created_at, created_by, updated_at, updated_by, tenant_id)
               VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&write.location_name)
        .bind(&write.description)
        .bind(write.latitude)
        .bind(write.longitude)
        .bind(write.reusable)
        .bind(&now)
        .bind(ctx.caller.to_string())
        .bind(&now)
        .bind(ctx.caller.to_string())
        .bind(ctx.partition.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        self.view_model(ctx, &id).await
    }

    async fn update(
        &self,
        ctx: &TenantContext,
        id: &str,
        data: Value,
        _params: AlbumParams,
    ) -> Result<Value> {
        let write: LocationWrite =
            serde_json::from_value(data).map_err(|e| invalid_payload("Location", e))?;

        let updated = sqlx::query(
            r#"UPDATE locations
               SET location_name = ?, description = ?, latitude = ?, longitude = ?,
                   reusable = ?, updated_at = ?, updated_by = ?
               WHERE id = ? AND tenant_id = ?"#,
        )
        .bind(&write.location_name)
        .bind(&write.description)
        .bind(write.latitude)
        .bind(write.longitude)
        .bind(write.reusable)
        .bind(now_rfc3339())
        .bind(ctx.caller.to_string())
        .bind(id)
        .bind(ctx.partition.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if updated.rows_affected() == 0 {
            return Err(not_found("Location"));
        }
        self.view_model(ctx, id).await
    }

    async fn patch(
        &self,
        ctx: &TenantContext,
        id: Option<&str>,
        data: Value,
        params: AlbumParams,
    ) -> Result<Value> {
        let id = id.ok_or_else(|| not_found("Location"))?;
        let current = self.view_model(ctx, id).await?;
        let merged = merge_patch(current, &data);
        self.update(ctx, id, merged, params).await
    }

    async fn remove(
        &self,
        ctx: &TenantContext,
        id: Option<&str>,
        _params: AlbumParams,
    ) -> Result<Value> {
        let id = id.ok_or_else(|| not_found("Location"))?;
        let removed = self.view_model(ctx, id).await?;

        sqlx::query(
            r#"UPDATE locations SET disabled = 1, updated_at = ?, updated_by = ?
               WHERE id = ? AND tenant_id = ?"#,
        )
        .bind(now_rfc3339())
        .bind(ctx.caller.to_string())
        .bind(id)
        .bind(ctx.partition.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(removed)
    }
}
