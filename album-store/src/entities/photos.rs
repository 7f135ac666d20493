use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use album_core::errors::AlbumError;
use album_core::{AlbumParams, AlbumService, TenantContext};

use crate::models::{
    now_rfc3339, parse_taken_on, CategoryRow, CategorySummary, LocationRow, LocationSummary,
    PersonRow, PersonSummary, PhotoRow, PhotoSummary, PhotoViewModel, PhotoWrite,
};

use super::{invalid_payload, merge_patch, not_found, storage_error, to_value};

pub struct PhotoStore {
    pool: SqlitePool,
}

impl PhotoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, ctx: &TenantContext, id: &str) -> Result<PhotoRow> {
        sqlx::query_as::<_, PhotoRow>("SELECT * FROM photos WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(ctx.partition.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| not_found("Photo"))
    }

    /// Full detail shape: the photo row plus its location summary and
    /// person/category summary lists, all resolved inside the partition.
    async fn view_model(&self, ctx: &TenantContext, id: &str) -> Result<Value> {
        let row = self.fetch(ctx, id).await?;
        let partition = ctx.partition.to_string();

        let location = match &row.location_id {
            Some(location_id) => sqlx::query_as::<_, LocationRow>(
                "SELECT * FROM locations WHERE id = ? AND tenant_id = ?",
            )
            .bind(location_id)
            .bind(&partition)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .map(|l| LocationSummary::from(&l)),
            None => None,
        };

        let persons: Vec<PersonRow> = sqlx::query_as(
            r#"SELECT p.* FROM persons p
               JOIN person_photo pp ON pp.persons_id = p.id
               WHERE pp.photo_id = ? AND p.tenant_id = ?
               ORDER BY p.person_name"#,
        )
        .bind(&row.id)
        .bind(&partition)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let categories: Vec<CategoryRow> = sqlx::query_as(
            r#"SELECT c.* FROM categories c
               JOIN category_photo cp ON cp.categories_id = c.id
               WHERE cp.photo_id = ? AND c.tenant_id = ?
               ORDER BY c.category_name"#,
        )
        .bind(&row.id)
        .bind(&partition)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        to_value(PhotoViewModel {
            id: row.id.clone(),
            filename: row.filename.clone(),
            title: row.title.clone(),
            description: row.description.clone(),
            taken_on: row.taken_on.clone(),
            location_id: row.location_id.clone(),
            disabled: row.disabled,
            created_at: row.created_at.clone(),
            updated_at: row.updated_at.clone(),
            location,
            persons: persons.iter().map(PersonSummary::from).collect(),
            categories: categories.iter().map(CategorySummary::from).collect(),
        })
    }

    /// The photo in its write shape (`personIds`/`categoryIds` instead of
    /// embedded summaries), used as the merge base for patch.
    async fn write_shape(&self, ctx: &TenantContext, id: &str) -> Result<Value> {
        let row = self.fetch(ctx, id).await?;

        let person_ids: Vec<(String,)> =
            sqlx::query_as("SELECT persons_id FROM person_photo WHERE photo_id = ?")
                .bind(&row.id)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;

        let category_ids: Vec<(String,)> =
            sqlx::query_as("SELECT categories_id FROM category_photo WHERE photo_id = ?")
                .bind(&row.id)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(json!({
            "filename": row.filename,
            "title": row.title,
            "description": row.description,
            "takenOn": row.taken_on,
            "locationId": row.location_id,
            "personIds": person_ids.into_iter().map(|(id,)| id).collect::<Vec<_>>(),
            "categoryIds": category_ids.into_iter().map(|(id,)| id).collect::<Vec<_>>(),
        }))
    }

    fn parse_write(&self, data: Value) -> Result<PhotoWrite> {
        let mut write: PhotoWrite =
            serde_json::from_value(data).map_err(|e| invalid_payload("Photo", e))?;

        if let Some(taken_on) = &write.taken_on {
            match parse_taken_on(taken_on) {
                Some(normalized) => write.taken_on = Some(normalized),
                None => {
                    return Err(AlbumError::unprocessable("Photo payload is invalid")
                        .with_errors(json!({"takenOn": ["must be an RFC 3339 timestamp"]}))
                        .into_anyhow())
                }
            }
        }
        Ok(write)
    }

    /// Reject any referenced id that does not resolve inside the caller's
    /// partition. Runs inside the write transaction, so a rejected write
    /// leaves nothing behind.
    async fn validate_references(
        &self,
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        ctx: &TenantContext,
        write: &PhotoWrite,
    ) -> Result<()> {
        let partition = ctx.partition.to_string();

        if let Some(location_id) = &write.location_id {
            let found: Option<(String,)> =
                sqlx::query_as("SELECT id FROM locations WHERE id = ? AND tenant_id = ?")
                    .bind(location_id.to_string())
                    .bind(&partition)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(storage_error)?;
            if found.is_none() {
                return Err(cross_reference("locationId"));
            }
        }

        for person_id in &write.person_ids {
            let found: Option<(String,)> =
                sqlx::query_as("SELECT id FROM persons WHERE id = ? AND tenant_id = ?")
                    .bind(person_id.to_string())
                    .bind(&partition)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(storage_error)?;
            if found.is_none() {
                return Err(cross_reference("personIds"));
            }
        }

        for category_id in &write.category_ids {
            let found: Option<(String,)> =
                sqlx::query_as("SELECT id FROM categories WHERE id = ? AND tenant_id = ?")
                    .bind(category_id.to_string())
                    .bind(&partition)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(storage_error)?;
            if found.is_none() {
                return Err(cross_reference("categoryIds"));
            }
        }

        Ok(())
    }

    async fn replace_associations(
        &self,
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        photo_id: &str,
        write: &PhotoWrite,
    ) -> Result<()> {
        sqlx::query("DELETE FROM person_photo WHERE photo_id = ?")
            .bind(photo_id)
            .execute(&mut **tx)
            .await
            .map_err(storage_error)?;
        sqlx::query("DELETE FROM category_photo WHERE photo_id = ?")
            .bind(photo_id)
            .execute(&mut **tx)
            .await
            .map_err(storage_error)?;

        for person_id in &write.person_ids {
            sqlx::query("INSERT INTO person_photo (persons_id, photo_id) VALUES (?, ?)")
                .bind(person_id.to_string())
                .bind(photo_id)
                .execute(&mut **tx)
                .await
                .map_err(storage_error)?;
        }
        for category_id in &write.category_ids {
            sqlx::query("INSERT INTO category_photo (categories_id, photo_id) VALUES (?, ?)")
                .bind(category_id.to_string())
                .bind(photo_id)
                .execute(&mut **tx)
                .await
                .map_err(storage_error)?;
        }

        Ok(())
    }
}

fn cross_reference(field: &str) -> anyhow::Error {
    AlbumError::unprocessable("Photo references rows outside this photobook")
        .with_errors(json!({ field: ["not found in this photobook"] }))
        .into_anyhow()
}

#[async_trait]
impl AlbumService<Value, AlbumParams> for PhotoStore {
    async fn find(&self, ctx: &TenantContext, params: AlbumParams) -> Result<Vec<Value>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM photos WHERE disabled = 0 AND tenant_id = ");
        query.push_bind(ctx.partition.to_string());

        if let Some(search) = params.search_text() {
            let pattern = format!("%{search}%");
            query.push(" AND (LOWER(title) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(description) LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        if let Some(location_id) = params.uuid_param("locationId") {
            query.push(" AND location_id = ");
            query.push_bind(location_id.to_string());
        }
        if let Some(category_id) = params.uuid_param("categoryId") {
            query.push(
                " AND EXISTS (SELECT 1 FROM category_photo cp \
                 WHERE cp.photo_id = photos.id AND cp.categories_id = ",
            );
            query.push_bind(category_id.to_string());
            query.push(")");
        }
        if let Some(person_id) = params.uuid_param("personId") {
            query.push(
                " AND EXISTS (SELECT 1 FROM person_photo pp \
                 WHERE pp.photo_id = photos.id AND pp.persons_id = ",
            );
            query.push_bind(person_id.to_string());
            query.push(")");
        }
        if let Some(from) = params.get("dateFrom").and_then(parse_taken_on) {
            query.push(" AND taken_on >= ");
            query.push_bind(from);
        }
        if let Some(to) = params.get("dateTo").and_then(parse_taken_on) {
            query.push(" AND taken_on <= ");
            query.push_bind(to);
        }
        query.push(" ORDER BY taken_on DESC");

        let rows: Vec<PhotoRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        rows.iter()
            .map(|row| to_value(PhotoSummary::from(row)))
            .collect()
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: AlbumParams) -> Result<Value> {
        self.view_model(ctx, id).await
    }

    async fn create(&self, ctx: &TenantContext, data: Value, _params: AlbumParams) -> Result<Value> {
        let write = self.parse_write(data)?;
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();

        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        self.validate_references(&mut tx, ctx, &write).await?;

        sqlx::query(
            r#"INSERT INTO photos
                (id, filename, title, description, taken_on, location_id, disabled,
                 created_at, created_by, updated_at, updated_by, tenant_id)
               VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&write.filename)
        .bind(&write.title)
        .bind(&write.description)
        .bind(&write.taken_on)
        .bind(write.location_id.map(|l| l.to_string()))
        .bind(&now)
        .bind(ctx.caller.to_string())
        .bind(&now)
        .bind(ctx.caller.to_string())
        .bind(ctx.partition.to_string())
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        self.replace_associations(&mut tx, &id, &write).await?;
        tx.commit().await.map_err(storage_error)?;

        self.view_model(ctx, &id).await
    }

    async fn update(
        &self,
        ctx: &TenantContext,
        id: &str,
        data: Value,
        _params: AlbumParams,
    ) -> Result<Value> {
        let write = self.parse_write(data)?;

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // A missing or foreign-partition photo answers not-found before any
        // reference validation gets a chance to answer unprocessable.
        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM photos WHERE id = ? AND tenant_id = ?")
                .bind(id)
                .bind(ctx.partition.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error)?;
        if existing.is_none() {
            return Err(not_found("Photo"));
        }

        self.validate_references(&mut tx, ctx, &write).await?;

        let updated = sqlx::query(
            r#"UPDATE photos
               SET filename = ?, title = ?, description = ?, taken_on = ?,
                   location_id = ?, updated_at = ?, updated_by = ?
               WHERE id = ? AND tenant_id = ?"#,
        )
        .bind(&write.filename)
        .bind(&write.title)
        .bind(&write.description)
        .bind(&write.taken_on)
        .bind(write.location_id.map(|l| l.to_string()))
        .bind(now_rfc3339())
        .bind(ctx.caller.to_string())
        .bind(id)
        .bind(ctx.partition.to_string())
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        if updated.rows_affected() == 0 {
            return Err(not_found("Photo"));
        }

        self.replace_associations(&mut tx, id, &write).await?;
        tx.commit().await.map_err(storage_error)?;

        self.view_model(ctx, id).await
    }

    async fn patch(
        &self,
        ctx: &TenantContext,
        id: Option<&str>,
        data: Value,
        params: AlbumParams,
    ) -> Result<Value> {
        let id = id.ok_or_else(|| not_found("Photo"))?;
        let current = self.write_shape(ctx, id).await?;
        let merged = merge_patch(current, &data);
        self.update(ctx, id, merged, params).await
    }

    async fn remove(
        &self,
        ctx: &TenantContext,
        id: Option<&str>,
        _params: AlbumParams,
    ) -> Result<Value> {
        let id = id.ok_or_else(|| not_found("Photo"))?;
        let removed = self.view_model(ctx, id).await?;

        sqlx::query(
            r#"UPDATE photos SET disabled = 1, updated_at = ?, updated_by = ?
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
