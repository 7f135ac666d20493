//! Tenant resolution: map a caller identity to its photobook partition,
//! provisioning the partition lazily on first access.
//!
//! Discipline under concurrency is "insert, and on conflict re-read": there
//! is no in-process locking; the unique index on `photobooks.owner_id`
//! guarantees one partition per owner, and a uniqueness violation on insert
//! is the expected signal that another request won the race.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use album_core::errors::AlbumError;
use album_core::tenant::{CallerIdentity, PartitionId};

use crate::models::now_rfc3339;

const DEFAULT_TITLE: &str = "My photobook";

#[derive(Clone)]
pub struct TenantResolver {
    pool: SqlitePool,
}

impl TenantResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve the caller's partition, creating it on first access.
    ///
    /// The common case is a pure read. On a miss the partition is inserted
    /// and committed immediately, not deferred to the end of the request's
    /// unit of work, so a concurrent loser can re-read it.
    pub async fn resolve(&self, caller: &CallerIdentity) -> Result<PartitionId> {
        if let Some(id) = self.lookup(caller.id).await? {
            return Ok(id);
        }
        self.provision(caller).await
    }

    async fn lookup(&self, owner: Uuid) -> Result<Option<PartitionId>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT id FROM photobooks WHERE owner_id = ?")
                .bind(owner.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_error)?;

        match row {
            Some((id,)) => {
                let id = Uuid::parse_str(&id).map_err(|e| {
                    AlbumError::general_error(format!("Corrupt photobook id: {e}")).into_anyhow()
                })?;
                Ok(Some(PartitionId(id)))
            }
            None => Ok(None),
        }
    }

    /// Insert path of resolve. A uniqueness violation on `owner_id` means a
    /// concurrent request provisioned first; re-read once and return the
    /// winner. Any other failure is fatal for the request.
    pub async fn provision(&self, caller: &CallerIdentity) -> Result<PartitionId> {
        let id = Uuid::new_v4();
        let title = caller
            .display_name
            .as_deref()
            .map(|name| format!("{name}'s photobook"))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let now = now_rfc3339();

        let inserted = sqlx::query(
            r#"INSERT INTO photobooks
                (id, title, owner_id, disabled, created_at, created_by, updated_at, updated_by)
               VALUES (?, ?, ?, 0, ?, ?, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(&title)
        .bind(caller.id.to_string())
        .bind(&now)
        .bind(caller.id.to_string())
        .bind(&now)
        .bind(caller.id.to_string())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                info!(owner = %caller.id, partition = %id, "provisioned photobook partition");
                Ok(PartitionId(id))
            }
            Err(e) if is_unique_violation(&e) => {
                debug!(owner = %caller.id, "partition already provisioned, re-reading");
                self.lookup(caller.id).await?.ok_or_else(|| {
                    AlbumError::unavailable("Photobook partition vanished after insert conflict")
                        .into_anyhow()
                })
            }
            Err(e) => Err(AlbumError::unavailable("Failed to provision photobook partition")
                .with_source(e.into())
                .into_anyhow()),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

fn storage_error(err: sqlx::Error) -> anyhow::Error {
    AlbumError::unavailable("Photobook storage unavailable")
        .with_source(err.into())
        .into_anyhow()
}
