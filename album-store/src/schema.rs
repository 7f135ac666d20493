//! Schema bootstrap.
//!
//! The unique index on `photobooks.owner_id` is the backstop for concurrent
//! first-time provisioning: the resolver inserts optimistically and treats a
//! uniqueness violation as "the partition already exists".

use sqlx::SqlitePool;

const DDL: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS photobooks (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        owner_id    TEXT NOT NULL,
        disabled    INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL,
        created_by  TEXT,
        updated_at  TEXT NOT NULL,
        updated_by  TEXT
    )"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS ix_photobooks_owner_id
        ON photobooks (owner_id)"#,
    r#"CREATE TABLE IF NOT EXISTS categories (
        id            TEXT PRIMARY KEY,
        category_name TEXT,
        description   TEXT,
        color         TEXT,
        icon          TEXT,
        disabled      INTEGER NOT NULL DEFAULT 0,
        created_at    TEXT NOT NULL,
        created_by    TEXT,
        updated_at    TEXT NOT NULL,
        updated_by    TEXT,
        tenant_id     TEXT NOT NULL REFERENCES photobooks (id)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS ix_categories_tenant_id
        ON categories (tenant_id)"#,
    r#"CREATE TABLE IF NOT EXISTS locations (
        id            TEXT PRIMARY KEY,
        location_name TEXT,
        description   TEXT,
        latitude      REAL,
        longitude     REAL,
        reusable      INTEGER NOT NULL DEFAULT 0,
        disabled      INTEGER NOT NULL DEFAULT 0,
        created_at    TEXT NOT NULL,
        created_by    TEXT,
        updated_at    TEXT NOT NULL,
        updated_by    TEXT,
        tenant_id     TEXT NOT NULL REFERENCES photobooks (id)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS ix_locations_tenant_id
        ON locations (tenant_id)"#,
    r#"CREATE TABLE IF NOT EXISTS persons (
        id          TEXT PRIMARY KEY,
        person_name TEXT,
        description TEXT,
        disabled    INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL,
        created_by  TEXT,
        updated_at  TEXT NOT NULL,
        updated_by  TEXT,
        tenant_id   TEXT NOT NULL REFERENCES photobooks (id)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS ix_persons_tenant_id
        ON persons (tenant_id)"#,
    r#"CREATE TABLE IF NOT EXISTS photos (
        id          TEXT PRIMARY KEY,
        filename    TEXT,
        title       TEXT,
        description TEXT,
        taken_on    TEXT,
        location_id TEXT REFERENCES locations (id),
        disabled    INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL,
        created_by  TEXT,
        updated_at  TEXT NOT NULL,
        updated_by  TEXT,
        tenant_id   TEXT NOT NULL REFERENCES photobooks (id)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS ix_photos_tenant_id
        ON photos (tenant_id)"#,
    r#"CREATE INDEX IF NOT EXISTS ix_photos_taken_on
        ON photos (taken_on)"#,
    r#"CREATE INDEX IF NOT EXISTS ix_photos_location_id
        ON photos (location_id)"#,
    r#"CREATE TABLE IF NOT EXISTS category_photo (
        categories_id TEXT NOT NULL REFERENCES categories (id) ON DELETE CASCADE,
        photo_id      TEXT NOT NULL REFERENCES photos (id) ON DELETE CASCADE,
        PRIMARY KEY (categories_id, photo_id)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS ix_category_photo_photo_id
        ON category_photo (photo_id)"#,
    r#"CREATE TABLE IF NOT EXISTS person_photo (
        persons_id TEXT NOT NULL REFERENCES persons (id) ON DELETE CASCADE,
        photo_id   TEXT NOT NULL REFERENCES photos (id) ON DELETE CASCADE,
        PRIMARY KEY (persons_id, photo_id)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS ix_person_photo_photo_id
        ON person_photo (photo_id)"#,
];

/// Create all tables and indexes. Idempotent.
pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
