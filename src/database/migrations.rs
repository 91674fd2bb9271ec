use crate::error::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Run all database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_migrations_table(pool).await?;

    for (version, name, sql) in get_migrations() {
        if !is_migration_applied(pool, version).await? {
            info!(version = version, name = name, "Applying migration");

            sqlx::query(sql).execute(pool).await?;
            record_migration(pool, version, name).await?;

            info!(version = version, name = name, "Migration applied successfully");
        }
    }

    Ok(())
}

/// Create the migrations tracking table
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Check if a migration has been applied
async fn is_migration_applied(pool: &SqlitePool, version: i32) -> Result<bool> {
    let result = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
    )
    .bind(version)
    .fetch_one(pool)
    .await?;

    Ok(result > 0)
}

/// Record a migration as applied
async fn record_migration(pool: &SqlitePool, version: i32, name: &str) -> Result<()> {
    sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
        .bind(version)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Get all migrations in order
fn get_migrations() -> Vec<(i32, &'static str, &'static str)> {
    vec![(1, "proxy_urls_table", MIGRATION_001_PROXY_URLS)]
}

// Migration 1: proxy pool table
const MIGRATION_001_PROXY_URLS: &str = r#"
CREATE TABLE IF NOT EXISTS proxy_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    url TEXT NOT NULL,
    ip TEXT NOT NULL DEFAULT '',
    consuming_time INTEGER NOT NULL DEFAULT 0,
    count INTEGER NOT NULL DEFAULT 0,
    weight INTEGER NOT NULL DEFAULT 1,
    retry INTEGER NOT NULL DEFAULT 0,
    available BOOLEAN NOT NULL DEFAULT 0,
    can_bypass_gfw BOOLEAN NOT NULL DEFAULT 0,
    CONSTRAINT unique_proxy_url UNIQUE (url)
);

CREATE INDEX IF NOT EXISTS idx_proxy_urls_deleted_at ON proxy_urls(deleted_at);
CREATE INDEX IF NOT EXISTS idx_proxy_urls_available ON proxy_urls(available, can_bypass_gfw);
"#;
