//! Persistence for cached categories.
//!
//! SQLite is the durable store; an in-memory store stands in whenever it fails.

mod collate;
mod fallback;
mod memory;
mod sqlite;
mod store;

pub use fallback::FallbackStore;
pub use memory::MemoryCategoryStore;
pub use sqlite::SqliteCategoryStore;
pub use store::{CategoryStore, StoreError};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

/// Layout version of the `categories` table. Any change to it bumps this number.
pub const SCHEMA_VERSION: i64 = 3;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Bring the schema to `SCHEMA_VERSION`.
///
/// There is no incremental path: a version mismatch drops the categories table and
/// recreates it, so the cache refills from upstream.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    let current: Option<i64> = sqlx::query("SELECT schema_version FROM meta WHERE id = 1")
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.get("schema_version"));

    if current == Some(SCHEMA_VERSION) {
        tx.commit().await?;
        return Ok(());
    }

    tracing::info!(
        "Category schema upgrade from version {} to {}",
        current.unwrap_or(0),
        SCHEMA_VERSION
    );

    sqlx::query("DROP TABLE IF EXISTS categories")
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE categories (
            category TEXT NOT NULL,
            lang TEXT NOT NULL,
            text TEXT NOT NULL,
            last_updated TEXT,
            fetched_at TEXT NOT NULL,
            PRIMARY KEY (category, lang)
        );

        CREATE INDEX idx_categories_lang ON categories(lang);
        CREATE INDEX idx_categories_text ON categories(text);
        CREATE INDEX idx_categories_last_updated ON categories(last_updated);
        CREATE INDEX idx_categories_fetched_at ON categories(fetched_at);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT OR REPLACE INTO meta (id, schema_version) VALUES (1, ?)")
        .bind(SCHEMA_VERSION)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("Categories table created (schema version {})", SCHEMA_VERSION);

    Ok(())
}
