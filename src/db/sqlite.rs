//! SQLite-backed category store.
//!
//! Each write runs in one transaction so a batch lands all-or-nothing.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use super::collate::sort_by_text;
use super::store::{ensure_language, CategoryStore, StoreError};
use crate::models::CategoryRecord;

const SELECT_COLUMNS: &str = "SELECT category, lang, text, last_updated, fetched_at FROM categories";

/// Durable category store.
#[derive(Clone)]
pub struct SqliteCategoryStore {
    pool: SqlitePool,
}

impl SqliteCategoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn upsert(
    tx: &mut Transaction<'_, Sqlite>,
    record: &CategoryRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO categories (category, lang, text, last_updated, fetched_at) VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(category, lang) DO UPDATE SET text = excluded.text, \
         last_updated = excluded.last_updated, fetched_at = excluded.fetched_at",
    )
    .bind(&record.category)
    .bind(&record.lang)
    .bind(&record.text)
    .bind(&record.last_updated)
    .bind(&record.fetched_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn record_from_row(row: &SqliteRow) -> CategoryRecord {
    CategoryRecord {
        category: row.get("category"),
        lang: row.get("lang"),
        text: row.get("text"),
        last_updated: row.get("last_updated"),
        fetched_at: row.get("fetched_at"),
    }
}

#[async_trait]
impl CategoryStore for SqliteCategoryStore {
    async fn put(&self, records: &[CategoryRecord]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            upsert(&mut tx, record).await?;
        }
        tx.commit().await?;

        tracing::debug!("Saved {} category records", records.len());
        Ok(records.len())
    }

    async fn query_by_language(&self, lang: &str) -> Result<Vec<CategoryRecord>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE lang = ?"))
            .bind(lang)
            .fetch_all(&self.pool)
            .await?;

        let mut records: Vec<CategoryRecord> = rows.iter().map(record_from_row).collect();
        sort_by_text(&mut records);
        Ok(records)
    }

    async fn query_all(&self) -> Result<Vec<CategoryRecord>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY category, lang"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn delete_by_language(&self, lang: &str) -> Result<usize, StoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE lang = ?")
            .bind(lang)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted {} categories for {}", result.rows_affected(), lang);
        Ok(result.rows_affected() as usize)
    }

    async fn replace_language(
        &self,
        lang: &str,
        records: &[CategoryRecord],
    ) -> Result<usize, StoreError> {
        ensure_language(lang, records)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM categories WHERE lang = ?")
            .bind(lang)
            .execute(&mut *tx)
            .await?;
        for record in records {
            upsert(&mut tx, record).await?;
        }
        tx.commit().await?;

        Ok(records.len())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM categories")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_id(
        &self,
        category: &str,
        lang: &str,
    ) -> Result<Option<CategoryRecord>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE category = ? AND lang = ?"))
            .bind(category)
            .bind(lang)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(record_from_row))
    }
}
