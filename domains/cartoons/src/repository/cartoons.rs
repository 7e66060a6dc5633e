//! Cartoon catalog repository

use chrono::{SecondsFormat, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::domain::entities::CartoonRecord;

/// All columns in the image table, used for SELECT and RETURNING clauses.
const CARTOON_COLUMNS: &str = "id, key, created_at";

const LIST_RECENT: &str = "SELECT id, key, created_at FROM image \
     ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2";

const COUNT: &str = "SELECT COUNT(*) FROM image";

#[derive(Clone)]
pub struct CartoonRepository {
    pool: SqlitePool,
}

impl CartoonRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a new database transaction.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Record a stored object. The caller must have finished writing the
    /// object under `key` first.
    pub async fn insert(&self, key: &str) -> Result<CartoonRecord, sqlx::Error> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let query = format!(
            "INSERT INTO image (key, created_at) VALUES (?1, ?2) RETURNING {CARTOON_COLUMNS}"
        );
        sqlx::query_as::<_, CartoonRecord>(&query)
            .bind(key)
            .bind(created_at)
            .fetch_one(&self.pool)
            .await
    }

    /// Newest first, ties broken by id
    pub async fn list_recent(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CartoonRecord>, sqlx::Error> {
        sqlx::query_as::<_, CartoonRecord>(LIST_RECENT)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn find_by_key(&self, key: &str) -> Result<Option<CartoonRecord>, sqlx::Error> {
        let query = format!("SELECT {CARTOON_COLUMNS} FROM image WHERE key = ?1");
        sqlx::query_as::<_, CartoonRecord>(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(COUNT)
            .fetch_one(&self.pool)
            .await
    }
}

/// `list_recent` within an existing transaction. Pair with `count_tx` on the
/// same transaction so both reads see one snapshot.
pub async fn list_recent_tx(
    tx: &mut Transaction<'_, Sqlite>,
    limit: i64,
    offset: i64,
) -> Result<Vec<CartoonRecord>, sqlx::Error> {
    sqlx::query_as::<_, CartoonRecord>(LIST_RECENT)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut **tx)
        .await
}

pub async fn count_tx(tx: &mut Transaction<'_, Sqlite>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(COUNT).fetch_one(&mut **tx).await
}
