//! # Key-Value Repository
//!
//! Untyped text storage addressed by key. This is the persistence contract
//! the scan batches were designed against (a browser-style key-value store),
//! kept as-is so batches stay readable by any client of the same layout.

use chrono::Utc;
use sqlx::sqlite::SqliteExecutor;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for raw key-value operations.
#[derive(Debug, Clone)]
pub struct KeyValueRepository {
    pool: SqlitePool,
}

impl KeyValueRepository {
    /// Creates a new KeyValueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KeyValueRepository { pool }
    }

    /// Reads the value stored under `key`.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        get_value(&self.pool, key).await
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub async fn put(&self, key: &str, value: &str) -> DbResult<()> {
        put_value(&self.pool, key, value).await
    }

    /// Removes `key`. Returns true if it existed.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        remove_value(&self.pool, key).await
    }

    /// Lists keys starting with `prefix`, in key order.
    pub async fn keys_with_prefix(&self, prefix: &str) -> DbResult<Vec<String>> {
        // substr comparison instead of LIKE: ids may contain `_` and `%`
        let keys: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT key FROM kv_store
            WHERE substr(key, 1, length(?1)) = ?1
            ORDER BY key
            "#,
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        debug!(prefix = %prefix, count = keys.len(), "Listed keys");
        Ok(keys)
    }

    /// Returns true if `key` exists.
    pub async fn contains(&self, key: &str) -> DbResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

// =============================================================================
// Executor-generic helpers
// =============================================================================
// Shared with BatchRepository so a read-modify-write can run inside one
// transaction.

pub(crate) async fn get_value<'e, E>(executor: E, key: &str) -> DbResult<Option<String>>
where
    E: SqliteExecutor<'e>,
{
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
        .bind(key)
        .fetch_optional(executor)
        .await?;

    Ok(value)
}

pub(crate) async fn put_value<'e, E>(executor: E, key: &str, value: &str) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(key = %key, bytes = value.len(), "Writing value");

    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now().to_rfc3339())
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn remove_value<'e, E>(executor: E, key: &str) -> DbResult<bool>
where
    E: SqliteExecutor<'e>,
{
    debug!(key = %key, "Removing key");

    let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
        .bind(key)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_put_get_overwrite_remove() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();

        assert_eq!(kv.get("a").await.unwrap(), None);

        kv.put("a", "1").await.unwrap();
        kv.put("a", "2").await.unwrap();
        assert_eq!(kv.get("a").await.unwrap().as_deref(), Some("2"));

        assert!(kv.remove("a").await.unwrap());
        assert!(!kv.remove("a").await.unwrap());
        assert!(!kv.contains("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_prefix_is_literal() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();

        kv.put("scannedItems_S1_E1", "[]").await.unwrap();
        kv.put("scannedItems_S1_E2", "[]").await.unwrap();
        kv.put("scannedItemsXS1", "[]").await.unwrap();
        kv.put("other", "[]").await.unwrap();

        let keys = kv.keys_with_prefix("scannedItems_").await.unwrap();
        assert_eq!(keys, vec!["scannedItems_S1_E1", "scannedItems_S1_E2"]);
    }
}
