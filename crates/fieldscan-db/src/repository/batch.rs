//! # Batch Repository
//!
//! Typed access to scan batches stored under
//! `scannedItems_{storeId}_{eventId}`.
//!
//! ## Read-Modify-Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   prepend(S1/E1, [new₁, new₂])                          │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    SELECT value FROM kv_store WHERE key = 'scannedItems_S1_E1'          │
//! │         [old₁, old₂]                                                    │
//! │    UPSERT value = [new₁, new₂, old₁, old₂]   ← newest batch first,      │
//! │                                                detection order within   │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │                   remove_barcodes(S1/E1, [old₁])                        │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    SELECT …  →  filter  →  empty?  DELETE key : UPSERT remaining        │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An emptied batch never lingers as `[]`: the key is removed.

use std::collections::HashSet;

use fieldscan_core::types::sort_newest_first;
use fieldscan_core::{ScanContext, ScannedBarcode, STORAGE_KEY_PREFIX, STORAGE_KEY_SEPARATOR};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::repository::kv::{self, KeyValueRepository};

/// Repository for scan batch operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Loads the batch for `context`. A missing key is an empty batch.
    pub async fn load(&self, context: &ScanContext) -> DbResult<Vec<ScannedBarcode>> {
        let key = context.storage_key();
        match kv::get_value(&self.pool, &key).await? {
            Some(json) => decode(&key, &json),
            None => Ok(Vec::new()),
        }
    }

    /// Replaces the batch for `context`.
    ///
    /// Every record must belong to `context`. An empty slice removes the key.
    pub async fn save(&self, context: &ScanContext, records: &[ScannedBarcode]) -> DbResult<()> {
        let key = context.storage_key();

        if records.is_empty() {
            kv::remove_value(&self.pool, &key).await?;
            return Ok(());
        }

        let json = encode(&key, context, records)?;
        kv::put_value(&self.pool, &key, &json).await
    }

    /// Prepends `records` to the batch for `context`.
    ///
    /// Returns the batch length after the write.
    pub async fn prepend(
        &self,
        context: &ScanContext,
        records: &[ScannedBarcode],
    ) -> DbResult<usize> {
        let key = context.storage_key();
        let mut tx = self.pool.begin().await?;

        let existing = match kv::get_value(&mut *tx, &key).await? {
            Some(json) => decode(&key, &json)?,
            None => Vec::new(),
        };

        let mut merged = Vec::with_capacity(records.len() + existing.len());
        merged.extend_from_slice(records);
        merged.extend(existing);

        if merged.is_empty() {
            tx.commit().await?;
            return Ok(0);
        }

        let json = encode(&key, context, &merged)?;
        kv::put_value(&mut *tx, &key, &json).await?;
        tx.commit().await?;

        debug!(key = %key, added = records.len(), total = merged.len(), "Prepended records");
        Ok(merged.len())
    }

    /// Removes every record in the batch for `context` whose barcode is in
    /// `barcodes`.
    ///
    /// Returns the number of records removed. The key is deleted when the
    /// batch becomes empty.
    pub async fn remove_barcodes(
        &self,
        context: &ScanContext,
        barcodes: &[String],
    ) -> DbResult<usize> {
        let key = context.storage_key();
        let targets: HashSet<&str> = barcodes.iter().map(String::as_str).collect();

        let mut tx = self.pool.begin().await?;

        let Some(json) = kv::get_value(&mut *tx, &key).await? else {
            tx.commit().await?;
            return Ok(0);
        };

        let existing = decode(&key, &json)?;
        let before = existing.len();
        let remaining: Vec<ScannedBarcode> = existing
            .into_iter()
            .filter(|record| !targets.contains(record.barcode.as_str()))
            .collect();
        let removed = before - remaining.len();

        if remaining.is_empty() {
            kv::remove_value(&mut *tx, &key).await?;
        } else if removed > 0 {
            let json = encode(&key, context, &remaining)?;
            kv::put_value(&mut *tx, &key, &json).await?;
        }

        tx.commit().await?;

        debug!(key = %key, removed, remaining = remaining.len(), "Removed records");
        Ok(removed)
    }

    /// Lists every stored batch key.
    pub async fn keys(&self) -> DbResult<Vec<String>> {
        KeyValueRepository::new(self.pool.clone())
            .keys_with_prefix(&format!("{}{}", STORAGE_KEY_PREFIX, STORAGE_KEY_SEPARATOR))
            .await
    }

    /// Loads every batch, newest first.
    ///
    /// A corrupt batch is logged and skipped so one bad key cannot hide the
    /// rest of the history.
    pub async fn list_all(&self) -> DbResult<Vec<ScannedBarcode>> {
        let mut records = Vec::new();

        for key in self.keys().await? {
            let Some(json) = kv::get_value(&self.pool, &key).await? else {
                continue;
            };

            match decode(&key, &json) {
                Ok(batch) => records.extend(batch),
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable batch"),
            }
        }

        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Loads every batch captured at `store_id`, newest first.
    pub async fn list_for_store(&self, store_id: &str) -> DbResult<Vec<ScannedBarcode>> {
        // Key prefixes are ambiguous when ids contain `_`, so filter on the
        // records themselves.
        let mut records = self.list_all().await?;
        records.retain(|record| record.store_id == store_id);
        Ok(records)
    }
}

fn decode(key: &str, json: &str) -> DbResult<Vec<ScannedBarcode>> {
    serde_json::from_str(json).map_err(|e| DbError::corrupt(key, e))
}

fn encode(key: &str, context: &ScanContext, records: &[ScannedBarcode]) -> DbResult<String> {
    for record in records {
        record.ensure_context(context)?;
    }
    serde_json::to_string(records).map_err(|e| DbError::corrupt(key, e))
}
