//! # Item Store
//!
//! The in-memory aggregate of scanned items and its persisted batches.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_batch(["111", "222", "111"], S1/E1)                             │
//! │       │                                                                 │
//! │       ▼  lock "scannedItems_S1_E1"                                      │
//! │  ┌─────────────────────┐                                                │
//! │  │ filter              │  "111" already in aggregate → skipped          │
//! │  │                     │  second "111" in batch      → skipped          │
//! │  └─────────┬───────────┘                                                │
//! │            ▼  sequential, one attempt each                              │
//! │  ┌─────────────────────┐                                                │
//! │  │ enrich("222")       │  Err → Placeholder                             │
//! │  └─────────┬───────────┘                                                │
//! │            ▼                                                            │
//! │  ┌─────────────────────┐   ┌─────────────────────────────────────────┐  │
//! │  │ batches().prepend() │──►│ Err → outcome.persistence_error, kept   │  │
//! │  └─────────┬───────────┘   │       in memory (reload reconciles)     │  │
//! │            ▼               └─────────────────────────────────────────┘  │
//! │  aggregate = new records (detection order) ++ aggregate                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Aggregate De-duplication
//! A code counts as "already scanned" only if it is in the loaded aggregate.
//! Batches that were never loaded are not consulted, so the same code can
//! reappear across sessions.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, error, info};

use fieldscan_core::validation::normalize_barcode;
use fieldscan_core::{DedupSet, ScanContext, ScannedBarcode};
use fieldscan_db::Database;

use crate::error::StoreResult;
use crate::lookup::{enrich, ProductLookup};

// =============================================================================
// Outcomes
// =============================================================================

/// Result of [`ItemStore::commit_batch`].
#[derive(Debug, Clone, Default)]
pub struct CommitOutcome {
    /// New records, in detection order.
    pub added: Vec<ScannedBarcode>,

    /// Codes not recorded: already in the aggregate, repeated or malformed.
    pub skipped: Vec<String>,

    /// Set when the batch could not be written. The records are still in
    /// the aggregate.
    pub persistence_error: Option<String>,
}

impl CommitOutcome {
    pub fn is_persisted(&self) -> bool {
        self.persistence_error.is_none()
    }
}

/// Result of [`ItemStore::delete_selected`].
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    /// Records removed from the aggregate.
    pub removed: usize,

    /// One message per batch that could not be rewritten.
    pub persistence_errors: Vec<String>,
}

impl DeleteOutcome {
    pub fn is_persisted(&self) -> bool {
        self.persistence_errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadScope {
    All,
    Store(String),
}

// =============================================================================
// Item Store
// =============================================================================

/// Aggregate of scanned items backed by per-context batches.
///
/// Share it as `Arc<ItemStore>`; all methods take `&self`.
pub struct ItemStore {
    db: Database,
    lookup: Arc<dyn ProductLookup>,
    items: RwLock<Vec<ScannedBarcode>>,
    scope: RwLock<LoadScope>,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ItemStore {
    /// Creates an empty store. Call [`load_all`](Self::load_all) or
    /// [`load_for_store`](Self::load_for_store) to read history.
    pub fn new(db: Database, lookup: Arc<dyn ProductLookup>) -> Self {
        ItemStore {
            db,
            lookup,
            items: RwLock::new(Vec::new()),
            scope: RwLock::new(LoadScope::All),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replaces the aggregate with every persisted batch, newest first.
    pub async fn load_all(&self) -> StoreResult<usize> {
        *self.scope.write().await = LoadScope::All;
        self.reload().await
    }

    /// Replaces the aggregate with the batches of one store, newest first.
    pub async fn load_for_store(&self, store_id: &str) -> StoreResult<usize> {
        *self.scope.write().await = LoadScope::Store(store_id.to_string());
        self.reload().await
    }

    /// Re-reads storage using the last load scope.
    pub async fn reload(&self) -> StoreResult<usize> {
        let scope = self.scope.read().await.clone();
        let batches = self.db.batches();

        let records = match &scope {
            LoadScope::All => batches.list_all().await?,
            LoadScope::Store(store_id) => batches.list_for_store(store_id).await?,
        };

        let count = records.len();
        *self.items.write().await = records;

        info!(?scope, count, "Aggregate loaded");
        Ok(count)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Snapshot of the aggregate, newest first.
    pub async fn items(&self) -> Vec<ScannedBarcode> {
        self.items.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// True if any loaded record carries `barcode`.
    pub async fn contains(&self, barcode: &str) -> bool {
        self.items.read().await.iter().any(|item| item.barcode == barcode)
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Records the codes of a finished scan under `context`.
    ///
    /// Codes already in the aggregate are skipped. Each remaining code is
    /// enriched in turn; lookup failures yield the placeholder. New records
    /// share one timestamp so re-sorting by time keeps detection order.
    pub async fn commit_batch(&self, codes: &[String], context: &ScanContext) -> CommitOutcome {
        let key = context.storage_key();
        let _guard = self.lock_key(&key).await;

        let mut outcome = CommitOutcome::default();

        let fresh = {
            let items = self.items.read().await;
            let known: HashSet<&str> = items.iter().map(|item| item.barcode.as_str()).collect();

            let mut fresh = DedupSet::new();
            for raw in codes {
                match normalize_barcode(raw) {
                    Ok(code) if !known.contains(code.as_str()) && !fresh.contains(&code) => {
                        fresh.insert(code);
                    }
                    _ => outcome.skipped.push(raw.clone()),
                }
            }
            fresh
        };

        if fresh.is_empty() {
            info!(context = %context, skipped = outcome.skipped.len(), "Nothing new to commit");
            return outcome;
        }

        let mut enriched = Vec::with_capacity(fresh.len());
        for code in fresh.into_vec() {
            let info = enrich(self.lookup.as_ref(), &code).await;
            enriched.push((code, info));
        }

        let timestamp = Utc::now();
        let records: Vec<ScannedBarcode> = enriched
            .into_iter()
            .map(|(code, info)| ScannedBarcode::new(code, context, info, timestamp))
            .collect();

        if let Err(e) = self.db.batches().prepend(context, &records).await {
            error!(context = %context, error = %e, "Failed to persist scan batch");
            outcome.persistence_error = Some(e.to_string());
        }

        {
            let mut items = self.items.write().await;
            let older = std::mem::replace(&mut *items, records.clone());
            items.extend(older);
        }

        info!(
            context = %context,
            added = records.len(),
            skipped = outcome.skipped.len(),
            persisted = outcome.is_persisted(),
            "Scan batch committed"
        );

        outcome.added = records;
        outcome
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Deletes `selected` from their batches and from the aggregate.
    ///
    /// A batch left empty is removed from storage entirely. Every record in a
    /// batch with a selected barcode goes, including older scans of the same
    /// code.
    pub async fn delete_selected(&self, selected: &[ScannedBarcode]) -> DeleteOutcome {
        let mut groups: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
        for item in selected {
            groups
                .entry((item.store_id.clone(), item.event_id.clone()))
                .or_default()
                .push(item.barcode.clone());
        }

        let mut outcome = DeleteOutcome::default();

        for ((store_id, event_id), barcodes) in groups {
            let context = ScanContext {
                store_id,
                event_id,
            };
            let key = context.storage_key();
            let _guard = self.lock_key(&key).await;

            match self.db.batches().remove_barcodes(&context, &barcodes).await {
                Ok(removed) => debug!(context = %context, removed, "Batch rewritten"),
                Err(e) => {
                    error!(context = %context, error = %e, "Failed to rewrite batch");
                    outcome
                        .persistence_errors
                        .push(format!("{}: {}", context, e));
                }
            }

            let targets: HashSet<&str> = barcodes.iter().map(String::as_str).collect();
            let mut items = self.items.write().await;
            let before = items.len();
            items.retain(|item| !(item.belongs_to(&context) && targets.contains(item.barcode.as_str())));
            outcome.removed += before - items.len();
        }

        info!(
            removed = outcome.removed,
            failed_batches = outcome.persistence_errors.len(),
            "Selected items deleted"
        );
        outcome
    }

    async fn lock_key(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.key_locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LookupError, LookupResult};
    use crate::lookup::DisabledLookup;
    use async_trait::async_trait;
    use fieldscan_core::ProductInfo;
    use fieldscan_db::DbConfig;
    use std::sync::Mutex as StdMutex;

    /// Knows a fixed set of products; fails for "bad", misses everything else.
    #[derive(Default)]
    struct FakeLookup {
        calls: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl ProductLookup for FakeLookup {
        async fn lookup(&self, barcode: &str) -> LookupResult<ProductInfo> {
            self.calls.lock().unwrap().push(barcode.to_string());
            match barcode {
                "bad" => Err(LookupError::Http("connection reset".into())),
                "222" => Ok(ProductInfo {
                    name: "Sparkling Water".into(),
                    ..ProductInfo::placeholder()
                }),
                other => Err(LookupError::NotFound(other.to_string())),
            }
        }
    }

    async fn store_with(lookup: Arc<dyn ProductLookup>) -> (Database, ItemStore) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = ItemStore::new(db.clone(), lookup);
        (db, store)
    }

    fn ctx(store: &str, event: &str) -> ScanContext {
        ScanContext::new(store, event).unwrap()
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    fn barcodes(items: &[ScannedBarcode]) -> Vec<&str> {
        items.iter().map(|item| item.barcode.as_str()).collect()
    }

    #[tokio::test]
    async fn test_recommit_yields_one_record_per_code() {
        let (db, store) = store_with(Arc::new(DisabledLookup)).await;
        let c = ctx("S1", "E1");

        store.commit_batch(&codes(&["111"]), &c).await;
        let outcome = store.commit_batch(&codes(&["111", "222"]), &c).await;

        assert_eq!(barcodes(&outcome.added), vec!["222"]);
        assert_eq!(outcome.skipped, vec!["111"]);

        let items = store.items().await;
        assert_eq!(items.iter().filter(|i| i.barcode == "111").count(), 1);
        assert_eq!(items.iter().filter(|i| i.barcode == "222").count(), 1);

        let persisted = db.batches().load(&c).await.unwrap();
        assert_eq!(barcodes(&persisted), vec!["222", "111"]);
    }

    #[tokio::test]
    async fn test_batch_keeps_detection_order_after_reload() {
        let (_db, store) = store_with(Arc::new(DisabledLookup)).await;
        let c = ctx("S1", "E1");

        store.commit_batch(&codes(&["a", "b", "c"]), &c).await;
        assert_eq!(barcodes(&store.items().await), vec!["a", "b", "c"]);

        store.load_all().await.unwrap();
        assert_eq!(barcodes(&store.items().await), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_duplicates_within_batch_are_skipped() {
        let (_db, store) = store_with(Arc::new(DisabledLookup)).await;

        let outcome = store
            .commit_batch(&codes(&["111", "111", " "]), &ctx("S1", "E1"))
            .await;

        assert_eq!(barcodes(&outcome.added), vec!["111"]);
        assert_eq!(outcome.skipped.len(), 2);
    }

    #[tokio::test]
    async fn test_enrichment_failure_is_isolated() {
        let lookup = Arc::new(FakeLookup::default());
        let (_db, store) = store_with(lookup.clone()).await;

        let outcome = store
            .commit_batch(&codes(&["bad", "222", "333"]), &ctx("S1", "E1"))
            .await;

        assert!(outcome.is_persisted());
        assert_eq!(outcome.added.len(), 3);
        assert!(outcome.added[0].product_info.is_placeholder());
        assert_eq!(outcome.added[1].product_info.name, "Sparkling Water");
        assert!(outcome.added[2].product_info.is_placeholder());

        // Sequential, one attempt each
        assert_eq!(*lookup.calls.lock().unwrap(), vec!["bad", "222", "333"]);
    }

    #[tokio::test]
    async fn test_commit_of_known_codes_writes_nothing() {
        let (db, store) = store_with(Arc::new(DisabledLookup)).await;
        let c = ctx("S1", "E1");

        store.commit_batch(&codes(&["111"]), &ctx("S1", "E0")).await;
        let outcome = store.commit_batch(&codes(&["111"]), &c).await;

        assert!(outcome.added.is_empty());
        assert!(!db.kv().contains(&c.storage_key()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_then_reload_matches_survivors() {
        let (db, store) = store_with(Arc::new(DisabledLookup)).await;
        let e1 = ctx("S1", "E1");
        let e2 = ctx("S1", "E2");

        store.commit_batch(&codes(&["111", "222"]), &e1).await;
        store.commit_batch(&codes(&["333"]), &e2).await;

        let doomed: Vec<_> = store
            .items()
            .await
            .into_iter()
            .filter(|item| item.barcode != "222")
            .collect();
        let outcome = store.delete_selected(&doomed).await;

        assert!(outcome.is_persisted());
        assert_eq!(outcome.removed, 2);
        assert_eq!(barcodes(&store.items().await), vec!["222"]);

        store.reload().await.unwrap();
        assert_eq!(barcodes(&store.items().await), vec!["222"]);
        assert!(!db.kv().contains("scannedItems_S1_E2").await.unwrap());
        assert!(db.kv().contains("scannedItems_S1_E1").await.unwrap());
    }

    #[tokio::test]
    async fn test_deleting_only_item_removes_key() {
        let (db, store) = store_with(Arc::new(DisabledLookup)).await;

        let outcome = store.commit_batch(&codes(&["111"]), &ctx("S1", "E1")).await;
        store.delete_selected(&outcome.added).await;

        assert_eq!(db.kv().get("scannedItems_S1_E1").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_memory_state() {
        let (db, store) = store_with(Arc::new(DisabledLookup)).await;
        db.close().await;

        let outcome = store.commit_batch(&codes(&["111"]), &ctx("S1", "E1")).await;

        assert!(outcome.persistence_error.is_some());
        assert!(store.contains("111").await);
    }

    #[tokio::test]
    async fn test_load_for_store_scopes_reload() {
        let (_db, store) = store_with(Arc::new(DisabledLookup)).await;
        store.commit_batch(&codes(&["111"]), &ctx("S1", "E1")).await;
        store.commit_batch(&codes(&["222"]), &ctx("S2", "E1")).await;

        assert_eq!(store.load_for_store("S2").await.unwrap(), 1);
        assert_eq!(barcodes(&store.items().await), vec!["222"]);

        // Only S2 is loaded, so "111" is new again
        let outcome = store.commit_batch(&codes(&["111"]), &ctx("S2", "E1")).await;
        assert_eq!(outcome.added.len(), 1);

        assert_eq!(store.reload().await.unwrap(), 2);
        assert_eq!(store.load_all().await.unwrap(), 3);
    }
}
