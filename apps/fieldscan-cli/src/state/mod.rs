//! # Application State
//!
//! Everything a command needs, built once at startup.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AppState                                        │
//! │                                                                         │
//! │  AppConfig ──► DbConfig::new(config.database_path()) ──► Database       │
//! │      │                                                      │           │
//! │      └──► build_lookup(&config.enrichment) ──► ItemStore ◄──┘           │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • ItemStore: RwLock aggregate + per-key locks, shared as Arc          │
//! │  • AppConfig: read-only after startup                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::info;

use fieldscan_capture::{build_lookup, AppConfig, ItemStore, ProductLookup};
use fieldscan_core::ScanContext;
use fieldscan_db::{Database, DbConfig};

use crate::error::{CliError, CliResult};

/// Shared state for all commands.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub lookup: Arc<dyn ProductLookup>,
    pub store: Arc<ItemStore>,
}

impl AppState {
    /// Opens the configured database and builds the item store.
    pub async fn init(config: AppConfig) -> CliResult<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CliError::InvalidInput(format!("{}: {}", parent.display(), e)))?;
        }
        info!(?db_path, "Database path determined");

        let db = Database::new(DbConfig::new(db_path)).await?;
        let lookup = build_lookup(&config.enrichment)?;

        Ok(Self::from_parts(config, db, lookup))
    }

    /// Assembles state from already-built parts.
    pub fn from_parts(config: AppConfig, db: Database, lookup: Arc<dyn ProductLookup>) -> Self {
        let store = Arc::new(ItemStore::new(db.clone(), lookup.clone()));
        AppState {
            config,
            db,
            lookup,
            store,
        }
    }

    /// Resolves the scan context from flags, falling back to `[context]`.
    pub fn context(&self, store: Option<&str>, event: Option<&str>) -> CliResult<ScanContext> {
        let store = store
            .or(self.config.context.store_id.as_deref())
            .ok_or_else(|| CliError::InvalidInput("--store is required (or set [context] store_id)".into()))?;
        let event = event
            .or(self.config.context.event_id.as_deref())
            .ok_or_else(|| CliError::InvalidInput("--event is required (or set [context] event_id)".into()))?;

        Ok(ScanContext::new(store, event)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldscan_capture::DisabledLookup;

    async fn state(config: AppConfig) -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::from_parts(config, db, Arc::new(DisabledLookup))
    }

    #[tokio::test]
    async fn test_context_falls_back_to_config() {
        let mut config = AppConfig::default();
        config.context.store_id = Some("S1".into());
        config.context.event_id = Some("E1".into());
        let state = state(config).await;

        assert_eq!(state.context(None, None).unwrap().storage_key(), "scannedItems_S1_E1");
        assert_eq!(
            state.context(Some("S2"), None).unwrap().storage_key(),
            "scannedItems_S2_E1"
        );
    }

    #[tokio::test]
    async fn test_context_required() {
        let state = state(AppConfig::default()).await;
        assert!(matches!(state.context(None, Some("E1")), Err(CliError::InvalidInput(_))));
        assert!(matches!(state.context(Some(" "), Some("E1")), Err(CliError::Core(_))));
        assert!(matches!(state.context(Some("S_X"), Some("E1")), Err(CliError::Core(_))));
    }
}
