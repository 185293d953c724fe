//! # fieldscan-capture: Scan Workflow for FieldScan
//!
//! This crate owns the camera, the scan session, product enrichment and the
//! aggregate of scanned items.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Capture Workflow                                 │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 ScanController (one per camera)                  │  │
//! │  │                                                                  │  │
//! │  │  start(config) → ScanSession { CameraLease, DedupSet, feed }     │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ complete() → Vec<String>               │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  ItemStore (shared, &self API)                   │  │
//! │  │                                                                  │  │
//! │  │  commit_batch → enrich each new code → prepend batch             │  │
//! │  │  delete_selected → rewrite or drop batch keys                    │  │
//! │  └───────────────┬──────────────────────────────┬───────────────────┘  │
//! │                  ▼                              ▼                       │
//! │  ┌────────────────────────────┐  ┌──────────────────────────────────┐  │
//! │  │ ProductLookup              │  │ fieldscan-db BatchRepository     │  │
//! │  │ OpenFoodFactsClient (HTTP) │  │ scannedItems_{store}_{event}     │  │
//! │  └────────────────────────────┘  └──────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`camera`] - Exclusive camera lease
//! - [`engine`] - Detection engine trait and provided engines
//! - [`session`] - `ScanController`, `ScanSession`, scan events
//! - [`lookup`] - Product lookup and placeholder fallback
//! - [`store`] - `ItemStore` aggregate and batch persistence
//! - [`config`] - Application configuration (TOML + environment)
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fieldscan_capture::{build_lookup, AppConfig, CameraDevice, ItemStore,
//!                         LineReaderEngine, ScanController};
//!
//! let config = AppConfig::load_or_default(None);
//! let store = ItemStore::new(database, build_lookup(&config.enrichment)?);
//! store.load_all().await?;
//!
//! let controller = ScanController::new(
//!     CameraDevice::new(&config.scanner.camera),
//!     Arc::new(LineReaderEngine::stdin()),
//! );
//! let mut session = controller.start(config.scan_config()).await?;
//! session.run().await?;
//! let codes = session.complete()?;
//!
//! let outcome = store.commit_batch(&codes, &context).await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod session;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use camera::{CameraDevice, CameraLease};
pub use config::{AppConfig, EnrichmentSettings, ScannerSettings};
pub use engine::{CandidateFeed, ChannelEngine, DetectionEngine, LineReaderEngine};
pub use error::{
    ConfigError, ConfigResult, EngineError, LookupError, LookupResult, ScanError, ScanResult,
    StoreError, StoreResult,
};
pub use lookup::{build_lookup, enrich, DisabledLookup, OpenFoodFactsClient, ProductLookup};
pub use session::{
    NoOpEmitter, ScanController, ScanEventEmitter, ScanHandle, ScanSession, StopReason,
};
pub use store::{CommitOutcome, DeleteOutcome, ItemStore};
