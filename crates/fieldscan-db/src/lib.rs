//! # fieldscan-db: Persistence Layer for FieldScan
//!
//! Local storage for scan batches. Batches live in a SQLite-backed
//! key-value table so the on-disk format stays the simple one the front end
//! already understands: a JSON array under `scannedItems_{storeId}_{eventId}`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FieldScan Data Flow                              │
//! │                                                                         │
//! │  ItemStore::commit_batch / delete_selected                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    fieldscan-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │  Repositories      │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│  KeyValueRepository│  │ (embedded) │  │   │
//! │  │   │  SqlitePool   │    │  BatchRepository   │  │ kv_store   │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (fieldscan.db)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Key-value and batch repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fieldscan_core::ScanContext;
//! use fieldscan_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("fieldscan.db")).await?;
//!
//! let context = ScanContext::new("S1", "E1")?;
//! let batch = db.batches().load(&context).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::batch::BatchRepository;
pub use repository::kv::KeyValueRepository;
