//! # Repository Module
//!
//! Database repository implementations for FieldScan.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ItemStore                                                              │
//! │       │  db.batches().prepend(&context, &records)                       │
//! │       ▼                                                                 │
//! │  BatchRepository   ← typed: Vec<ScannedBarcode> ⇄ JSON array            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  KeyValueRepository ← untyped: key → text value                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kv_store table                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`KeyValueRepository`](kv::KeyValueRepository) - Raw key-value access
//! - [`BatchRepository`](batch::BatchRepository) - Scan batch read-modify-write

pub mod batch;
pub mod kv;
