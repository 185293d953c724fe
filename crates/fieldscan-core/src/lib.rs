//! # fieldscan-core: Pure Domain Logic for FieldScan
//!
//! This crate holds the records and rules of the barcode capture workflow
//! as pure functions and value types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FieldScan Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    fieldscan-cli / SPA front end                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   fieldscan-capture: ScanSession, ItemStore, ProductLookup      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ fieldscan-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   dedup   │  │  product  │  │ validation│  │   │
//! │  │   │ Scanned-  │  │ DedupSet  │  │ Product-  │  │  barcode  │  │   │
//! │  │   │ Barcode   │  │           │  │ Info      │  │  context  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              fieldscan-db (key-value batch storage)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Scan records and their storage context
//! - [`product`] - Product metadata and the fixed placeholder
//! - [`dedup`] - Insertion-ordered unique barcode collection
//! - [`scan_config`] - Scanner session configuration
//! - [`validation`] - Input validation and GTIN check digits
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use fieldscan_core::DedupSet;
//!
//! let mut seen = DedupSet::new();
//! assert!(seen.insert("8801234567890"));
//! assert!(!seen.insert("8801234567890"));
//! assert!(seen.insert("4901234567891"));
//!
//! assert_eq!(seen.into_vec(), vec!["8801234567890", "4901234567891"]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dedup;
pub mod error;
pub mod product;
pub mod scan_config;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use dedup::DedupSet;
pub use error::{CoreError, CoreResult, ValidationError};
pub use product::{Nutriments, ProductInfo};
pub use scan_config::ScanConfig;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix of every persisted batch key: `scannedItems_{storeId}_{eventId}`.
pub const STORAGE_KEY_PREFIX: &str = "scannedItems";

/// Joins the prefix and the ids in a batch key. Context ids may not contain it.
pub const STORAGE_KEY_SEPARATOR: char = '_';

/// Default upper bound on distinct codes captured by one multi-scan session.
pub const DEFAULT_MAX_MULTI_SCAN_COUNT: usize = 150;

/// Maximum length of a store or event identifier.
pub const MAX_CONTEXT_ID_LEN: usize = 64;

/// Maximum length of a barcode payload.
///
/// 2D symbologies can carry far more, but the lookup service and the
/// storage key space only make sense for product codes.
pub const MAX_BARCODE_LEN: usize = 128;
