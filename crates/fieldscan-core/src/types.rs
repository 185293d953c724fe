//! # Domain Types
//!
//! Records produced by the barcode capture workflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ScanContext    │   │ ScannedBarcode  │   │  ProductInfo    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  store_id       │◄──│  barcode        │──►│  name, brand    │       │
//! │  │  event_id       │   │  timestamp      │   │  image?         │       │
//! │  │                 │   │  status         │   │  nutriments     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Storage key: scannedItems_{store_id}_{event_id}                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Within one storage key a record is addressed by `barcode`. The same code
//! may be scanned again in a later session; the two records then differ by
//! `timestamp`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::product::ProductInfo;
use crate::validation::validate_context_id;
use crate::{STORAGE_KEY_PREFIX, STORAGE_KEY_SEPARATOR};

// =============================================================================
// Scan Context
// =============================================================================

/// The store visit and promotional event a batch of scans belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScanContext {
    pub store_id: String,
    pub event_id: String,
}

impl ScanContext {
    /// Builds a validated context. Both ids are trimmed.
    pub fn new(store_id: impl AsRef<str>, event_id: impl AsRef<str>) -> CoreResult<Self> {
        let store_id = validate_context_id("store_id", store_id.as_ref())?;
        let event_id = validate_context_id("event_id", event_id.as_ref())?;
        Ok(ScanContext { store_id, event_id })
    }

    /// Returns the persisted batch key, `scannedItems_{store_id}_{event_id}`.
    pub fn storage_key(&self) -> String {
        format!(
            "{prefix}{sep}{}{sep}{}",
            self.store_id,
            self.event_id,
            prefix = STORAGE_KEY_PREFIX,
            sep = STORAGE_KEY_SEPARATOR
        )
    }
}

impl fmt::Display for ScanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.store_id, self.event_id)
    }
}

// =============================================================================
// Scan Status
// =============================================================================

/// Lifecycle status of a scan record.
///
/// Records are immutable after capture, so there is only one state today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ScanStatus {
    #[default]
    Scanned,
}

// =============================================================================
// Scanned Barcode
// =============================================================================

/// One captured barcode, as persisted in a batch.
///
/// ## Wire Format
/// ```json
/// {
///   "barcode": "8801234567890",
///   "timestamp": "2024-05-01T09:30:00Z",
///   "storeId": "S1",
///   "eventId": "E1",
///   "status": "Scanned",
///   "productInfo": { "name": "Unknown Product", ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScannedBarcode {
    pub barcode: String,

    /// Capture time (ISO8601).
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,

    pub store_id: String,
    pub event_id: String,

    #[serde(default)]
    pub status: ScanStatus,

    /// Enrichment result, or the placeholder when lookup failed.
    #[serde(default = "ProductInfo::placeholder")]
    pub product_info: ProductInfo,
}

impl ScannedBarcode {
    /// Creates a record for `barcode` captured at `timestamp`.
    pub fn new(
        barcode: impl Into<String>,
        context: &ScanContext,
        product_info: ProductInfo,
        timestamp: DateTime<Utc>,
    ) -> Self {
        ScannedBarcode {
            barcode: barcode.into(),
            timestamp,
            store_id: context.store_id.clone(),
            event_id: context.event_id.clone(),
            status: ScanStatus::Scanned,
            product_info,
        }
    }

    /// Returns the context this record was captured in.
    pub fn context(&self) -> ScanContext {
        ScanContext {
            store_id: self.store_id.clone(),
            event_id: self.event_id.clone(),
        }
    }

    /// Returns true if this record lives under `context`.
    pub fn belongs_to(&self, context: &ScanContext) -> bool {
        self.store_id == context.store_id && self.event_id == context.event_id
    }

    /// Fails with [`CoreError::ContextMismatch`] unless this record lives
    /// under `context`.
    pub fn ensure_context(&self, context: &ScanContext) -> CoreResult<()> {
        if self.belongs_to(context) {
            return Ok(());
        }

        Err(CoreError::ContextMismatch {
            barcode: self.barcode.clone(),
            expected: context.to_string(),
            actual: self.context().to_string(),
        })
    }
}

/// Sorts records most recent first.
///
/// The sort is stable, so records sharing a timestamp (one commit batch)
/// keep their relative order.
pub fn sort_newest_first(records: &mut [ScannedBarcode]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
