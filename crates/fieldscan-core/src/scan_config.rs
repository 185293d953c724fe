//! # Scan Configuration
//!
//! Options recognized when a scan session starts.
//!
//! ## Session Stop Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  enable_multi_scan = false  →  stop after the first distinct code       │
//! │  distinct codes == max      →  stop; later new codes are dropped        │
//! │  multi_scan_timeout_ms > 0  →  stop once that long has elapsed          │
//! │  multi_scan_timeout_ms = 0  →  no time limit                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::DEFAULT_MAX_MULTI_SCAN_COUNT;

/// Scanner session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// Keep scanning after the first code.
    #[serde(default = "default_enable_multi_scan")]
    pub enable_multi_scan: bool,

    /// Upper bound on distinct codes per session.
    #[serde(default = "default_max_multi_scan_count")]
    pub max_multi_scan_count: usize,

    /// Session time limit in milliseconds (0 = none).
    #[serde(default, rename = "multiScanTimeout")]
    pub multi_scan_timeout_ms: u64,
}

fn default_enable_multi_scan() -> bool {
    true
}

fn default_max_multi_scan_count() -> usize {
    DEFAULT_MAX_MULTI_SCAN_COUNT
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            enable_multi_scan: default_enable_multi_scan(),
            max_multi_scan_count: default_max_multi_scan_count(),
            multi_scan_timeout_ms: 0,
        }
    }
}

impl ScanConfig {
    /// Configuration for a session that stops at the first code.
    pub fn single() -> Self {
        ScanConfig {
            enable_multi_scan: false,
            ..Self::default()
        }
    }

    /// Checks the configuration can start a session.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_multi_scan_count == 0 {
            return Err(CoreError::InvalidScanConfig {
                reason: "max_multi_scan_count must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Number of distinct codes after which the session stops.
    pub fn capacity(&self) -> usize {
        if self.enable_multi_scan {
            self.max_multi_scan_count
        } else {
            1
        }
    }

    /// Session time limit, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.multi_scan_timeout_ms > 0).then(|| Duration::from_millis(self.multi_scan_timeout_ms))
    }
}
