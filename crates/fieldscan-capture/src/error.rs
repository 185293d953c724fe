//! # Capture Error Types
//!
//! Error types for the scan workflow.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Capture Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   ScanError     │  │  LookupError    │  │     StoreError          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Initialization │  │  Disabled       │  │  Database               │ │
//! │  │  EmptyScan      │  │  InvalidBarcode │  │  InvalidContext         │ │
//! │  │  CameraBusy     │  │  Http / Status  │  │                         │ │
//! │  │  SessionClosed  │  │  NotFound       │  │  (commit/delete report  │ │
//! │  │  InvalidConfig  │  │  Malformed      │  │   persistence failures  │ │
//! │  │                 │  │                 │  │   in their outcome)     │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Fatal to the session  Never crosses the   Hard failures of loads only │
//! │                        ItemStore boundary                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use fieldscan_core::CoreError;
use fieldscan_db::DbError;

/// Result type alias for scan session operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type alias for product lookups.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type alias for item store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Scan Errors
// =============================================================================

/// Errors raised by the scan controller and its sessions.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The detection engine could not start. The camera has been released.
    #[error("Scanner initialization failed ({engine}): {reason}")]
    Initialization { engine: String, reason: String },

    /// `complete()` was called before any code was detected.
    #[error("No barcodes scanned yet")]
    EmptyScan,

    /// Another session holds the camera.
    #[error("Camera '{device}' is in use by another scan session")]
    CameraBusy { device: String },

    /// The session already completed or was cancelled.
    #[error("Scan session is closed")]
    SessionClosed,

    /// The scan configuration cannot start a session.
    #[error("Invalid scan configuration: {0}")]
    InvalidConfig(String),
}

impl ScanError {
    /// Returns true if the user can recover without restarting the scanner.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScanError::EmptyScan | ScanError::CameraBusy { .. })
    }
}

/// Failure reported by a detection engine while starting.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        EngineError {
            message: message.into(),
        }
    }
}

// =============================================================================
// Lookup Errors
// =============================================================================

/// Errors from a product lookup. Callers map all of them to the placeholder.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Lookups are switched off in configuration.
    #[error("Product lookup is disabled")]
    Disabled,

    /// The barcode cannot be used in a lookup request.
    #[error("Barcode '{0}' cannot be looked up")]
    InvalidBarcode(String),

    /// The HTTP client could not be built.
    #[error("Lookup client setup failed: {0}")]
    Client(String),

    /// Transport failure (connect, timeout, body read).
    #[error("Lookup request failed: {0}")]
    Http(String),

    /// The service answered with a non-success status.
    #[error("Lookup service returned HTTP {0}")]
    Status(u16),

    /// The service has no product for this barcode.
    #[error("No product found for barcode '{0}'")]
    NotFound(String),

    /// The response body did not have the expected shape.
    #[error("Malformed lookup response: {0}")]
    Malformed(String),
}

impl From<url::ParseError> for LookupError {
    fn from(err: url::ParseError) -> Self {
        LookupError::Client(err.to_string())
    }
}

// =============================================================================
// Store Errors
// =============================================================================

/// Hard failures of the item store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Database(#[from] DbError),

    #[error("Invalid scan context: {0}")]
    InvalidContext(#[from] CoreError),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading, validating or saving [`AppConfig`](crate::AppConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available on this platform")]
    NoConfigPath,
}
