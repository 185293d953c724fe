//! # Error Types
//!
//! Domain-specific error types for fieldscan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fieldscan-core errors (this file)                                     │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  fieldscan-db errors                                                   │
//! │  └── DbError          - Persistence failures                           │
//! │                                                                         │
//! │  fieldscan-capture errors                                              │
//! │  ├── ScanError        - Camera / session failures                      │
//! │  ├── LookupError      - Product enrichment failures (never surfaced)   │
//! │  └── StoreError       - Item store load failures                       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ScanError / StoreError → CLI      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Scanner configuration cannot be used to start a session.
    ///
    /// ## When This Occurs
    /// - `max_multi_scan_count` is zero
    #[error("Invalid scan configuration: {reason}")]
    InvalidScanConfig { reason: String },

    /// A stored record does not belong to the batch it was read from.
    #[error("Record {barcode} belongs to {actual}, not {expected}")]
    ContextMismatch {
        barcode: String,
        expected: String,
        actual: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., control characters in a barcode).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
