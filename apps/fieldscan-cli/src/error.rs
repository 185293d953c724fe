//! # CLI Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in fieldscan                              │
//! │                                                                         │
//! │  command fn ── Result<(), CliError>                                     │
//! │       │                                                                 │
//! │       ├── ConfigError ───┐                                              │
//! │       ├── DbError ───────┤                                              │
//! │       ├── ScanError ─────┼──► CliError ──► main prints                  │
//! │       ├── StoreError ────┤        "error [EMPTY_SCAN]: …"               │
//! │       └── LookupError ───┘    and exits with exit_code()                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use fieldscan_capture::{ConfigError, LookupError, ScanError, StoreError};
use fieldscan_core::{CoreError, ValidationError};
use fieldscan_db::DbError;

/// Machine-readable error category, printed with every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    ConfigError,
    DatabaseError,
    CameraError,
    EmptyScan,
    LookupFailed,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::CameraError => "CAMERA_ERROR",
            ErrorCode::EmptyScan => "EMPTY_SCAN",
            ErrorCode::LookupFailed => "LOOKUP_FAILED",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Any failure a command can report.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Output failed: {0}")]
    Output(String),
}

impl CliError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CliError::Config(_) => ErrorCode::ConfigError,
            CliError::Database(_) | CliError::Store(StoreError::Database(_)) => {
                ErrorCode::DatabaseError
            }
            CliError::Scan(ScanError::EmptyScan) => ErrorCode::EmptyScan,
            CliError::Scan(ScanError::InvalidConfig(_)) => ErrorCode::ValidationError,
            CliError::Scan(_) => ErrorCode::CameraError,
            CliError::Lookup(_) => ErrorCode::LookupFailed,
            CliError::Core(_) | CliError::Store(_) | CliError::InvalidInput(_) => {
                ErrorCode::ValidationError
            }
            CliError::Output(_) => ErrorCode::Internal,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self.code() {
            ErrorCode::ValidationError => 2,
            ErrorCode::ConfigError => 3,
            ErrorCode::DatabaseError => 4,
            ErrorCode::CameraError => 5,
            ErrorCode::EmptyScan => 6,
            ErrorCode::LookupFailed => 7,
            ErrorCode::Internal => 1,
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::Core(CoreError::from(err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Output(err.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(CliError::from(ScanError::EmptyScan).code(), ErrorCode::EmptyScan);
        assert_eq!(
            CliError::from(ScanError::CameraBusy {
                device: "rear".into()
            })
            .exit_code(),
            5
        );
        assert_eq!(
            CliError::from(StoreError::Database(DbError::PoolExhausted)).code(),
            ErrorCode::DatabaseError
        );
        assert_eq!(CliError::InvalidInput("x".into()).exit_code(), 2);
    }

    #[test]
    fn test_validation_error_is_a_validation_code() {
        let err = CliError::from(ValidationError::Required {
            field: "barcode".into(),
        });
        assert!(matches!(err, CliError::Core(CoreError::Validation(_))));
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_display_is_transparent() {
        let err = CliError::from(ScanError::EmptyScan);
        assert_eq!(err.to_string(), ScanError::EmptyScan.to_string());
        assert_eq!(err.code().as_str(), "EMPTY_SCAN");
    }
}
