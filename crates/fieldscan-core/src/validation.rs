//! # Validation Module
//!
//! Input validation for scan contexts and barcode payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Recognition engine                                           │
//! │  └── Symbology decoding, raw candidate strings                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── normalize_barcode: trim, reject empty / oversized / control chars │
//! │  └── validate_context_id: store and event ids                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Callers                                                      │
//! │  └── is_valid_gtin flags suspicious codes; storage never requires it   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fieldscan_core::validation::{is_valid_gtin, normalize_barcode};
//!
//! assert_eq!(normalize_barcode(" 4006381333931\n").unwrap(), "4006381333931");
//! assert!(is_valid_gtin("4006381333931"));
//! assert!(!is_valid_gtin("4006381333932"));
//! ```

use crate::error::ValidationError;
use crate::{MAX_BARCODE_LEN, MAX_CONTEXT_ID_LEN, STORAGE_KEY_SEPARATOR};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Context Validators
// =============================================================================

/// Validates a store or event identifier.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
/// - No `_`, which separates the ids inside the storage key
///
/// ## Returns
/// The trimmed identifier.
pub fn validate_context_id(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_CONTEXT_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_CONTEXT_ID_LEN,
        });
    }

    if value.contains(STORAGE_KEY_SEPARATOR) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must not contain '{}'", STORAGE_KEY_SEPARATOR),
        });
    }

    Ok(value.to_string())
}

// =============================================================================
// Barcode Validators
// =============================================================================

/// Normalizes a raw barcode candidate.
///
/// ## Rules
/// - Surrounding whitespace is stripped (keyboard-wedge scanners append `\n`)
/// - Must not be empty
/// - At most 128 characters
/// - No control characters
pub fn normalize_barcode(raw: &str) -> ValidationResult<String> {
    let code = raw.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if code.chars().count() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if code.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(code.to_string())
}

/// Checks a GTIN (EAN-8, UPC-A, EAN-13, GTIN-14) check digit.
///
/// ## Algorithm
/// ```text
/// 4 0 0 6 3 8 1 3 3 3 9 3 │ 1
/// ×1×3×1×3×1×3×1×3×1×3×1×3│      weights counted from the right of the body
/// sum = 89  →  (10 - 89 % 10) % 10 = 1  ✓
/// ```
///
/// Returns false for any other length or non-digit input.
pub fn is_valid_gtin(code: &str) -> bool {
    if !matches!(code.len(), 8 | 12 | 13 | 14) || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = code.bytes().map(|b| u32::from(b - b'0')).collect();
    let (body, check) = digits.split_at(digits.len() - 1);

    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();

    (10 - sum % 10) % 10 == check[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_barcode() {
        assert_eq!(normalize_barcode("  111 \r\n").unwrap(), "111");
        assert!(normalize_barcode("").is_err());
        assert!(normalize_barcode("   ").is_err());
        assert!(normalize_barcode("12\u{0}34").is_err());
        assert!(normalize_barcode(&"9".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_context_id() {
        assert_eq!(validate_context_id("store_id", " S1 ").unwrap(), "S1");
        assert!(matches!(
            validate_context_id("store_id", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_context_id("event_id", &"e".repeat(65)),
            Err(ValidationError::TooLong { max: 64, .. })
        ));
        assert!(matches!(
            validate_context_id("store_id", "S_X"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert_eq!(validate_context_id("event_id", "E-1.b").unwrap(), "E-1.b");
    }

    #[test]
    fn test_gtin_check_digits() {
        assert!(is_valid_gtin("4006381333931")); // EAN-13
        assert!(is_valid_gtin("036000291452")); // UPC-A
        assert!(is_valid_gtin("96385074")); // EAN-8

        assert!(!is_valid_gtin("4006381333932"));
        assert!(!is_valid_gtin("ABCDEFGHIJKLM"));
        assert!(!is_valid_gtin("12345"));
    }
}
