//! # Product Metadata
//!
//! Human-readable product data attached to every scan record.
//!
//! Enrichment is best effort. When a lookup fails or finds nothing, the
//! record carries [`ProductInfo::placeholder`] instead, so rendering code
//! never has to branch on missing data.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Name shown for products the lookup could not identify.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// Brand shown for products the lookup could not identify.
pub const UNKNOWN_BRAND: &str = "Unknown Brand";

/// Sentinel for absent free-text fields (ingredients, quantity, categories).
pub const NOT_AVAILABLE: &str = "Not available";

/// Sentinel for absent nutriment values.
pub const NUTRIMENT_NOT_AVAILABLE: &str = "N/A";

// =============================================================================
// Nutriments
// =============================================================================

/// The nutriment subset shown on scan cards, per 100 g.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Nutriments {
    pub energy: String,
    pub proteins: String,
    pub carbohydrates: String,
    pub fat: String,
}

impl Default for Nutriments {
    fn default() -> Self {
        Nutriments {
            energy: NUTRIMENT_NOT_AVAILABLE.to_string(),
            proteins: NUTRIMENT_NOT_AVAILABLE.to_string(),
            carbohydrates: NUTRIMENT_NOT_AVAILABLE.to_string(),
            fat: NUTRIMENT_NOT_AVAILABLE.to_string(),
        }
    }
}

// =============================================================================
// Product Info
// =============================================================================

/// Product metadata resolved for a barcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInfo {
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub image: Option<String>,
    pub ingredients: String,
    pub quantity: String,
    pub categories: String,
    #[serde(default)]
    pub nutriments: Nutriments,
}

impl ProductInfo {
    /// The fixed substitute used when enrichment fails or finds no match.
    pub fn placeholder() -> Self {
        ProductInfo {
            name: UNKNOWN_PRODUCT_NAME.to_string(),
            brand: UNKNOWN_BRAND.to_string(),
            image: None,
            ingredients: NOT_AVAILABLE.to_string(),
            quantity: NOT_AVAILABLE.to_string(),
            categories: NOT_AVAILABLE.to_string(),
            nutriments: Nutriments::default(),
        }
    }

    /// Returns true if this is exactly the placeholder record.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

impl Default for ProductInfo {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_sentinels() {
        let info = ProductInfo::placeholder();
        assert_eq!(info.name, "Unknown Product");
        assert_eq!(info.brand, "Unknown Brand");
        assert_eq!(info.image, None);
        assert_eq!(info.ingredients, "Not available");
        assert_eq!(info.nutriments.energy, "N/A");
        assert_eq!(info.nutriments.fat, "N/A");
        assert!(info.is_placeholder());
    }

    #[test]
    fn test_real_product_is_not_placeholder() {
        let info = ProductInfo {
            name: "Sparkling Water".to_string(),
            ..ProductInfo::placeholder()
        };
        assert!(!info.is_placeholder());
    }
}
