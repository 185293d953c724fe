//! # Product Lookup
//!
//! Best-effort product metadata for a barcode.
//!
//! ## Fallback Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductLookup::lookup(barcode) -> Result<ProductInfo, LookupError>     │
//! │                                                                         │
//! │     Ok(info) ─────────────────────────────────────────► info            │
//! │     Err(Disabled | InvalidBarcode | Http | Status |                     │
//! │         NotFound | Malformed) ──── warn! ─────────────► Placeholder     │
//! │                                                                         │
//! │  enrich() is the only place the mapping happens. One attempt per        │
//! │  barcode, no retry.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! `GET {base_url}/api/v0/product/{barcode}.json` on an Open Food
//! Facts-compatible service:
//! ```json
//! { "status": 1,
//!   "product": { "product_name": "…", "brands": "…", "image_url": "…",
//!                "ingredients_text": "…", "quantity": "…", "categories": "…",
//!                "nutriments": { "energy-kcal_100g": 52, "proteins_100g": 0.3,
//!                                "carbohydrates_100g": 14, "fat_100g": 0.2 } } }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use fieldscan_core::product::{
    NOT_AVAILABLE, NUTRIMENT_NOT_AVAILABLE, UNKNOWN_BRAND, UNKNOWN_PRODUCT_NAME,
};
use fieldscan_core::validation::normalize_barcode;
use fieldscan_core::{Nutriments, ProductInfo};

use crate::config::EnrichmentSettings;
use crate::error::{LookupError, LookupResult};

/// Public Open Food Facts instance.
pub const DEFAULT_LOOKUP_URL: &str = "https://world.openfoodfacts.org";

/// A source of product metadata.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn lookup(&self, barcode: &str) -> LookupResult<ProductInfo>;
}

/// Looks `barcode` up and falls back to the placeholder on any failure.
pub async fn enrich(lookup: &dyn ProductLookup, barcode: &str) -> ProductInfo {
    lookup.lookup(barcode).await.unwrap_or_else(|e| {
        match e {
            LookupError::Disabled => debug!(barcode = %barcode, "Lookup disabled, using placeholder"),
            e => warn!(barcode = %barcode, error = %e, "Product lookup failed, using placeholder"),
        }
        ProductInfo::placeholder()
    })
}

/// Builds the lookup described by `settings`.
pub fn build_lookup(settings: &EnrichmentSettings) -> LookupResult<Arc<dyn ProductLookup>> {
    if !settings.enabled {
        return Ok(Arc::new(DisabledLookup));
    }

    let client = OpenFoodFactsClient::new(
        &settings.base_url,
        Duration::from_secs(settings.timeout_secs),
    )?;
    Ok(Arc::new(client))
}

// =============================================================================
// Disabled Lookup
// =============================================================================

/// Lookup that never reaches the network.
pub struct DisabledLookup;

#[async_trait]
impl ProductLookup for DisabledLookup {
    async fn lookup(&self, _barcode: &str) -> LookupResult<ProductInfo> {
        Err(LookupError::Disabled)
    }
}

// =============================================================================
// Open Food Facts Client
// =============================================================================

/// HTTP client for an Open Food Facts-compatible product database.
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl OpenFoodFactsClient {
    /// Creates a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> LookupResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fieldscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LookupError::Client(e.to_string()))?;

        Ok(OpenFoodFactsClient { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the product document for `barcode`.
    ///
    /// Only ASCII letters and digits are accepted so the code cannot escape
    /// its path segment.
    pub fn product_url(&self, barcode: &str) -> LookupResult<Url> {
        let code =
            normalize_barcode(barcode).map_err(|_| LookupError::InvalidBarcode(barcode.to_string()))?;

        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LookupError::InvalidBarcode(code));
        }

        Ok(self.base_url.join(&format!("api/v0/product/{}.json", code))?)
    }
}

#[async_trait]
impl ProductLookup for OpenFoodFactsClient {
    async fn lookup(&self, barcode: &str) -> LookupResult<ProductInfo> {
        let url = self.product_url(barcode)?;
        debug!(barcode = %barcode, url = %url, "Looking up product");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Http(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(barcode.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: LookupResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                LookupError::Malformed(e.to_string())
            } else {
                LookupError::Http(e.to_string())
            }
        })?;

        body.into_product_info(barcode)
    }
}

// =============================================================================
// Response Normalization
// =============================================================================

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    product: Option<RawProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProduct {
    #[serde(default)]
    product_name: Option<Value>,
    #[serde(default)]
    brands: Option<Value>,
    #[serde(default)]
    image_url: Option<Value>,
    #[serde(default)]
    ingredients_text: Option<Value>,
    #[serde(default)]
    quantity: Option<Value>,
    #[serde(default)]
    categories: Option<Value>,
    #[serde(default)]
    nutriments: HashMap<String, Value>,
}

impl LookupResponse {
    fn into_product_info(self, barcode: &str) -> LookupResult<ProductInfo> {
        let found = self
            .status
            .as_ref()
            .and_then(|status| match status {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            == Some(1);

        match self.product {
            Some(product) if found => Ok(product.normalize()),
            _ => Err(LookupError::NotFound(barcode.to_string())),
        }
    }
}

impl RawProduct {
    fn normalize(self) -> ProductInfo {
        let nutriment = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| text(self.nutriments.get(*key)))
                .unwrap_or_else(|| NUTRIMENT_NOT_AVAILABLE.to_string())
        };

        let nutriments = Nutriments {
            energy: nutriment(&["energy-kcal_100g", "energy_100g"]),
            proteins: nutriment(&["proteins_100g"]),
            carbohydrates: nutriment(&["carbohydrates_100g"]),
            fat: nutriment(&["fat_100g"]),
        };

        ProductInfo {
            name: text(self.product_name.as_ref()).unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
            brand: text(self.brands.as_ref()).unwrap_or_else(|| UNKNOWN_BRAND.to_string()),
            image: text(self.image_url.as_ref()),
            ingredients: text(self.ingredients_text.as_ref())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            quantity: text(self.quantity.as_ref()).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            categories: text(self.categories.as_ref()).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            nutriments,
        }
    }
}

/// Non-empty text or number, as a string.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn parse(json: &str) -> LookupResult<ProductInfo> {
        serde_json::from_str::<LookupResponse>(json)
            .unwrap()
            .into_product_info("123")
    }

    #[test]
    fn test_normalizes_full_product() {
        let info = parse(
            r#"{
                "status": 1,
                "product": {
                    "product_name": "Apple Juice",
                    "brands": "Orchard",
                    "image_url": "https://img.example/1.jpg",
                    "ingredients_text": "apples",
                    "quantity": "1 l",
                    "categories": "Beverages",
                    "nutriments": {
                        "energy-kcal_100g": 46,
                        "energy_100g": 192,
                        "proteins_100g": 0.1,
                        "carbohydrates_100g": "11.2",
                        "fat_100g": 0
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(info.name, "Apple Juice");
        assert_eq!(info.brand, "Orchard");
        assert_eq!(info.image.as_deref(), Some("https://img.example/1.jpg"));
        assert_eq!(info.nutriments.energy, "46");
        assert_eq!(info.nutriments.proteins, "0.1");
        assert_eq!(info.nutriments.carbohydrates, "11.2");
        assert_eq!(info.nutriments.fat, "0");
        assert!(!info.is_placeholder());
    }

    #[test]
    fn test_missing_fields_get_sentinels() {
        let info = parse(r#"{"status": 1, "product": {"product_name": "  "}}"#).unwrap();

        assert_eq!(info.name, UNKNOWN_PRODUCT_NAME);
        assert_eq!(info.brand, UNKNOWN_BRAND);
        assert_eq!(info.image, None);
        assert_eq!(info.ingredients, NOT_AVAILABLE);
        assert_eq!(info.nutriments, Nutriments::default());
    }

    #[test]
    fn test_status_zero_is_not_found() {
        let err = parse(r#"{"status": 0, "status_verbose": "product not found"}"#).unwrap_err();
        assert!(matches!(err, LookupError::NotFound(_)));
    }

    #[test]
    fn test_product_url() {
        let client =
            OpenFoodFactsClient::new("https://food.example/mirror", Duration::from_secs(1)).unwrap();

        assert_eq!(
            client.product_url(" 4006381333931 ").unwrap().as_str(),
            "https://food.example/mirror/api/v0/product/4006381333931.json"
        );
        assert!(matches!(
            client.product_url("../admin"),
            Err(LookupError::InvalidBarcode(_))
        ));
        assert!(matches!(client.product_url(""), Err(LookupError::InvalidBarcode(_))));
    }

    #[tokio::test]
    async fn test_enrich_falls_back_to_placeholder() {
        assert!(enrich(&DisabledLookup, "123").await.is_placeholder());

        let unreachable =
            OpenFoodFactsClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(enrich(&unreachable, "123").await.is_placeholder());
    }

    /// Serves one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_lookup_over_http() {
        let base = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"status":1,"product":{"product_name":"Cola","brands":"Fizz"}}"#,
        )
        .await;
        let client = OpenFoodFactsClient::new(&base, Duration::from_secs(5)).unwrap();

        let info = client.lookup("5449000000996").await.unwrap();
        assert_eq!(info.name, "Cola");
        assert_eq!(info.brand, "Fizz");
    }

    #[tokio::test]
    async fn test_lookup_maps_http_failures() {
        let base = serve_once("HTTP/1.1 503 Service Unavailable", "").await;
        let client = OpenFoodFactsClient::new(&base, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.lookup("123").await,
            Err(LookupError::Status(503))
        ));

        let base = serve_once("HTTP/1.1 200 OK", "<html>").await;
        let client = OpenFoodFactsClient::new(&base, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.lookup("123").await,
            Err(LookupError::Malformed(_))
        ));
    }
}
