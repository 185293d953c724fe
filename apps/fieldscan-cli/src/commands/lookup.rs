//! # Lookup Command
//!
//! Queries the product database for one barcode without recording anything.

use fieldscan_core::validation::normalize_barcode;

use crate::error::CliResult;
use crate::output;
use crate::state::AppState;

pub async fn run(state: &AppState, code: &str, json: bool) -> CliResult<String> {
    let code = normalize_barcode(code)?;
    let info = state.lookup.lookup(&code).await?;

    if json {
        let mut text = serde_json::to_string_pretty(&info)?;
        text.push('\n');
        Ok(text)
    } else {
        Ok(output::product(&code, &info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use fieldscan_capture::{AppConfig, DisabledLookup, LookupError, LookupResult, ProductLookup};
    use fieldscan_core::ProductInfo;
    use fieldscan_db::{Database, DbConfig};

    use crate::error::CliError;

    struct FixedLookup;

    #[async_trait]
    impl ProductLookup for FixedLookup {
        async fn lookup(&self, barcode: &str) -> LookupResult<ProductInfo> {
            let mut info = ProductInfo::placeholder();
            info.name = format!("Product {}", barcode);
            Ok(info)
        }
    }

    async fn state(lookup: Arc<dyn ProductLookup>) -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::from_parts(AppConfig::default(), db, lookup)
    }

    #[tokio::test]
    async fn test_lookup_prints_product() {
        let state = state(Arc::new(FixedLookup)).await;

        let text = run(&state, " 4006381333931 ", false).await.unwrap();
        assert!(text.starts_with("4006381333931\n"));
        assert!(text.contains("Product 4006381333931"));

        let json = run(&state, "4006381333931", true).await.unwrap();
        let info: ProductInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(info.name, "Product 4006381333931");
    }

    #[tokio::test]
    async fn test_lookup_errors_surface() {
        let state = state(Arc::new(DisabledLookup)).await;

        let err = run(&state, "111", false).await.unwrap_err();
        assert!(matches!(err, CliError::Lookup(LookupError::Disabled)));
        assert_eq!(err.exit_code(), 7);

        assert!(matches!(run(&state, "  ", false).await, Err(CliError::Core(_))));
    }
}
