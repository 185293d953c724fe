//! # Item Commands
//!
//! `list` shows the aggregate, `delete` removes selected records from one
//! store visit.

use tracing::info;

use fieldscan_core::ScannedBarcode;

use crate::error::{CliError, CliResult};
use crate::output;
use crate::state::AppState;

/// Lists recorded items newest first, optionally for a single store.
pub async fn list(state: &AppState, store: Option<&str>, json: bool) -> CliResult<String> {
    let count = match store {
        Some(store_id) => state.store.load_for_store(store_id).await?,
        None => state.store.load_all().await?,
    };
    info!(count, store = ?store, "Items loaded");

    let items = state.store.items().await;
    if json {
        let mut text = serde_json::to_string_pretty(&items)?;
        text.push('\n');
        Ok(text)
    } else {
        Ok(output::items_table(&items))
    }
}

/// Deletes the given barcodes from one store visit.
///
/// Fails without touching storage when none of the codes is recorded there.
pub async fn delete(
    state: &AppState,
    store: Option<&str>,
    event: Option<&str>,
    codes: &[String],
) -> CliResult<String> {
    let context = state.context(store, event)?;
    state.store.load_for_store(&context.store_id).await?;

    let selected: Vec<ScannedBarcode> = state
        .store
        .items()
        .await
        .into_iter()
        .filter(|item| item.belongs_to(&context))
        .filter(|item| codes.iter().any(|code| code.trim() == item.barcode))
        .collect();

    if selected.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "no recorded items match {} in {}",
            codes.join(", "),
            context
        )));
    }

    let outcome = state.store.delete_selected(&selected).await;
    Ok(output::delete(&context, &outcome))
}
