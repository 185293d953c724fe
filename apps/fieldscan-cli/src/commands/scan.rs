//! # Scan Command
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fieldscan scan --store S1 --event E1                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ScanController::start ── CameraBusy / Initialization ──► exit 5        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session.run()  ◄── stdin lines, Ctrl-C → Cancelled                     │
//! │       │                                                                 │
//! │       ├── Cancelled ──► session.cancel(), nothing recorded              │
//! │       ▼                                                                 │
//! │  session.complete() ── EmptyScan ──► exit 6                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store.load_all() → store.commit_batch(codes, S1/E1)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use fieldscan_capture::{
    CameraDevice, DetectionEngine, ScanController, ScanEventEmitter, StopReason,
};
use fieldscan_core::ScanConfig;

use crate::cli::ScanArgs;
use crate::error::CliResult;
use crate::output;
use crate::state::AppState;

/// Prints each new code and the running count to stderr.
struct ConsoleEmitter;

impl ScanEventEmitter for ConsoleEmitter {
    fn emit_detected(&self, _session_id: Uuid, code: &str, count: usize) {
        eprintln!("  [{:>3}] {}", count, code);
    }

    fn emit_stopped(&self, _session_id: Uuid, reason: StopReason, count: usize) {
        eprintln!("  scanning stopped ({}), {} code(s)", reason, count);
    }
}

/// Applies command-line overrides to the configured session settings.
pub fn scan_config(base: ScanConfig, args: &ScanArgs) -> ScanConfig {
    let mut config = base;
    if args.single {
        config.enable_multi_scan = false;
    }
    if let Some(max) = args.max {
        config.max_multi_scan_count = max;
    }
    if let Some(ms) = args.timeout_ms {
        config.multi_scan_timeout_ms = ms;
    }
    config
}

pub async fn run(
    state: &AppState,
    args: &ScanArgs,
    engine: Arc<dyn DetectionEngine>,
) -> CliResult<String> {
    let context = state.context(args.store.as_deref(), args.event.as_deref())?;
    let config = scan_config(state.config.scan_config(), args);

    let controller = ScanController::with_emitter(
        CameraDevice::new(state.config.scanner.camera.as_str()),
        engine,
        Arc::new(ConsoleEmitter),
    );

    let mut session = controller.start(config).await?;
    eprintln!("Scanning for {}. One code per line; Ctrl-D to finish, Ctrl-C to cancel.", context);

    let handle = session.handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let stopped = session.run().await;
    ctrl_c.abort();

    if stopped? == StopReason::Cancelled {
        session.cancel();
        return Ok("Scan cancelled, nothing recorded\n".to_string());
    }

    let codes = session.complete()?;
    info!(context = %context, count = codes.len(), "Committing scan batch");

    state.store.load_all().await?;
    let outcome = state.store.commit_batch(&codes, &context).await;

    Ok(output::commit(&context, &outcome))
}
