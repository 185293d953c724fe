//! # FieldScan CLI Library
//!
//! Everything behind the `fieldscan` binary, kept in a library so commands
//! can be driven from tests with an in-memory database and a channel engine.
//!
//! ## Module Organization
//! ```text
//! fieldscan_cli/
//! ├── lib.rs          ◄─── You are here (tracing setup & dispatch)
//! ├── cli.rs          ◄─── clap argument definitions
//! ├── state/
//! │   └── mod.rs      ◄─── AppState (config, database, item store)
//! ├── commands/
//! │   ├── scan.rs     ◄─── Scan session → commit batch
//! │   ├── items.rs    ◄─── list / delete
//! │   ├── lookup.rs   ◄─── Product lookup
//! │   └── config.rs   ◄─── Effective configuration
//! ├── output.rs       ◄─── Text rendering
//! └── error.rs        ◄─── CliError and exit codes
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                              │
//! │  2. Initialize tracing (stderr, RUST_LOG or -v)                         │
//! │  3. Load AppConfig: defaults → fieldscan.toml → FIELDSCAN_* → --db      │
//! │  4. Open database & run migrations (skipped for `config`)               │
//! │  5. Dispatch the subcommand, print its output to stdout                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod state;

use std::sync::Arc;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use fieldscan_capture::{AppConfig, DetectionEngine, LineReaderEngine};

use cli::{Cli, Commands};
use error::CliResult;
use state::AppState;

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so command output on stdout stays pipeable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `-v` - Debug for fieldscan crates when `RUST_LOG` is unset
/// - Default: WARN, with INFO for fieldscan crates
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Filter used when `RUST_LOG` is unset.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "info,fieldscan=debug,sqlx=warn"
    } else {
        "warn,fieldscan=info"
    }
}

/// Loads the configuration for this invocation.
pub fn load_config(cli: &Cli) -> CliResult<AppConfig> {
    let mut config = AppConfig::load(cli.config.clone())?;
    if let Some(db) = &cli.db {
        config.storage.database_path = Some(db.clone());
    }
    debug!(?config, "Effective configuration");
    Ok(config)
}

/// Runs one invocation and returns what to print on stdout.
pub async fn execute(cli: Cli) -> CliResult<String> {
    let config = load_config(&cli)?;

    if let Commands::Config { save } = cli.command {
        return commands::config::run(&config, cli.config.clone(), save);
    }

    let state = AppState::init(config).await?;

    let output = match &cli.command {
        Commands::Scan(args) => {
            let engine: Arc<dyn DetectionEngine> = Arc::new(LineReaderEngine::stdin());
            commands::scan::run(&state, args, engine).await
        }
        Commands::List { store, json } => {
            commands::items::list(&state, store.as_deref(), *json).await
        }
        Commands::Delete { store, event, codes } => {
            commands::items::delete(&state, store.as_deref(), event.as_deref(), codes).await
        }
        Commands::Lookup { code, json } => commands::lookup::run(&state, code, *json).await,
        Commands::Config { save } => commands::config::run(&state.config, cli.config.clone(), *save),
    };

    state.db.close().await;
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tracing::Level;
    use uuid::Uuid;

    fn enabled_under(verbose: bool, check: impl FnOnce() -> bool) -> bool {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(default_directives(verbose)))
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::with_default(subscriber, check)
    }

    #[test]
    fn test_default_filter_quiets_debug() {
        assert!(!enabled_under(false, || tracing::enabled!(target: "sqlx::query", Level::DEBUG)));
        assert!(!enabled_under(false, || {
            tracing::enabled!(target: "fieldscan_capture::store", Level::DEBUG)
        }));
        assert!(enabled_under(false, || {
            tracing::enabled!(target: "fieldscan_capture::store", Level::INFO)
        }));
    }

    #[test]
    fn test_verbose_filter_enables_fieldscan_debug() {
        assert!(enabled_under(true, || {
            tracing::enabled!(target: "fieldscan_capture::store", Level::DEBUG)
        }));
        assert!(!enabled_under(true, || tracing::enabled!(target: "sqlx::query", Level::DEBUG)));
    }

    #[tokio::test]
    async fn test_execute_list_against_file_db() {
        let dir = std::env::temp_dir().join(format!("fieldscan-exec-{}", Uuid::new_v4()));
        let config = dir.join("missing.toml");
        let db = dir.join("data").join("fieldscan.db");

        let cli = Cli::try_parse_from([
            "fieldscan",
            "--config",
            config.to_str().unwrap(),
            "--db",
            db.to_str().unwrap(),
            "list",
        ])
        .unwrap();

        let out = execute(cli).await.unwrap();
        assert_eq!(out, "No scanned items\n");
        assert!(db.exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_execute_config_does_not_open_db() {
        let dir = std::env::temp_dir().join(format!("fieldscan-exec-{}", Uuid::new_v4()));
        let db = dir.join("never.db");

        let cli = Cli::try_parse_from([
            "fieldscan",
            "--config",
            dir.join("missing.toml").to_str().unwrap(),
            "--db",
            db.to_str().unwrap(),
            "config",
        ])
        .unwrap();

        let out = execute(cli).await.unwrap();
        assert!(out.contains("never.db"));
        assert!(!db.exists());
    }
}
