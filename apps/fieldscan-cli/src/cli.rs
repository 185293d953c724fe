//! # Command-Line Arguments
//!
//! ```text
//! fieldscan [--config PATH] [--db PATH] [-v] <COMMAND>
//!
//!   scan    --store S --event E [--single] [--max N] [--timeout-ms MS]
//!   list    [--store S] [--json]
//!   delete  --store S --event E CODE...
//!   lookup  CODE [--json]
//!   config  [--save]
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fieldscan", version, about = "Multi-scan barcode capture for store visits")]
pub struct Cli {
    /// Config file (default: platform config dir / fieldscan.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file, overrides [storage] database_path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan barcodes from stdin (keyboard-wedge scanner) and record them
    Scan(ScanArgs),

    /// List recorded items, newest first
    List {
        /// Only items captured at this store
        #[arg(long)]
        store: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete recorded items from one store visit
    Delete {
        #[arg(long)]
        store: Option<String>,

        #[arg(long)]
        event: Option<String>,

        /// Barcodes to delete
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Look a barcode up in the product database
    Lookup {
        code: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[arg(long)]
    pub store: Option<String>,

    #[arg(long)]
    pub event: Option<String>,

    /// Stop after the first code
    #[arg(long)]
    pub single: bool,

    /// Maximum distinct codes in this session
    #[arg(long)]
    pub max: Option<usize>,

    /// Stop scanning after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan() {
        let cli = Cli::try_parse_from([
            "fieldscan", "scan", "--store", "S1", "--event", "E1", "--max", "20", "--timeout-ms",
            "5000",
        ])
        .unwrap();

        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.store.as_deref(), Some("S1"));
        assert_eq!(args.max, Some(20));
        assert_eq!(args.timeout_ms, Some(5000));
        assert!(!args.single);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["fieldscan", "list", "--db", "/tmp/x.db", "-v"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_delete_requires_codes() {
        assert!(Cli::try_parse_from(["fieldscan", "delete", "--store", "S1", "--event", "E1"]).is_err());
        assert!(
            Cli::try_parse_from(["fieldscan", "delete", "--store", "S1", "--event", "E1", "111"])
                .is_ok()
        );
    }
}
