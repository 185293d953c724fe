//! # FieldScan Entry Point
//!
//! ```text
//! fieldscan scan --store S1 --event E1 < codes.txt
//!      │
//!      ▼
//! fieldscan_cli::execute ──► Ok(text)  ──► stdout, exit 0
//!                       └──► Err(e)    ──► stderr "error [CODE]: msg", exit e.exit_code()
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use fieldscan_cli::cli::Cli;
use fieldscan_cli::{execute, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(code = e.code().as_str(), "{}", e);
            eprintln!("error [{}]: {}", e.code().as_str(), e);
            ExitCode::from(e.exit_code())
        }
    }
}
