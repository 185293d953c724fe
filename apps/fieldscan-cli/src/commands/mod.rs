//! # Commands Module
//!
//! One function per subcommand. Each returns the text to print on stdout;
//! progress and logs go to stderr.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── scan.rs     ◄─── Scan session → commit batch
//! ├── items.rs    ◄─── List and delete recorded items
//! ├── lookup.rs   ◄─── Product lookup for one code
//! └── config.rs   ◄─── Effective configuration
//! ```

pub mod config;
pub mod items;
pub mod lookup;
pub mod scan;
