//! # pgdict entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Initialize logging (console + rolling files)
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Create a single-threaded Tokio runtime
//!   └─> Load config, extract over the tunnel, write the document
//! ```
//!
//! Any error ends the process with a non-zero status and the error chain
//! printed.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stderr)]

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    if let Err(e) = pgdict::logging::init() {
        eprintln!("File logging unavailable ({e:#}), logging to console only");
        pgdict::logging::init_console_only()?;
    }

    let cli = cli::Cli::parse();

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(cli::run(cli));

    if let Err(e) = &result {
        tracing::error!("{e:#}");
    }
    result
}
