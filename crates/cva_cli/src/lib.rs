//! # cva_cli: Command Line for CVA Requests
//!
//! Library half of the `cva` binary: job file loading and command
//! implementations, kept out of `main.rs` so they can be tested.
//!
//! # Commands
//!
//! - `cva calculate --job <file>` - Run a CVA calculation on the platform
//! - `cva assemble --job <file>` - Print the request document without sending it
//! - `cva portfolio [--code <code> --template <file>]` - List portfolios or
//!   load one into a job file
//! - `cva constituents --start <date> --initial <file> --changes <file>` -
//!   Rebuild index membership history

pub mod commands;
pub mod error;
pub mod job_file;

pub use error::{CliError, Result};
pub use job_file::CvaJob;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
