//! Command-line interface for pairdb
//!
//! ```text
//! pairdb [FLAGS] ROOTFOLDER LISTFILE DB_NAME
//! ```

mod args;
mod commands;
mod errors;
mod io;

pub use args::Cli;
pub use commands::{convert, run, run_from};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_summary;
