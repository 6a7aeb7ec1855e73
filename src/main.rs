//! pairdb entry point
//!
//! Parsing, configuration and the run itself live in the CLI module; main
//! only reports the error and sets the exit status.

use pairdb::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
