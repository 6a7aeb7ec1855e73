//! CLI command implementation
//!
//! Parses arguments, builds the run configuration and runs the conversion.
//! `--help` and `--version` print and succeed; every other parse failure is
//! a usage error.

use clap::error::ErrorKind;
use clap::Parser;

use crate::ingest::{self, IngestSummary};

use super::args::Cli;
use super::errors::{CliError, CliResult};
use super::io::write_summary;

/// Entry point used by `main`
pub fn run() -> CliResult<()> {
    run_from(std::env::args_os())
}

/// Runs with an explicit argument list (first item is the program name).
pub fn run_from<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                e.print()?;
                return Ok(());
            }
            _ => return Err(CliError::usage(e.to_string())),
        },
    };

    let summary = convert(cli)?;
    write_summary(&summary)
}

/// Builds the config from parsed arguments and runs the conversion.
pub fn convert(cli: Cli) -> CliResult<IngestSummary> {
    let config = cli.into_config()?;
    Ok(ingest::run(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::errors::CliErrorCode;
    use std::ffi::OsStr;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_help_and_version_succeed() {
        assert!(run_from(["pairdb", "--help"]).is_ok());
        assert!(run_from(["pairdb", "--version"]).is_ok());
    }

    #[test]
    fn test_missing_args_is_usage_error() {
        let err = run_from(["pairdb", "root"]).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::UsageError);
    }

    #[test]
    fn test_missing_manifest_fails_run() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_str().unwrap().to_string();
        let list = temp.path().join("missing.txt").to_str().unwrap().to_string();
        let db = temp.path().join("db").to_str().unwrap().to_string();

        let err = run_from(["pairdb".to_string(), root, list, db]).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::RunFailed);
        assert!(err.message().contains("PAIRDB_MANIFEST_OPEN"));
    }

    #[test]
    fn test_empty_manifest_creates_empty_stores() {
        let temp = TempDir::new().unwrap();
        let list = temp.path().join("list.txt");
        fs::write(&list, "").unwrap();
        let db = temp.path().join("db");

        let cli = Cli::try_parse_from([
            OsStr::new("pairdb"),
            temp.path().as_os_str(),
            list.as_os_str(),
            db.as_os_str(),
        ])
        .unwrap();
        let summary = convert(cli).unwrap();

        assert_eq!(summary.records, 0);
        assert!(db.is_dir());
        assert!(temp.path().join("db_labels").is_dir());
    }
}
