//! Command line and environment configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::db::default_db_path;

const LOG_FILE_NAME: &str = "library.log";
const DEFAULT_IMPORT_FILE: &str = "books.csv";
const DEFAULT_EXPORT_FILE: &str = "export_books.csv";

#[derive(Debug, Parser)]
#[command(name = "library-manager", version, about = "Books, authors, borrowers and loans")]
pub struct Cli {
    /// SQLite database file. Defaults to ~/.library-manager/library.sqlite.
    #[arg(long, env = "LIBRARY_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Log file used by the interactive UI. Defaults to a file beside the
    /// database.
    #[arg(long, env = "LIBRARY_LOG", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Open the interactive menu (default).
    Tui,
    /// Insert books from a header-less `title,author_id,genre` CSV file.
    Import { file: PathBuf },
    /// Write every book with its loan status to a CSV file.
    Export { file: PathBuf },
    /// Fill an empty database with demo authors, books and borrowers.
    Seed,
}

/// Resolved paths the application runs with.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub import_path: PathBuf,
    pub export_path: PathBuf,
}

impl Settings {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let db_path = match &cli.db {
            Some(path) => path.clone(),
            None => default_db_path()?,
        };
        let log_path = cli
            .log_file
            .clone()
            .unwrap_or_else(|| db_path.with_file_name(LOG_FILE_NAME));

        Ok(Self {
            db_path,
            log_path,
            import_path: PathBuf::from(DEFAULT_IMPORT_FILE),
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_defaults_next_to_database() {
        let cli = Cli::parse_from(["library-manager", "--db", "/tmp/lib/catalogue.sqlite", "seed"]);
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.log_path, PathBuf::from("/tmp/lib/library.log"));
        assert!(matches!(cli.command, Some(Command::Seed)));
    }

    #[test]
    fn parses_export_target() {
        let cli = Cli::parse_from(["library-manager", "export", "out.csv", "--log-file", "run.log"]);
        assert!(matches!(cli.command, Some(Command::Export { ref file }) if file == &PathBuf::from("out.csv")));
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
