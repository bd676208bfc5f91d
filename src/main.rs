//! Binary entry point: parse the command line, open the SQLite store, then
//! either run a headless command or drive the Ratatui event loop until the
//! user exits.
use anyhow::Result;
use clap::Parser;

use library_manager::config::{Cli, Command, Settings};
use library_manager::db::open_database;
use library_manager::seed::seed_demo_data;
use library_manager::transfer::{export_books, import_books};
use library_manager::{run_app, telemetry, App, Library};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli)?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            telemetry::init_file(&settings.log_path)?;
            let library = Library::new(open_database(&settings.db_path)?);
            let mut app = App::new(library, &settings);
            run_app(&mut app)
        }
        Command::Import { file } => {
            telemetry::init_stderr();
            let mut library = Library::new(open_database(&settings.db_path)?);
            let inserted = import_books(&mut library, &file)?;
            println!("Imported {} book(s) from {}.", inserted.len(), file.display());
            Ok(())
        }
        Command::Export { file } => {
            telemetry::init_stderr();
            let library = Library::new(open_database(&settings.db_path)?);
            let count = export_books(&library, &file)?;
            println!("Exported {count} book(s) to {}.", file.display());
            Ok(())
        }
        Command::Seed => {
            telemetry::init_stderr();
            let mut library = Library::new(open_database(&settings.db_path)?);
            if seed_demo_data(&mut library)? {
                println!("Demo data added to {}.", settings.db_path.display());
            } else {
                println!("Database already has authors; nothing seeded.");
            }
            Ok(())
        }
    }
}
