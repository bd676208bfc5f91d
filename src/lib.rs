//! Library management core: books, authors, borrowers and borrow records in
//! an embedded SQLite store, the lending and deletion rules that keep them
//! consistent, and the terminal UI that drives them.
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod integrity;
pub mod lending;
pub mod library;
pub mod models;
pub mod reports;
pub mod seed;
pub mod telemetry;
pub mod transfer;
pub mod ui;

pub use error::{Entity, LibraryError, LibraryResult};
pub use library::Library;
pub use models::{Author, Book, BookChanges, BorrowRecord, Borrower, LibraryDate, NewBook};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
