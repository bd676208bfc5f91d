//! Persistence module split across one submodule per table. Every function
//! takes a plain `&Connection`, so the same helpers run directly or inside a
//! `Transaction` (which derefs to `Connection`).

mod authors;
mod books;
mod borrowers;
mod connection;
mod records;

pub use authors::{count_authors, create_author, delete_author, fetch_author, fetch_authors, find_author};
pub use books::{
    create_book, delete_book, fetch_book, fetch_books, find_book, set_borrowed, update_book,
    BookFilter,
};
pub use borrowers::{create_borrower, fetch_borrower, fetch_borrowers, find_borrower};
pub use connection::{default_db_path, ensure_schema, open_database, open_in_memory};
pub use records::{
    close_record, create_closed_record, create_record, delete_records_for_book, fetch_record,
    fetch_records, find_open_record, find_record, RecordFilter,
};
