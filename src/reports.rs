//! Read-only joined views. A dangling reference never aborts a listing: the
//! row is kept, the missing name becomes a placeholder, and a warning is
//! logged.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::db::{self, BookFilter, RecordFilter};
use crate::error::LibraryResult;
use crate::models::{Author, Book, BorrowRecord, Borrower, RecordStatus};

pub const UNKNOWN: &str = "Unknown";
pub const NOT_FOUND: &str = "Not found";
pub const NOT_AVAILABLE: &str = "N/A";

/// The open loan behind a borrowed book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanDetails {
    pub record: BorrowRecord,
    pub borrower_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListing {
    pub book: Book,
    pub author_name: String,
    /// Present only for borrowed books whose open record could be found.
    pub loan: Option<LoanDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorListing {
    pub author: Author,
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordListing {
    pub record: BorrowRecord,
    pub book_title: String,
    pub borrower_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowerListing {
    pub borrower: Borrower,
    /// Books this borrower currently holds.
    pub holding: Vec<Book>,
}

/// One line of the book export, already rendered for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub book_id: i64,
    pub book_name: String,
    pub author_name: String,
    pub status: &'static str,
    pub borrow_date: String,
    pub return_date: String,
    pub borrower_name: String,
}

fn author_names(conn: &Connection) -> LibraryResult<HashMap<i64, String>> {
    Ok(db::fetch_authors(conn)?
        .into_iter()
        .map(|author| (author.id, author.name))
        .collect())
}

fn borrower_names(conn: &Connection) -> LibraryResult<HashMap<i64, String>> {
    Ok(db::fetch_borrowers(conn)?
        .into_iter()
        .map(|borrower| (borrower.id, borrower.name))
        .collect())
}

fn resolve_author(names: &HashMap<i64, String>, book: &Book) -> String {
    names.get(&book.author_id).cloned().unwrap_or_else(|| {
        tracing::warn!(
            book_id = book.id,
            author_id = book.author_id,
            "author not found"
        );
        UNKNOWN.to_string()
    })
}

fn resolve_borrower(names: &HashMap<i64, String>, record: &BorrowRecord) -> String {
    names.get(&record.borrower_id).cloned().unwrap_or_else(|| {
        tracing::warn!(
            record_id = record.id,
            borrower_id = record.borrower_id,
            "borrower not found"
        );
        UNKNOWN.to_string()
    })
}

/// Open records keyed by book id.
fn open_loans(conn: &Connection) -> LibraryResult<HashMap<i64, BorrowRecord>> {
    Ok(
        db::fetch_records(conn, &RecordFilter::with_status(RecordStatus::Open))?
            .into_iter()
            .map(|record| (record.book_id, record))
            .collect(),
    )
}

/// Every book with its author's name and, when borrowed, who holds it.
pub fn list_books(conn: &Connection) -> LibraryResult<Vec<BookListing>> {
    let authors = author_names(conn)?;
    let borrowers = borrower_names(conn)?;
    let mut loans = open_loans(conn)?;

    let listings = db::fetch_books(conn, &BookFilter::default())?
        .into_iter()
        .map(|book| {
            let author_name = resolve_author(&authors, &book);
            let loan = if book.is_borrowed {
                let record = loans.remove(&book.id);
                if record.is_none() {
                    tracing::warn!(book_id = book.id, "borrowed book has no open record");
                }
                record.map(|record| LoanDetails {
                    borrower_name: resolve_borrower(&borrowers, &record),
                    record,
                })
            } else {
                None
            };
            BookListing {
                book,
                author_name,
                loan,
            }
        })
        .collect();

    Ok(listings)
}

pub fn books_by_author(conn: &Connection, author_id: i64) -> LibraryResult<Vec<Book>> {
    db::fetch_books(conn, &BookFilter::by_author(author_id))
}

pub fn list_authors(conn: &Connection) -> LibraryResult<Vec<Author>> {
    db::fetch_authors(conn)
}

pub fn list_authors_and_books(conn: &Connection) -> LibraryResult<Vec<AuthorListing>> {
    let mut books_by_author: HashMap<i64, Vec<Book>> = HashMap::new();
    for book in db::fetch_books(conn, &BookFilter::default())? {
        books_by_author.entry(book.author_id).or_default().push(book);
    }

    let listings = db::fetch_authors(conn)?
        .into_iter()
        .map(|author| AuthorListing {
            books: books_by_author.remove(&author.id).unwrap_or_default(),
            author,
        })
        .collect();

    Ok(listings)
}

/// Borrow records with resolved titles and names. `None` lists all of them.
pub fn borrow_records(
    conn: &Connection,
    status: Option<RecordStatus>,
) -> LibraryResult<Vec<RecordListing>> {
    let titles: HashMap<i64, String> = db::fetch_books(conn, &BookFilter::default())?
        .into_iter()
        .map(|book| (book.id, book.title))
        .collect();
    let borrowers = borrower_names(conn)?;

    let filter = RecordFilter {
        status,
        ..RecordFilter::default()
    };
    let listings = db::fetch_records(conn, &filter)?
        .into_iter()
        .map(|record| {
            let book_title = titles.get(&record.book_id).cloned().unwrap_or_else(|| {
                tracing::warn!(
                    record_id = record.id,
                    book_id = record.book_id,
                    "book not found"
                );
                NOT_FOUND.to_string()
            });
            RecordListing {
                book_title,
                borrower_name: resolve_borrower(&borrowers, &record),
                record,
            }
        })
        .collect();

    Ok(listings)
}

/// Every borrower with the books they currently hold.
pub fn list_borrowers(conn: &Connection) -> LibraryResult<Vec<BorrowerListing>> {
    let books: HashMap<i64, Book> = db::fetch_books(conn, &BookFilter::default())?
        .into_iter()
        .map(|book| (book.id, book))
        .collect();

    let mut holdings: HashMap<i64, Vec<Book>> = HashMap::new();
    for record in db::fetch_records(conn, &RecordFilter::with_status(RecordStatus::Open))? {
        match books.get(&record.book_id) {
            Some(book) => holdings
                .entry(record.borrower_id)
                .or_default()
                .push(book.clone()),
            None => tracing::warn!(
                record_id = record.id,
                book_id = record.book_id,
                "open record points at a missing book"
            ),
        }
    }

    let listings = db::fetch_borrowers(conn)?
        .into_iter()
        .map(|borrower| BorrowerListing {
            holding: holdings.remove(&borrower.id).unwrap_or_default(),
            borrower,
        })
        .collect();

    Ok(listings)
}

/// One presentation row per book for the CSV export.
///
/// `return_date` shows the actual return date when there is one, otherwise
/// the due date given at borrow time.
pub fn export_rows(conn: &Connection) -> LibraryResult<Vec<ExportRow>> {
    let rows = list_books(conn)?
        .into_iter()
        .map(|listing| {
            let not_available = || NOT_AVAILABLE.to_string();
            let (borrow_date, return_date, borrower_name) = match (&listing.loan, listing.book.is_borrowed) {
                (Some(loan), _) => (
                    loan.record.borrow_date.to_string(),
                    loan.record
                        .return_date
                        .or(loan.record.due_date)
                        .map(|date| date.to_string())
                        .unwrap_or_else(not_available),
                    loan.borrower_name.clone(),
                ),
                (None, true) => (not_available(), not_available(), UNKNOWN.to_string()),
                (None, false) => (not_available(), not_available(), not_available()),
            };

            ExportRow {
                book_id: listing.book.id,
                book_name: listing.book.title,
                author_name: listing.author_name,
                status: if listing.book.is_borrowed {
                    "borrowed"
                } else {
                    "available"
                },
                borrow_date,
                return_date,
                borrower_name,
            }
        })
        .collect();

    Ok(rows)
}
