//! Borrow/return state machine. A book is `Available` while `is_borrowed` is
//! false and `Borrowed` while exactly one open record points at it; both
//! transitions write the record and the book inside one transaction.

use rusqlite::Connection;

use crate::db;
use crate::error::{Entity, LibraryError, LibraryResult};
use crate::models::{BorrowRecord, LibraryDate};

/// Inputs for checking a book out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowRequest {
    pub book_id: i64,
    pub borrower_id: i64,
    pub due_date: Option<LibraryDate>,
}

/// `Available -> Borrowed`. Opens a record dated `today` and marks the book.
pub fn borrow_book(
    conn: &mut Connection,
    request: &BorrowRequest,
    today: LibraryDate,
) -> LibraryResult<BorrowRecord> {
    let tx = conn.transaction()?;

    let book = db::fetch_book(&tx, request.book_id)?;
    if book.is_borrowed || db::find_open_record(&tx, book.id)?.is_some() {
        return Err(LibraryError::AlreadyBorrowed { book_id: book.id });
    }

    if db::find_borrower(&tx, request.borrower_id)?.is_none() {
        return Err(LibraryError::ReferenceIntegrityViolation {
            entity: Entity::Borrower,
            id: request.borrower_id,
        });
    }

    let record = db::create_record(&tx, book.id, request.borrower_id, today, request.due_date)?;
    db::set_borrowed(&tx, book.id, true)?;
    tx.commit()?;

    tracing::info!(
        book_id = book.id,
        borrower_id = request.borrower_id,
        record_id = record.id,
        "book borrowed"
    );
    Ok(record)
}

/// `Borrowed -> Available`. Closes `record_id` with `today` as return date.
///
/// When `expected_book` is given the record must belong to that book,
/// otherwise the call is rejected as an invalid record.
pub fn return_book(
    conn: &mut Connection,
    record_id: i64,
    expected_book: Option<i64>,
    today: LibraryDate,
) -> LibraryResult<BorrowRecord> {
    let invalid = LibraryError::InvalidRecord { record_id };
    let tx = conn.transaction()?;

    let Some(mut record) = db::find_record(&tx, record_id)? else {
        return Err(invalid);
    };
    if !record.is_open() || expected_book.is_some_and(|book_id| book_id != record.book_id) {
        return Err(invalid);
    }
    if db::find_book(&tx, record.book_id)?.is_none() {
        return Err(invalid);
    }

    if !db::close_record(&tx, record.id, today)? {
        return Err(invalid);
    }
    db::set_borrowed(&tx, record.book_id, false)?;
    tx.commit()?;

    record.return_date = Some(today);
    tracing::info!(
        book_id = record.book_id,
        record_id = record.id,
        "book returned"
    );
    Ok(record)
}
