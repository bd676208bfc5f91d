//! Deletion rules. Removing a book takes its borrow history with it; removing
//! an author takes every book and record under it, but only when none of
//! those books is checked out.

use rusqlite::Connection;

use crate::db::{self, BookFilter};
use crate::error::{LibraryError, LibraryResult};
use crate::models::{Author, Book};

/// What a successful book removal deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedBook {
    pub book: Book,
    pub records_removed: usize,
}

/// What a successful author removal deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedAuthor {
    pub author: Author,
    pub books_removed: Vec<Book>,
    pub records_removed: usize,
}

/// Delete a book and every borrow record that references it.
///
/// A borrowed book is deleted too; its open record goes with it so no book
/// is left flagged without a record.
pub fn remove_book(conn: &mut Connection, book_id: i64) -> LibraryResult<RemovedBook> {
    let tx = conn.transaction()?;

    let book = db::fetch_book(&tx, book_id)?;
    if book.is_borrowed {
        tracing::warn!(book_id, "removing a book that is currently borrowed");
    }

    let records_removed = db::delete_records_for_book(&tx, book.id)?;
    db::delete_book(&tx, book.id)?;
    tx.commit()?;

    tracing::info!(book_id, records_removed, "book removed");
    Ok(RemovedBook {
        book,
        records_removed,
    })
}

/// Delete an author with all of their books and those books' records.
///
/// Fails with [`LibraryError::HasBorrowedBooks`] before touching anything if
/// any of the author's books is checked out.
pub fn remove_author(conn: &mut Connection, author_id: i64) -> LibraryResult<RemovedAuthor> {
    let tx = conn.transaction()?;

    let author = db::fetch_author(&tx, author_id)?;
    let books = db::fetch_books(&tx, &BookFilter::by_author(author.id))?;

    let borrowed: Vec<i64> = books
        .iter()
        .filter(|book| book.is_borrowed)
        .map(|book| book.id)
        .collect();
    if !borrowed.is_empty() {
        return Err(LibraryError::HasBorrowedBooks {
            author_id,
            book_ids: borrowed,
        });
    }

    let mut records_removed = 0;
    for book in &books {
        records_removed += db::delete_records_for_book(&tx, book.id)?;
        db::delete_book(&tx, book.id)?;
    }
    db::delete_author(&tx, author.id)?;
    tx.commit()?;

    tracing::info!(
        author_id,
        books_removed = books.len(),
        records_removed,
        "author removed"
    );
    Ok(RemovedAuthor {
        author,
        books_removed: books,
        records_removed,
    })
}
