//! Operation surface handed to the UI and the headless commands. Holds the
//! store connection plus the date provider and routes each named operation
//! to the lending, integrity, or reporting rules.

use rusqlite::Connection;

use crate::clock::{Clock, SystemClock};
use crate::db;
use crate::error::{Entity, LibraryError, LibraryResult};
use crate::integrity::{self, RemovedAuthor, RemovedBook};
use crate::lending::{self, BorrowRequest};
use crate::models::{
    Author, Book, BookChanges, BorrowRecord, Borrower, LibraryDate, NewBook, RecordStatus,
};
use crate::reports::{
    self, AuthorListing, BookListing, BorrowerListing, ExportRow, RecordListing,
};

pub struct Library {
    conn: Connection,
    clock: Box<dyn Clock>,
}

impl Library {
    pub fn new(conn: Connection) -> Self {
        Self::with_clock(conn, SystemClock)
    }

    pub fn with_clock(conn: Connection, clock: impl Clock + 'static) -> Self {
        Self {
            conn,
            clock: Box::new(clock),
        }
    }

    /// Direct access for read-only inspection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn today(&self) -> LibraryDate {
        self.clock.today()
    }

    fn ensure_author_exists(&self, author_id: i64) -> LibraryResult<()> {
        if db::find_author(&self.conn, author_id)?.is_none() {
            return Err(LibraryError::ReferenceIntegrityViolation {
                entity: Entity::Author,
                id: author_id,
            });
        }
        Ok(())
    }

    pub fn add_book(&mut self, book: NewBook) -> LibraryResult<Book> {
        self.ensure_author_exists(book.author_id)?;
        let book = db::create_book(&self.conn, &book)?;
        tracing::info!(book_id = book.id, title = %book.title, "book added");
        Ok(book)
    }

    pub fn book(&self, book_id: i64) -> LibraryResult<Book> {
        db::fetch_book(&self.conn, book_id)
    }

    pub fn update_book(&mut self, book_id: i64, changes: &BookChanges) -> LibraryResult<Book> {
        let current = db::fetch_book(&self.conn, book_id)?;
        if let Some(author_id) = changes.author_id {
            self.ensure_author_exists(author_id)?;
        }

        let updated = changes.apply_to(&current);
        db::update_book(&self.conn, &updated)?;
        tracing::info!(book_id, "book updated");
        Ok(updated)
    }

    pub fn remove_book(&mut self, book_id: i64) -> LibraryResult<RemovedBook> {
        integrity::remove_book(&mut self.conn, book_id)
    }

    pub fn list_books(&self) -> LibraryResult<Vec<BookListing>> {
        reports::list_books(&self.conn)
    }

    pub fn books_by_author(&self, author_id: i64) -> LibraryResult<Vec<Book>> {
        db::fetch_author(&self.conn, author_id)?;
        reports::books_by_author(&self.conn, author_id)
    }

    pub fn add_author(&mut self, name: &str) -> LibraryResult<Author> {
        let author = db::create_author(&self.conn, name)?;
        tracing::info!(author_id = author.id, name, "author added");
        Ok(author)
    }

    pub fn author(&self, author_id: i64) -> LibraryResult<Author> {
        db::fetch_author(&self.conn, author_id)
    }

    pub fn remove_author(&mut self, author_id: i64) -> LibraryResult<RemovedAuthor> {
        integrity::remove_author(&mut self.conn, author_id)
    }

    pub fn list_authors(&self) -> LibraryResult<Vec<Author>> {
        reports::list_authors(&self.conn)
    }

    pub fn list_authors_and_books(&self) -> LibraryResult<Vec<AuthorListing>> {
        reports::list_authors_and_books(&self.conn)
    }

    pub fn register_borrower(&mut self, name: &str, email: &str) -> LibraryResult<Borrower> {
        let borrower = db::create_borrower(&self.conn, name, email)?;
        tracing::info!(borrower_id = borrower.id, name, "borrower registered");
        Ok(borrower)
    }

    pub fn list_borrowers(&self) -> LibraryResult<Vec<BorrowerListing>> {
        reports::list_borrowers(&self.conn)
    }

    /// Check a book out to a borrower. `due_date` is raw user input in
    /// `DD-MM-YYYY` form; blank means no expected return date.
    pub fn borrow_book(
        &mut self,
        book_id: i64,
        borrower_id: i64,
        due_date: Option<&str>,
    ) -> LibraryResult<BorrowRecord> {
        let due_date = due_date
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(str::parse::<LibraryDate>)
            .transpose()?;

        let request = BorrowRequest {
            book_id,
            borrower_id,
            due_date,
        };
        let today = self.clock.today();
        lending::borrow_book(&mut self.conn, &request, today)
    }

    pub fn return_book(&mut self, record_id: i64) -> LibraryResult<BorrowRecord> {
        let today = self.clock.today();
        lending::return_book(&mut self.conn, record_id, None, today)
    }

    /// Return variant that also checks the record belongs to `book_id`.
    pub fn return_book_for(&mut self, book_id: i64, record_id: i64) -> LibraryResult<BorrowRecord> {
        let today = self.clock.today();
        lending::return_book(&mut self.conn, record_id, Some(book_id), today)
    }

    pub fn show_borrow_records(
        &self,
        status: Option<RecordStatus>,
    ) -> LibraryResult<Vec<RecordListing>> {
        reports::borrow_records(&self.conn, status)
    }

    /// Insert many books in one transaction. Unknown author ids are accepted
    /// and only logged, so imports can run before the authors exist.
    pub fn bulk_insert_books(&mut self, books: &[NewBook]) -> LibraryResult<Vec<Book>> {
        let tx = self.conn.transaction()?;
        let mut inserted = Vec::with_capacity(books.len());
        for book in books {
            if db::find_author(&tx, book.author_id)?.is_none() {
                tracing::warn!(
                    author_id = book.author_id,
                    title = %book.title,
                    "importing book with unknown author"
                );
            }
            inserted.push(db::create_book(&tx, book)?);
        }
        tx.commit()?;

        tracing::info!(count = inserted.len(), "books imported");
        Ok(inserted)
    }

    pub fn export_rows(&self) -> LibraryResult<Vec<ExportRow>> {
        reports::export_rows(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::open_in_memory;

    fn library() -> Library {
        let today = LibraryDate::from_ymd(2024, 11, 6).unwrap();
        Library::with_clock(open_in_memory().unwrap(), FixedClock(today))
    }

    #[test]
    fn add_book_requires_known_author() {
        let mut library = library();
        let err = library
            .add_book(NewBook {
                title: "Dune".into(),
                author_id: 8,
                genre: "Sci-Fi".into(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            LibraryError::ReferenceIntegrityViolation {
                entity: Entity::Author,
                id: 8
            }
        ));
        assert!(library.list_books().unwrap().is_empty());
    }

    #[test]
    fn update_keeps_blank_fields() {
        let mut library = library();
        let orwell = library.add_author("George Orwell").unwrap();
        let huxley = library.add_author("Aldous Huxley").unwrap();
        let book = library
            .add_book(NewBook {
                title: "Brave New World".into(),
                author_id: orwell.id,
                genre: "Dystopian".into(),
            })
            .unwrap();

        let updated = library
            .update_book(
                book.id,
                &BookChanges {
                    author_id: Some(huxley.id),
                    ..BookChanges::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Brave New World");
        assert_eq!(updated.author_id, huxley.id);
        assert_eq!(library.book(book.id).unwrap(), updated);

        let err = library
            .update_book(
                book.id,
                &BookChanges {
                    author_id: Some(99),
                    ..BookChanges::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, LibraryError::ReferenceIntegrityViolation { id: 99, .. }));
    }

    #[test]
    fn malformed_due_date_is_rejected_before_any_write() {
        let mut library = library();
        let author = library.add_author("J.R.R. Tolkien").unwrap();
        let book = library
            .add_book(NewBook {
                title: "The Hobbit".into(),
                author_id: author.id,
                genre: "Fantasy".into(),
            })
            .unwrap();
        let borrower = library.register_borrower("Alice Smith", "alice@example.com").unwrap();

        let err = library
            .borrow_book(book.id, borrower.id, Some("2024-11-20"))
            .unwrap_err();
        assert!(matches!(err, LibraryError::InvalidDateFormat(ref raw) if raw == "2024-11-20"));
        assert!(!library.book(book.id).unwrap().is_borrowed);

        let record = library.borrow_book(book.id, borrower.id, Some("  ")).unwrap();
        assert_eq!(record.due_date, None);
        assert_eq!(record.borrow_date, library.today());
    }

    #[test]
    fn bulk_insert_accepts_unknown_authors() {
        let mut library = library();
        let books = vec![
            NewBook {
                title: "Emma".into(),
                author_id: 40,
                genre: "Romance".into(),
            },
            NewBook {
                title: "Persuasion".into(),
                author_id: 40,
                genre: "Romance".into(),
            },
        ];
        let inserted = library.bulk_insert_books(&books).unwrap();
        assert_eq!(inserted.len(), 2);
        assert!(inserted.iter().all(|book| !book.is_borrowed));
        assert_eq!(library.list_books().unwrap()[0].author_name, "Unknown");
    }

    #[test]
    fn books_by_unknown_author_is_not_found() {
        let library = library();
        assert!(matches!(
            library.books_by_author(3),
            Err(LibraryError::NotFound {
                entity: Entity::Author,
                id: 3
            })
        ));
    }
}
