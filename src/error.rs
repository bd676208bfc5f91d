//! Typed failures returned by every core operation. The UI and the headless
//! commands match on these to decide between a status-line message and a
//! fatal exit.

use std::fmt;

use thiserror::Error;

/// Record shapes known to the store. Used to name the offending entity in
/// error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Book,
    Author,
    Borrower,
    BorrowRecord,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Book => "Book",
            Entity::Author => "Author",
            Entity::Borrower => "Borrower",
            Entity::BorrowRecord => "Borrow record",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{entity} with ID {id} not found.")]
    NotFound { entity: Entity, id: i64 },
    #[error("Book {book_id} is already borrowed.")]
    AlreadyBorrowed { book_id: i64 },
    #[error("Borrow record {record_id} is missing or already closed.")]
    InvalidRecord { record_id: i64 },
    #[error(
        "Author {author_id} still has borrowed books ({}).",
        join_ids(.book_ids)
    )]
    HasBorrowedBooks { author_id: i64, book_ids: Vec<i64> },
    #[error("Invalid date `{0}`. Please use the DD-MM-YYYY format.")]
    InvalidDateFormat(String),
    #[error("{entity} with ID {id} does not exist.")]
    ReferenceIntegrityViolation { entity: Entity, id: i64 },
    #[error("database operation failed")]
    Store(#[from] rusqlite::Error),
}

impl LibraryError {
    /// Store failures cannot be recovered from inside a session; everything
    /// else leaves the database untouched and the caller may carry on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LibraryError::Store(_))
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
