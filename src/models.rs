//! Domain models that mirror the SQLite schema. They stay plain data holders;
//! the rules about how they change live in `lending` and `integrity`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::error::LibraryError;

/// Textual layout used for every date the application reads or writes.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Calendar date rendered as `DD-MM-YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LibraryDate(NaiveDate);

impl LibraryDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build a date from its parts, `None` when the parts do not form a real
    /// calendar day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for LibraryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for LibraryDate {
    type Err = LibraryError;

    /// Accepts exactly two day digits, two month digits and four year digits
    /// separated by dashes. chrono alone would also take `1-2-2024`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if !has_date_shape(trimmed) {
            return Err(LibraryError::InvalidDateFormat(raw.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(Self)
            .map_err(|_| LibraryError::InvalidDateFormat(raw.to_string()))
    }
}

fn has_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            2 | 5 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

impl ToSql for LibraryDate {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for LibraryDate {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse()
            .map_err(|err: LibraryError| FromSqlError::Other(Box::new(err)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    /// Not enforced by a foreign key: bulk imports may reference authors
    /// that do not exist yet.
    pub author_id: i64,
    pub genre: String,
    /// Mirrors whether an open borrow record exists for this book.
    pub is_borrowed: bool,
}

/// Fields required to insert a book. The id is assigned by the store and
/// every new book starts out available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author_id: i64,
    pub genre: String,
}

/// Partial update for a book; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author_id: Option<i64>,
    pub genre: Option<String>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author_id.is_none() && self.genre.is_none()
    }

    /// Apply the requested changes onto a copy of `book`.
    pub fn apply_to(&self, book: &Book) -> Book {
        Book {
            id: book.id,
            title: self.title.clone().unwrap_or_else(|| book.title.clone()),
            author_id: self.author_id.unwrap_or(book.author_id),
            genre: self.genre.clone().unwrap_or_else(|| book.genre.clone()),
            is_borrowed: book.is_borrowed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Borrower {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// One loan of one book. The record is open while `return_date` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowRecord {
    pub id: i64,
    pub book_id: i64,
    pub borrower_id: i64,
    pub borrow_date: LibraryDate,
    /// Expected return date given at borrow time, if any.
    pub due_date: Option<LibraryDate>,
    pub return_date: Option<LibraryDate>,
}

impl BorrowRecord {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Open/closed selector used by record queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Open,
    Closed,
}
