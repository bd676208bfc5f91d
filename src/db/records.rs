use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::{Entity, LibraryError, LibraryResult};
use crate::models::{BorrowRecord, LibraryDate, RecordStatus};

const RECORD_COLUMNS: &str = "id, book_id, borrower_id, borrow_date, due_date, return_date";

/// Equality filters for borrow record queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter {
    pub book_id: Option<i64>,
    pub borrower_id: Option<i64>,
    pub status: Option<RecordStatus>,
}

impl RecordFilter {
    pub fn by_book(book_id: i64) -> Self {
        Self {
            book_id: Some(book_id),
            ..Self::default()
        }
    }

    pub fn with_status(status: RecordStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(book_id) = self.book_id {
            values.push(Value::Integer(book_id));
            conditions.push(format!("book_id = ?{}", values.len()));
        }
        if let Some(borrower_id) = self.borrower_id {
            values.push(Value::Integer(borrower_id));
            conditions.push(format!("borrower_id = ?{}", values.len()));
        }
        match self.status {
            Some(RecordStatus::Open) => conditions.push("return_date IS NULL".to_string()),
            Some(RecordStatus::Closed) => conditions.push("return_date IS NOT NULL".to_string()),
            None => {}
        }

        if conditions.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), values)
        }
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<BorrowRecord> {
    Ok(BorrowRecord {
        id: row.get(0)?,
        book_id: row.get(1)?,
        borrower_id: row.get(2)?,
        borrow_date: row.get(3)?,
        due_date: row.get(4)?,
        return_date: row.get(5)?,
    })
}

/// Insert an open record. Callers are expected to flip the book's borrowed
/// flag inside the same transaction.
pub fn create_record(
    conn: &Connection,
    book_id: i64,
    borrower_id: i64,
    borrow_date: LibraryDate,
    due_date: Option<LibraryDate>,
) -> LibraryResult<BorrowRecord> {
    conn.execute(
        "INSERT INTO borrow_records (book_id, borrower_id, borrow_date, due_date, return_date)
         VALUES (?1, ?2, ?3, ?4, NULL)",
        params![book_id, borrower_id, borrow_date, due_date],
    )?;

    Ok(BorrowRecord {
        id: conn.last_insert_rowid(),
        book_id,
        borrower_id,
        borrow_date,
        due_date,
        return_date: None,
    })
}

/// Insert a record that is already closed. Only used for seeding history.
pub fn create_closed_record(
    conn: &Connection,
    book_id: i64,
    borrower_id: i64,
    borrow_date: LibraryDate,
    return_date: LibraryDate,
) -> LibraryResult<BorrowRecord> {
    conn.execute(
        "INSERT INTO borrow_records (book_id, borrower_id, borrow_date, due_date, return_date)
         VALUES (?1, ?2, ?3, NULL, ?4)",
        params![book_id, borrower_id, borrow_date, return_date],
    )?;

    Ok(BorrowRecord {
        id: conn.last_insert_rowid(),
        book_id,
        borrower_id,
        borrow_date,
        due_date: None,
        return_date: Some(return_date),
    })
}

pub fn find_record(conn: &Connection, id: i64) -> LibraryResult<Option<BorrowRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM borrow_records WHERE id = ?1"),
            params![id],
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

pub fn fetch_record(conn: &Connection, id: i64) -> LibraryResult<BorrowRecord> {
    find_record(conn, id)?.ok_or(LibraryError::NotFound {
        entity: Entity::BorrowRecord,
        id,
    })
}

/// The open record for a book, if it is checked out.
pub fn find_open_record(conn: &Connection, book_id: i64) -> LibraryResult<Option<BorrowRecord>> {
    let record = conn
        .query_row(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM borrow_records
                 WHERE book_id = ?1 AND return_date IS NULL"
            ),
            params![book_id],
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

pub fn fetch_records(conn: &Connection, filter: &RecordFilter) -> LibraryResult<Vec<BorrowRecord>> {
    let (where_clause, values) = filter.where_clause();
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM borrow_records {where_clause} ORDER BY id"
    ))?;

    let records = stmt
        .query_map(params_from_iter(values.iter()), record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Stamp the return date on an open record. Returns `false` when the record
/// is missing or was already closed, leaving the row untouched.
pub fn close_record(conn: &Connection, id: i64, return_date: LibraryDate) -> LibraryResult<bool> {
    let updated = conn.execute(
        "UPDATE borrow_records SET return_date = ?1 WHERE id = ?2 AND return_date IS NULL",
        params![return_date, id],
    )?;
    Ok(updated == 1)
}

/// Remove every record, open or closed, that points at `book_id`.
pub fn delete_records_for_book(conn: &Connection, book_id: i64) -> LibraryResult<usize> {
    let deleted = conn.execute(
        "DELETE FROM borrow_records WHERE book_id = ?1",
        params![book_id],
    )?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_book, create_borrower, open_in_memory};
    use crate::models::NewBook;

    fn date(raw: &str) -> LibraryDate {
        raw.parse().unwrap()
    }

    fn setup() -> (Connection, i64, i64) {
        let conn = open_in_memory().unwrap();
        let book = create_book(
            &conn,
            &NewBook {
                title: "1984".into(),
                author_id: 1,
                genre: "Dystopian".into(),
            },
        )
        .unwrap();
        let borrower = create_borrower(&conn, "Bob Johnson", "bob@example.com").unwrap();
        (conn, book.id, borrower.id)
    }

    #[test]
    fn closing_twice_only_succeeds_once() {
        let (conn, book_id, borrower_id) = setup();
        let record = create_record(&conn, book_id, borrower_id, date("05-11-2024"), None).unwrap();

        assert!(close_record(&conn, record.id, date("15-11-2024")).unwrap());
        assert!(!close_record(&conn, record.id, date("16-11-2024")).unwrap());

        let stored = fetch_record(&conn, record.id).unwrap();
        assert_eq!(stored.return_date, Some(date("15-11-2024")));
        assert_eq!(stored.borrow_date, date("05-11-2024"));
    }

    #[test]
    fn second_open_record_for_a_book_is_rejected() {
        let (conn, book_id, borrower_id) = setup();
        create_record(&conn, book_id, borrower_id, date("05-11-2024"), None).unwrap();

        let err = create_record(&conn, book_id, borrower_id, date("06-11-2024"), None).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(fetch_records(&conn, &RecordFilter::by_book(book_id)).unwrap().len(), 1);
    }

    #[test]
    fn status_filter_splits_open_and_closed() {
        let (conn, book_id, borrower_id) = setup();
        let closed =
            create_closed_record(&conn, book_id, borrower_id, date("01-11-2024"), date("10-11-2024"))
                .unwrap();
        let open = create_record(
            &conn,
            book_id,
            borrower_id,
            date("12-11-2024"),
            Some(date("26-11-2024")),
        )
        .unwrap();

        let open_records = fetch_records(&conn, &RecordFilter::with_status(RecordStatus::Open)).unwrap();
        let closed_records =
            fetch_records(&conn, &RecordFilter::with_status(RecordStatus::Closed)).unwrap();
        assert_eq!(open_records, vec![open.clone()]);
        assert_eq!(closed_records, vec![closed]);
        assert_eq!(find_open_record(&conn, book_id).unwrap(), Some(open));

        assert_eq!(delete_records_for_book(&conn, book_id).unwrap(), 2);
        assert!(fetch_records(&conn, &RecordFilter::default()).unwrap().is_empty());
    }
}
