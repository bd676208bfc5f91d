use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::{Entity, LibraryError, LibraryResult};
use crate::models::{Book, NewBook};

const BOOK_COLUMNS: &str = "id, title, author_id, genre, is_borrowed";

/// Equality filters for book queries. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub author_id: Option<i64>,
    pub is_borrowed: Option<bool>,
    pub genre: Option<String>,
}

impl BookFilter {
    pub fn by_author(author_id: i64) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(author_id) = self.author_id {
            values.push(Value::Integer(author_id));
            conditions.push(format!("author_id = ?{}", values.len()));
        }
        if let Some(is_borrowed) = self.is_borrowed {
            values.push(Value::Integer(i64::from(is_borrowed)));
            conditions.push(format!("is_borrowed = ?{}", values.len()));
        }
        if let Some(genre) = &self.genre {
            values.push(Value::Text(genre.clone()));
            conditions.push(format!("genre = ?{}", values.len()));
        }

        if conditions.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), values)
        }
    }
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author_id: row.get(2)?,
        genre: row.get(3)?,
        is_borrowed: row.get(4)?,
    })
}

/// Insert a new, available book and echo the stored row.
pub fn create_book(conn: &Connection, book: &NewBook) -> LibraryResult<Book> {
    conn.execute(
        "INSERT INTO books (title, author_id, genre, is_borrowed) VALUES (?1, ?2, ?3, 0)",
        params![book.title, book.author_id, book.genre],
    )?;

    Ok(Book {
        id: conn.last_insert_rowid(),
        title: book.title.clone(),
        author_id: book.author_id,
        genre: book.genre.clone(),
        is_borrowed: false,
    })
}

pub fn find_book(conn: &Connection, id: i64) -> LibraryResult<Option<Book>> {
    let book = conn
        .query_row(
            &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
            params![id],
            book_from_row,
        )
        .optional()?;
    Ok(book)
}

pub fn fetch_book(conn: &Connection, id: i64) -> LibraryResult<Book> {
    find_book(conn, id)?.ok_or(LibraryError::NotFound {
        entity: Entity::Book,
        id,
    })
}

pub fn fetch_books(conn: &Connection, filter: &BookFilter) -> LibraryResult<Vec<Book>> {
    let (where_clause, values) = filter.where_clause();
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOK_COLUMNS} FROM books {where_clause} ORDER BY id"
    ))?;

    let books = stmt
        .query_map(params_from_iter(values.iter()), book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(books)
}

/// Overwrite title, author and genre. The borrowed flag is owned by the
/// lending state machine and goes through [`set_borrowed`] instead.
pub fn update_book(conn: &Connection, book: &Book) -> LibraryResult<()> {
    let updated = conn.execute(
        "UPDATE books SET title = ?1, author_id = ?2, genre = ?3 WHERE id = ?4",
        params![book.title, book.author_id, book.genre, book.id],
    )?;

    if updated == 0 {
        Err(LibraryError::NotFound {
            entity: Entity::Book,
            id: book.id,
        })
    } else {
        Ok(())
    }
}

pub fn set_borrowed(conn: &Connection, id: i64, is_borrowed: bool) -> LibraryResult<()> {
    let updated = conn.execute(
        "UPDATE books SET is_borrowed = ?1 WHERE id = ?2",
        params![is_borrowed, id],
    )?;

    if updated == 0 {
        Err(LibraryError::NotFound {
            entity: Entity::Book,
            id,
        })
    } else {
        Ok(())
    }
}

pub fn delete_book(conn: &Connection, id: i64) -> LibraryResult<()> {
    let deleted = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;

    if deleted == 0 {
        Err(LibraryError::NotFound {
            entity: Entity::Book,
            id,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn new_book(title: &str, author_id: i64, genre: &str) -> NewBook {
        NewBook {
            title: title.into(),
            author_id,
            genre: genre.into(),
        }
    }

    #[test]
    fn filters_combine_with_and() {
        let conn = open_in_memory().unwrap();
        let hobbit = create_book(&conn, &new_book("The Hobbit", 3, "Fantasy")).unwrap();
        create_book(&conn, &new_book("1984", 2, "Dystopian")).unwrap();
        let potter = create_book(&conn, &new_book("Harry Potter", 1, "Fantasy")).unwrap();
        set_borrowed(&conn, potter.id, true).unwrap();

        let fantasy = BookFilter {
            genre: Some("Fantasy".into()),
            ..BookFilter::default()
        };
        assert_eq!(fetch_books(&conn, &fantasy).unwrap().len(), 2);

        let available_fantasy = BookFilter {
            is_borrowed: Some(false),
            ..fantasy
        };
        assert_eq!(fetch_books(&conn, &available_fantasy).unwrap(), vec![hobbit]);

        let by_author = fetch_books(&conn, &BookFilter::by_author(1)).unwrap();
        assert_eq!(by_author.len(), 1);
        assert!(by_author[0].is_borrowed);
    }

    #[test]
    fn update_leaves_borrowed_flag_alone() {
        let conn = open_in_memory().unwrap();
        let mut book = create_book(&conn, &new_book("1984", 2, "Dystopian")).unwrap();
        set_borrowed(&conn, book.id, true).unwrap();

        book.title = "Nineteen Eighty-Four".into();
        book.is_borrowed = false;
        update_book(&conn, &book).unwrap();

        let stored = fetch_book(&conn, book.id).unwrap();
        assert_eq!(stored.title, "Nineteen Eighty-Four");
        assert!(stored.is_borrowed);
    }

    #[test]
    fn writes_to_missing_book_are_not_found() {
        let conn = open_in_memory().unwrap();
        let ghost = Book {
            id: 7,
            title: "Ghost".into(),
            author_id: 1,
            genre: String::new(),
            is_borrowed: false,
        };
        assert!(matches!(
            update_book(&conn, &ghost),
            Err(LibraryError::NotFound { id: 7, .. })
        ));
        assert!(matches!(
            set_borrowed(&conn, 7, true),
            Err(LibraryError::NotFound { id: 7, .. })
        ));
        assert!(matches!(
            delete_book(&conn, 7),
            Err(LibraryError::NotFound { id: 7, .. })
        ));
    }
}
