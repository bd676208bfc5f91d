use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Entity, LibraryError, LibraryResult};
use crate::models::Author;

pub fn create_author(conn: &Connection, name: &str) -> LibraryResult<Author> {
    conn.execute("INSERT INTO authors (name) VALUES (?1)", params![name])?;

    Ok(Author {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub fn find_author(conn: &Connection, id: i64) -> LibraryResult<Option<Author>> {
    let author = conn
        .query_row(
            "SELECT id, name FROM authors WHERE id = ?1",
            params![id],
            |row| {
                Ok(Author {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(author)
}

pub fn fetch_author(conn: &Connection, id: i64) -> LibraryResult<Author> {
    find_author(conn, id)?.ok_or(LibraryError::NotFound {
        entity: Entity::Author,
        id,
    })
}

/// Every author ordered by id, which is also the order they were added in.
pub fn fetch_authors(conn: &Connection) -> LibraryResult<Vec<Author>> {
    let mut stmt = conn.prepare("SELECT id, name FROM authors ORDER BY id")?;

    let authors = stmt
        .query_map([], |row| {
            Ok(Author {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(authors)
}

pub fn delete_author(conn: &Connection, id: i64) -> LibraryResult<()> {
    let deleted = conn.execute("DELETE FROM authors WHERE id = ?1", params![id])?;

    if deleted == 0 {
        Err(LibraryError::NotFound {
            entity: Entity::Author,
            id,
        })
    } else {
        Ok(())
    }
}

pub fn count_authors(conn: &Connection) -> LibraryResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM authors", [], |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn ids_are_never_reused() {
        let conn = open_in_memory().unwrap();
        let first = create_author(&conn, "George Orwell").unwrap();
        delete_author(&conn, first.id).unwrap();
        let second = create_author(&conn, "J.R.R. Tolkien").unwrap();

        assert!(second.id > first.id);
        assert!(find_author(&conn, first.id).unwrap().is_none());
    }

    #[test]
    fn missing_author_is_not_found() {
        let conn = open_in_memory().unwrap();
        assert!(matches!(
            fetch_author(&conn, 42),
            Err(LibraryError::NotFound {
                entity: Entity::Author,
                id: 42
            })
        ));
        assert!(matches!(
            delete_author(&conn, 42),
            Err(LibraryError::NotFound { .. })
        ));
    }
}
