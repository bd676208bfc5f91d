use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Entity, LibraryError, LibraryResult};
use crate::models::Borrower;

fn borrower_from_row(row: &Row<'_>) -> rusqlite::Result<Borrower> {
    Ok(Borrower {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
    })
}

pub fn create_borrower(conn: &Connection, name: &str, email: &str) -> LibraryResult<Borrower> {
    conn.execute(
        "INSERT INTO borrowers (name, email) VALUES (?1, ?2)",
        params![name, email],
    )?;

    Ok(Borrower {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        email: email.to_string(),
    })
}

pub fn find_borrower(conn: &Connection, id: i64) -> LibraryResult<Option<Borrower>> {
    let borrower = conn
        .query_row(
            "SELECT id, name, email FROM borrowers WHERE id = ?1",
            params![id],
            borrower_from_row,
        )
        .optional()?;
    Ok(borrower)
}

pub fn fetch_borrower(conn: &Connection, id: i64) -> LibraryResult<Borrower> {
    find_borrower(conn, id)?.ok_or(LibraryError::NotFound {
        entity: Entity::Borrower,
        id,
    })
}

pub fn fetch_borrowers(conn: &Connection) -> LibraryResult<Vec<Borrower>> {
    let mut stmt = conn.prepare("SELECT id, name, email FROM borrowers ORDER BY id")?;

    let borrowers = stmt
        .query_map([], borrower_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(borrowers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn registered_borrowers_round_trip() {
        let conn = open_in_memory().unwrap();
        let alice = create_borrower(&conn, "Alice Smith", "alice@example.com").unwrap();
        create_borrower(&conn, "Bob Johnson", "bob@example.com").unwrap();

        assert_eq!(fetch_borrower(&conn, alice.id).unwrap(), alice);
        let names: Vec<_> = fetch_borrowers(&conn)
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, ["Alice Smith", "Bob Johnson"]);
    }
}
