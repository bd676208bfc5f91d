//! Demo catalogue for trying the application on an empty database.

use crate::db;
use crate::error::LibraryResult;
use crate::library::Library;
use crate::models::{LibraryDate, NewBook};

const AUTHORS: [&str; 3] = ["J.K. Rowling", "George Orwell", "J.R.R. Tolkien"];
const BOOKS: [(&str, usize, &str); 3] = [
    ("Harry Potter", 0, "Fantasy"),
    ("1984", 1, "Dystopian"),
    ("The Hobbit", 2, "Fantasy"),
];
const BORROWERS: [(&str, &str); 2] = [
    ("Alice Smith", "alice@example.com"),
    ("Bob Johnson", "bob@example.com"),
];
/// (book index, borrower index, borrowed on, returned on)
const HISTORY: [(usize, usize, &str, &str); 2] = [
    (0, 0, "01-11-2024", "10-11-2024"),
    (1, 1, "05-11-2024", "15-11-2024"),
];

/// Insert the demo data unless the library already has authors. Returns
/// whether anything was written. Either every demo row lands or none does.
pub fn seed_demo_data(library: &mut Library) -> LibraryResult<bool> {
    let tx = library.connection_mut().transaction()?;
    if db::count_authors(&tx)? > 0 {
        tracing::info!("library already has data, skipping seed");
        return Ok(false);
    }

    let mut author_ids = Vec::with_capacity(AUTHORS.len());
    for name in AUTHORS {
        author_ids.push(db::create_author(&tx, name)?.id);
    }

    let mut book_ids = Vec::with_capacity(BOOKS.len());
    for (title, author, genre) in BOOKS {
        let book = db::create_book(
            &tx,
            &NewBook {
                title: title.to_string(),
                author_id: author_ids[author],
                genre: genre.to_string(),
            },
        )?;
        book_ids.push(book.id);
    }

    let mut borrower_ids = Vec::with_capacity(BORROWERS.len());
    for (name, email) in BORROWERS {
        borrower_ids.push(db::create_borrower(&tx, name, email)?.id);
    }

    for (book, borrower, borrowed, returned) in HISTORY {
        db::create_closed_record(
            &tx,
            book_ids[book],
            borrower_ids[borrower],
            borrowed.parse::<LibraryDate>()?,
            returned.parse::<LibraryDate>()?,
        )?;
    }

    tx.commit()?;
    tracing::info!("demo data seeded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn seeds_once() {
        let mut library = Library::new(open_in_memory().unwrap());
        assert!(seed_demo_data(&mut library).unwrap());
        assert!(!seed_demo_data(&mut library).unwrap());

        assert_eq!(library.list_authors().unwrap().len(), 3);
        assert_eq!(library.list_borrowers().unwrap().len(), 2);
        let books = library.list_books().unwrap();
        assert_eq!(books.len(), 3);
        assert!(books.iter().all(|listing| !listing.book.is_borrowed));
        assert_eq!(library.show_borrow_records(None).unwrap().len(), 2);
    }

    #[test]
    fn failed_seed_leaves_no_rows() {
        let mut library = Library::new(open_in_memory().unwrap());
        library
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_borrowers BEFORE INSERT ON borrowers
                 BEGIN SELECT RAISE(ABORT, 'borrowers are read-only'); END;",
            )
            .unwrap();

        let err = seed_demo_data(&mut library).unwrap_err();
        assert!(err.is_fatal());
        assert!(library.list_authors().unwrap().is_empty());
        assert!(library.list_books().unwrap().is_empty());
    }
}
