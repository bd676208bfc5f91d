use std::fs;
use std::path::PathBuf;

use library_manager::clock::FixedClock;
use library_manager::db::open_in_memory;
use library_manager::transfer::{import_books, read_books, write_books, EXPORT_HEADER};
use library_manager::{Library, LibraryDate};

fn library() -> Library {
    let today = LibraryDate::from_ymd(2024, 11, 6).unwrap();
    Library::with_clock(open_in_memory().unwrap(), FixedClock(today))
}

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("library-manager-{}-{name}", std::process::id()));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn malformed_line_imports_nothing() {
    let mut library = library();
    library.add_author("Frank Herbert").unwrap();
    let path = scratch_file("malformed.csv", "Dune,1,Sci-Fi\nChildren of Dune,first,Sci-Fi\n");

    let err = import_books(&mut library, &path).unwrap_err();
    fs::remove_file(&path).unwrap();

    assert!(format!("{err:#}").contains("line 2"), "{err:#}");
    assert!(library.list_books().unwrap().is_empty());
}

#[test]
fn import_skips_blank_lines_and_keeps_order() {
    let mut library = library();
    let author = library.add_author("Jane Austen").unwrap();
    let path = scratch_file(
        "blank-lines.csv",
        &format!("Emma,{id},Romance\n   \n Persuasion , {id} ,Romance\n", id = author.id),
    );

    let inserted = import_books(&mut library, &path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(inserted.len(), 2);
    let titles: Vec<String> = library
        .list_books()
        .unwrap()
        .into_iter()
        .map(|listing| listing.book.title)
        .collect();
    assert_eq!(titles, ["Emma", "Persuasion"]);
}

#[test]
fn parsed_books_go_in_as_one_batch() {
    let mut library = library();
    let books = read_books("Mort,7,Fantasy\nSourcery,7,Fantasy\n".as_bytes()).unwrap();
    library.bulk_insert_books(&books).unwrap();

    let listings = library.list_books().unwrap();
    assert_eq!(listings.len(), 2);
    assert!(listings.iter().all(|listing| listing.author_name == "Unknown"));
}

#[test]
fn export_lists_books_in_id_order() {
    let mut library = library();
    let author = library.add_author("Mary Shelley").unwrap();
    let books = read_books(
        format!("Frankenstein,{id},Gothic\nThe Last Man,{id},\n", id = author.id).as_bytes(),
    )
    .unwrap();
    let inserted = library.bulk_insert_books(&books).unwrap();
    let borrower = library.register_borrower("Alice Smith", "alice@example.com").unwrap();
    library.borrow_book(inserted[1].id, borrower.id, None).unwrap();

    let mut output = Vec::new();
    write_books(&library.export_rows().unwrap(), &mut output).unwrap();
    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], EXPORT_HEADER.join(","));
    assert_eq!(
        lines[1],
        format!("{},Frankenstein,Mary Shelley,available,N/A,N/A,N/A", inserted[0].id)
    );
    assert_eq!(
        lines[2],
        format!(
            "{},The Last Man,Mary Shelley,borrowed,06-11-2024,N/A,Alice Smith",
            inserted[1].id
        )
    );
    assert_eq!(lines.len(), 3);
}
