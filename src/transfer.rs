//! CSV import and export of the book catalogue.
//!
//! Imports are header-less `title,author_id,genre` lines. Exports carry a
//! header and one presentation row per book.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Deserialize;

use crate::library::Library;
use crate::models::{Book, NewBook};
use crate::reports::ExportRow;

pub const EXPORT_HEADER: [&str; 7] = [
    "book_id",
    "book_name",
    "author_name",
    "status",
    "borrow_date",
    "return_date",
    "borrower_name",
];

#[derive(Debug, Deserialize)]
struct ImportLine {
    title: String,
    author_id: i64,
    #[serde(default)]
    genre: String,
}

/// Parse every line up front so a bad line aborts the import before any row
/// reaches the store.
pub fn read_books<R: Read>(input: R) -> Result<Vec<NewBook>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let mut books = Vec::new();
    let mut record = StringRecord::new();
    while reader
        .read_record(&mut record)
        .context("failed to read import file")?
    {
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let parsed: ImportLine = record
            .deserialize(None)
            .with_context(|| format!("invalid book on line {line}"))?;
        if parsed.title.is_empty() {
            anyhow::bail!("missing title on line {line}");
        }
        books.push(NewBook {
            title: parsed.title,
            author_id: parsed.author_id,
            genre: parsed.genre,
        });
    }

    Ok(books)
}

pub fn write_books<W: Write>(rows: &[ExportRow], output: W) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(output);
    writer
        .write_record(EXPORT_HEADER)
        .context("failed to write export header")?;

    for row in rows {
        writer
            .write_record([
                row.book_id.to_string().as_str(),
                row.book_name.as_str(),
                row.author_name.as_str(),
                row.status,
                row.borrow_date.as_str(),
                row.return_date.as_str(),
                row.borrower_name.as_str(),
            ])
            .with_context(|| format!("failed to write book {}", row.book_id))?;
    }

    writer.flush().context("failed to flush export")?;
    Ok(())
}

pub fn import_books(library: &mut Library, path: &Path) -> Result<Vec<Book>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let books = read_books(file)?;
    let inserted = library.bulk_insert_books(&books)?;
    tracing::info!(path = %path.display(), count = inserted.len(), "import finished");
    Ok(inserted)
}

/// Write the catalogue to `path`, returning how many books were exported.
pub fn export_books(library: &Library, path: &Path) -> Result<usize> {
    let rows = library.export_rows()?;
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_books(&rows, file)?;
    tracing::info!(path = %path.display(), count = rows.len(), "export finished");
    Ok(rows.len())
}
