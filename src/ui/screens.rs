use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{Author, Book, LibraryDate, RecordStatus};
use crate::reports::{
    AuthorListing, BookListing, BorrowerListing, RecordListing, NOT_AVAILABLE,
};

/// Scrollable read-only listing.
pub(crate) struct ReportScreen {
    pub(crate) title: String,
    pub(crate) lines: Vec<Line<'static>>,
    pub(crate) scroll: u16,
}

impl ReportScreen {
    fn new(title: impl Into<String>, lines: Vec<Line<'static>>, empty: &str) -> Self {
        let lines = if lines.is_empty() {
            vec![Line::from(Span::styled(
                empty.to_string(),
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            lines
        };
        Self {
            title: title.into(),
            lines,
            scroll: 0,
        }
    }

    pub(crate) fn scroll_by(&mut self, offset: i32) {
        let max = self.lines.len().saturating_sub(1) as i32;
        self.scroll = (self.scroll as i32 + offset).clamp(0, max) as u16;
    }

    pub(crate) fn books(listings: &[BookListing]) -> Self {
        let mut lines = Vec::new();
        for listing in listings {
            let book = &listing.book;
            lines.push(Line::from(vec![
                id_span(book.id),
                Span::styled(book.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!(
                    "  by {} | {} | ",
                    listing.author_name,
                    genre_or_dash(&book.genre)
                )),
                borrowed_span(book.is_borrowed),
            ]));
            if let Some(loan) = &listing.loan {
                lines.push(Line::from(format!(
                    "      Borrower: {}  Borrowed: {}  Return by: {}  (record {})",
                    loan.borrower_name,
                    loan.record.borrow_date,
                    date_or_na(loan.record.due_date),
                    loan.record.id
                )));
            }
        }
        Self::new("Books", lines, "No books yet. Add an author first, then add books.")
    }

    pub(crate) fn authors_and_books(listings: &[AuthorListing]) -> Self {
        let mut lines = Vec::new();
        for listing in listings {
            lines.push(Line::from(vec![
                id_span(listing.author.id),
                Span::styled(
                    listing.author.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
            if listing.books.is_empty() {
                lines.push(Line::from(Span::styled(
                    "      No books written by this author.",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            for book in &listing.books {
                lines.push(book_bullet(book));
            }
        }
        Self::new("Authors", lines, "No authors yet.")
    }

    pub(crate) fn books_by_author(author: &Author, books: &[Book]) -> Self {
        let lines = books.iter().map(book_bullet).collect();
        Self::new(
            format!("Books by {}", author.name),
            lines,
            "No books written by this author.",
        )
    }

    /// Compact id/name list shown behind forms that ask for an author id.
    pub(crate) fn author_index(authors: &[Author]) -> Self {
        let lines = authors
            .iter()
            .map(|author| Line::from(vec![id_span(author.id), Span::raw(author.name.clone())]))
            .collect();
        Self::new("Authors", lines, "No authors yet.")
    }

    pub(crate) fn borrowers(listings: &[BorrowerListing]) -> Self {
        let mut lines = Vec::new();
        for listing in listings {
            let borrower = &listing.borrower;
            lines.push(Line::from(vec![
                id_span(borrower.id),
                Span::styled(borrower.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!("  <{}>", borrower.email)),
            ]));
            for book in &listing.holding {
                lines.push(Line::from(format!("      holds [{}] {}", book.id, book.title)));
            }
        }
        Self::new("Borrowers", lines, "No borrowers registered.")
    }

    pub(crate) fn records(listings: &[RecordListing], status: Option<RecordStatus>) -> Self {
        let title = match status {
            Some(RecordStatus::Open) => "Open Borrow Records",
            Some(RecordStatus::Closed) => "Closed Borrow Records",
            None => "Borrow Records",
        };
        let lines = listings
            .iter()
            .map(|listing| {
                let record = &listing.record;
                let state = if record.is_open() {
                    Span::styled("open", Style::default().fg(Color::Yellow))
                } else {
                    Span::styled("closed", Style::default().fg(Color::Green))
                };
                Line::from(vec![
                    id_span(record.id),
                    Span::raw(format!(
                        "{} -> {} | borrowed {} | return by {} | returned {} | ",
                        listing.book_title,
                        listing.borrower_name,
                        record.borrow_date,
                        date_or_na(record.due_date),
                        date_or_na(record.return_date),
                    )),
                    state,
                ])
            })
            .collect();
        Self::new(title, lines, "No borrow records.")
    }
}

fn id_span(id: i64) -> Span<'static> {
    Span::styled(format!("[{id:>3}] "), Style::default().fg(Color::Cyan))
}

fn borrowed_span(is_borrowed: bool) -> Span<'static> {
    if is_borrowed {
        Span::styled("Borrowed", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("Available", Style::default().fg(Color::Green))
    }
}

fn book_bullet(book: &Book) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("      - [{}] {} ", book.id, book.title)),
        borrowed_span(book.is_borrowed),
    ])
}

fn genre_or_dash(genre: &str) -> &str {
    if genre.trim().is_empty() {
        "-"
    } else {
        genre
    }
}

fn date_or_na(date: Option<LibraryDate>) -> String {
    date.map(|date| date.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BorrowRecord, Borrower};
    use crate::reports::LoanDetails;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn book(id: i64, title: &str, is_borrowed: bool) -> Book {
        Book {
            id,
            title: title.into(),
            author_id: 1,
            genre: "Fantasy".into(),
            is_borrowed,
        }
    }

    #[test]
    fn borrowed_book_gets_a_loan_line() {
        let record = BorrowRecord {
            id: 7,
            book_id: 1,
            borrower_id: 2,
            borrow_date: "06-11-2024".parse().unwrap(),
            due_date: None,
            return_date: None,
        };
        let listings = vec![BookListing {
            book: book(1, "The Hobbit", true),
            author_name: "Unknown".into(),
            loan: Some(LoanDetails {
                record,
                borrower_name: "Alice Smith".into(),
            }),
        }];

        let report = ReportScreen::books(&listings);
        assert_eq!(report.lines.len(), 2);
        assert!(text(&report.lines[0]).contains("by Unknown"));
        assert!(text(&report.lines[1]).contains("Borrower: Alice Smith"));
        assert!(text(&report.lines[1]).contains("Return by: N/A"));
    }

    #[test]
    fn empty_listing_shows_hint_and_scroll_is_clamped() {
        let mut report = ReportScreen::borrowers(&[]);
        assert_eq!(text(&report.lines[0]), "No borrowers registered.");
        report.scroll_by(5);
        assert_eq!(report.scroll, 0);

        let listings = vec![BorrowerListing {
            borrower: Borrower {
                id: 1,
                name: "Bob Johnson".into(),
                email: "bob@example.com".into(),
            },
            holding: vec![book(3, "1984", true)],
        }];
        let mut report = ReportScreen::borrowers(&listings);
        report.scroll_by(10);
        assert_eq!(report.scroll, 1);
        report.scroll_by(-4);
        assert_eq!(report.scroll, 0);
    }
}
