use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::Book;

use super::menu::Action;

/// Character classes a field accepts.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Text,
    Number,
    Date,
}

#[derive(Clone)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) value: String,
    pub(crate) kind: FieldKind,
    pub(crate) required: bool,
}

impl FormField {
    fn new(label: &'static str, kind: FieldKind, required: bool) -> Self {
        Self {
            label,
            value: String::new(),
            kind,
            required,
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn accepts(&self, ch: char) -> bool {
        match self.kind {
            FieldKind::Text => !ch.is_control(),
            FieldKind::Number => ch.is_ascii_digit(),
            FieldKind::Date => ch.is_ascii_digit() || ch == '-',
        }
    }

    fn placeholder(&self) -> &'static str {
        match (self.kind, self.required) {
            (FieldKind::Date, _) => "<DD-MM-YYYY, optional>",
            (_, true) => "<required>",
            (_, false) => "<blank keeps current>",
        }
    }
}

/// Input state for every action that needs typed values.
#[derive(Clone)]
pub(crate) struct InputForm {
    pub(crate) action: Action,
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl InputForm {
    /// Build the empty form for `action`; `None` for actions that run
    /// without input.
    pub(crate) fn for_action(action: Action) -> Option<Self> {
        use FieldKind::{Date, Number, Text};

        let fields = match action {
            Action::AddBook => vec![
                FormField::new("Title", Text, true),
                FormField::new("Author ID", Number, true),
                FormField::new("Genre", Text, true),
            ],
            Action::UpdateBook => vec![
                FormField::new("Book ID", Number, true),
                FormField::new("New title", Text, false),
                FormField::new("New author ID", Number, false),
                FormField::new("New genre", Text, false),
            ],
            Action::RemoveBook => vec![FormField::new("Book ID", Number, true)],
            Action::AddAuthor => vec![FormField::new("Name", Text, true)],
            Action::RemoveAuthor | Action::BooksByAuthor => {
                vec![FormField::new("Author ID", Number, true)]
            }
            Action::RegisterBorrower => vec![
                FormField::new("Name", Text, true),
                FormField::new("Email", Text, true),
            ],
            Action::BorrowBook => vec![
                FormField::new("Book ID", Number, true),
                FormField::new("Borrower ID", Number, true),
                FormField::new("Return by", Date, false),
            ],
            Action::ReturnBook => vec![FormField::new("Record ID", Number, true)],
            Action::ImportBooks | Action::ExportBooks => {
                vec![FormField::new("File", Text, true)]
            }
            Action::ListBooks
            | Action::ListAuthorsAndBooks
            | Action::ListBorrowers
            | Action::ShowOpenRecords
            | Action::ShowAllRecords => return None,
        };

        Some(Self {
            action,
            fields,
            active: 0,
            error: None,
        })
    }

    /// Pre-fill the first field, used for default file paths.
    pub(crate) fn prefilled(mut self, value: impl Into<String>) -> Self {
        if let Some(first) = self.fields.first_mut() {
            *first = first.clone().with_value(value);
        }
        self
    }

    pub(crate) fn title(&self) -> &'static str {
        self.action.label()
    }

    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    /// Append a character to the active field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let field = &mut self.fields[self.active];
        if field.accepts(ch) {
            field.value.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.fields[self.active].value.pop();
    }

    fn raw(&self, idx: usize) -> &str {
        self.fields
            .get(idx)
            .map(|field| field.value.trim())
            .unwrap_or_default()
    }

    /// Trimmed text of a required field.
    pub(crate) fn text(&self, idx: usize) -> Result<String> {
        let value = self.raw(idx);
        if value.is_empty() {
            return Err(anyhow!("{} is required.", self.fields[idx].label));
        }
        Ok(value.to_string())
    }

    /// Trimmed text, `None` when left blank.
    pub(crate) fn optional_text(&self, idx: usize) -> Option<String> {
        let value = self.raw(idx);
        (!value.is_empty()).then(|| value.to_string())
    }

    pub(crate) fn number(&self, idx: usize) -> Result<i64> {
        self.optional_number(idx)?
            .ok_or_else(|| anyhow!("{} is required.", self.fields[idx].label))
    }

    pub(crate) fn optional_number(&self, idx: usize) -> Result<Option<i64>> {
        let value = self.raw(idx);
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a whole number.", self.fields[idx].label))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, idx: usize) -> Line<'static> {
        let field = &self.fields[idx];
        let is_active = idx == self.active;
        let display = if field.value.is_empty() {
            field.placeholder().to_string()
        } else {
            field.value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label)),
            Span::styled(display, style),
        ])
    }

    /// Column where the cursor sits for the active field, relative to the
    /// form's inner area.
    pub(crate) fn cursor_offset(&self) -> u16 {
        let field = &self.fields[self.active];
        (field.label.chars().count() + 2 + field.value.chars().count()) as u16
    }
}

/// Destructive actions waiting for a yes/no answer.
#[derive(Clone)]
pub(crate) enum ConfirmDelete {
    Book(Book),
    Author {
        id: i64,
        name: String,
        books: Vec<Book>,
    },
}

impl ConfirmDelete {
    pub(crate) fn prompt(&self) -> Vec<String> {
        match self {
            ConfirmDelete::Book(book) => {
                let mut lines = vec![
                    format!("Remove book {} ({})?", book.id, book.title),
                    "Its borrow history will be removed as well.".to_string(),
                ];
                if book.is_borrowed {
                    lines.push("This book is currently borrowed.".to_string());
                }
                lines
            }
            ConfirmDelete::Author { id, name, books } => {
                let borrowed = books.iter().filter(|book| book.is_borrowed).count();
                let mut lines = vec![
                    format!("Remove author {id} ({name})?"),
                    format!(
                        "{} book(s) and their borrow records will be removed.",
                        books.len()
                    ),
                ];
                if borrowed > 0 {
                    lines.push(format!(
                        "{borrowed} book(s) are borrowed, so the removal will be refused."
                    ));
                }
                lines
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_into(form: &mut InputForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn number_fields_ignore_letters() {
        let mut form = InputForm::for_action(Action::ReturnBook).unwrap();
        type_into(&mut form, "1a2");
        assert_eq!(form.number(0).unwrap(), 12);
    }

    #[test]
    fn blank_optional_fields_stay_unset() {
        let mut form = InputForm::for_action(Action::UpdateBook).unwrap();
        type_into(&mut form, "4");
        form.next_field();
        type_into(&mut form, "  ");

        assert_eq!(form.number(0).unwrap(), 4);
        assert_eq!(form.optional_text(1), None);
        assert_eq!(form.optional_number(2).unwrap(), None);
    }

    #[test]
    fn required_field_error_names_the_field() {
        let form = InputForm::for_action(Action::AddBook).unwrap();
        assert_eq!(form.text(0).unwrap_err().to_string(), "Title is required.");
        assert_eq!(form.number(1).unwrap_err().to_string(), "Author ID is required.");
    }

    #[test]
    fn listing_actions_have_no_form() {
        assert!(InputForm::for_action(Action::ListBooks).is_none());
        let form = InputForm::for_action(Action::ExportBooks)
            .unwrap()
            .prefilled("export_books.csv");
        assert_eq!(form.text(0).unwrap(), "export_books.csv");
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = InputForm::for_action(Action::BorrowBook).unwrap();
        form.previous_field();
        assert_eq!(form.active, 2);
        form.next_field();
        assert_eq!(form.active, 0);
    }
}
