use std::mem;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::config::Settings;
use crate::library::Library;
use crate::models::{BookChanges, NewBook, RecordStatus};
use crate::transfer::{export_books, import_books};

use super::forms::{ConfirmDelete, InputForm};
use super::helpers::{centered_rect, is_fatal, surface_error};
use super::menu::{Action, MenuChoice, MenuState};
use super::screens::ReportScreen;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Lines moved by PageUp / PageDown in reports.
const PAGE_SCROLL: i32 = 10;

/// What fills the main area.
enum Screen {
    Menu,
    Report(ReportScreen),
}

/// Overlays drawn on top of the current screen.
enum Mode {
    Normal,
    Form(InputForm),
    Confirm(ConfirmDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    library: Library,
    import_path: PathBuf,
    export_path: PathBuf,
    menu: MenuState,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(library: Library, settings: &Settings) -> Self {
        Self {
            library,
            import_path: settings.import_path.clone(),
            export_path: settings.export_path.clone(),
            menu: MenuState::default(),
            screen: Screen::Menu,
            mode: Mode::Normal,
            status: Some(StatusMessage {
                text: "Create authors first, then add books. Register borrowers to lend them."
                    .to_string(),
                kind: StatusKind::Info,
            }),
        }
    }

    /// Process one key press. Returns `Ok(true)` when the user asked to quit
    /// and `Err` only for failures that end the session.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Form(form) => self.handle_form(code, form)?,
            Mode::Confirm(confirm) => self.handle_confirm(code, confirm)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if let Screen::Report(report) = &mut self.screen {
            match code {
                KeyCode::Up | KeyCode::Char('k') => report.scroll_by(-1),
                KeyCode::Down | KeyCode::Char('j') => report.scroll_by(1),
                KeyCode::PageUp => report.scroll_by(-PAGE_SCROLL),
                KeyCode::PageDown => report.scroll_by(PAGE_SCROLL),
                KeyCode::Esc
                | KeyCode::Enter
                | KeyCode::Backspace
                | KeyCode::Left
                | KeyCode::Char('q') => self.screen = Screen::Menu,
                _ => {}
            }
            return Ok(Mode::Normal);
        }

        match code {
            KeyCode::Up | KeyCode::Char('k') => self.menu.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.menu.move_selection(1),
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Left => {
                if !self.menu.back() && code == KeyCode::Esc {
                    *exit = true;
                }
            }
            KeyCode::Enter | KeyCode::Right => match self.menu.choose() {
                MenuChoice::Opened(_) => self.clear_status(),
                MenuChoice::Run(action) => return self.start_action(action),
                MenuChoice::Quit => *exit = true,
            },
            _ => {}
        }
        Ok(Mode::Normal)
    }

    /// Run a listing directly or open the form for an action that needs input.
    /// Forms get a context listing behind them so the user can look up ids.
    fn start_action(&mut self, action: Action) -> Result<Mode> {
        self.clear_status();

        let Some(form) = InputForm::for_action(action) else {
            if let Some(report) = self.run_listing(action)? {
                self.screen = Screen::Report(report);
            }
            return Ok(Mode::Normal);
        };

        let form = match action {
            Action::ImportBooks => form.prefilled(self.import_path.display().to_string()),
            Action::ExportBooks => form.prefilled(self.export_path.display().to_string()),
            _ => form,
        };

        let context = match action {
            Action::AddBook | Action::RemoveAuthor | Action::BooksByAuthor => {
                self.run(|library| library.list_authors())?
                    .map(|authors| ReportScreen::author_index(&authors))
            }
            Action::UpdateBook | Action::RemoveBook | Action::BorrowBook => {
                self.run_listing(Action::ListBooks)?
            }
            Action::ReturnBook => self.run_listing(Action::ShowOpenRecords)?,
            _ => None,
        };
        self.screen = context.map_or(Screen::Menu, Screen::Report);

        Ok(Mode::Form(form))
    }

    fn run_listing(&mut self, action: Action) -> Result<Option<ReportScreen>> {
        match action {
            Action::ListBooks => Ok(self
                .run(|library| library.list_books())?
                .map(|listings| ReportScreen::books(&listings))),
            Action::ListAuthorsAndBooks => Ok(self
                .run(|library| library.list_authors_and_books())?
                .map(|listings| ReportScreen::authors_and_books(&listings))),
            Action::ListBorrowers => Ok(self
                .run(|library| library.list_borrowers())?
                .map(|listings| ReportScreen::borrowers(&listings))),
            Action::ShowOpenRecords => self.records_report(Some(RecordStatus::Open)),
            Action::ShowAllRecords => self.records_report(None),
            _ => Ok(None),
        }
    }

    fn records_report(&mut self, status: Option<RecordStatus>) -> Result<Option<ReportScreen>> {
        Ok(self
            .run(|library| library.show_borrow_records(status))?
            .map(|listings| ReportScreen::records(&listings, status)))
    }

    /// Run a read against the library. Recoverable failures land in the
    /// footer and yield `None`; store failures propagate.
    fn run<T>(
        &mut self,
        op: impl FnOnce(&Library) -> crate::error::LibraryResult<T>,
    ) -> Result<Option<T>> {
        match op(&self.library) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(err) => {
                self.set_status(err.to_string(), StatusKind::Error);
                Ok(None)
            }
        }
    }

    fn handle_form(&mut self, code: KeyCode, mut form: InputForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status(format!("{} cancelled.", form.title()), StatusKind::Info);
                self.screen = Screen::Menu;
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.submit_form(&form) {
                Ok(next) => return Ok(next),
                Err(err) if is_fatal(&err) => return Err(err),
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        Ok(Mode::Form(form))
    }

    /// Validate the form and perform its action. An `Err` keeps the form open
    /// with the message shown inside it.
    fn submit_form(&mut self, form: &InputForm) -> Result<Mode> {
        match form.action {
            Action::AddBook => {
                let book = self.library.add_book(NewBook {
                    title: form.text(0)?,
                    author_id: form.number(1)?,
                    genre: form.text(2)?,
                })?;
                self.finish(format!("Added book {} ({}).", book.id, book.title))
            }
            Action::UpdateBook => {
                let book_id = form.number(0)?;
                let changes = BookChanges {
                    title: form.optional_text(1),
                    author_id: form.optional_number(2)?,
                    genre: form.optional_text(3),
                };
                if changes.is_empty() {
                    anyhow::bail!("Nothing to update. Fill in at least one new value.");
                }
                let book = self.library.update_book(book_id, &changes)?;
                self.finish(format!("Updated book {} ({}).", book.id, book.title))
            }
            Action::RemoveBook => {
                let book = self.library.book(form.number(0)?)?;
                Ok(Mode::Confirm(ConfirmDelete::Book(book)))
            }
            Action::AddAuthor => {
                let author = self.library.add_author(&form.text(0)?)?;
                self.finish(format!("Added author {} ({}).", author.id, author.name))
            }
            Action::RemoveAuthor => {
                let author = self.library.author(form.number(0)?)?;
                let books = self.library.books_by_author(author.id)?;
                Ok(Mode::Confirm(ConfirmDelete::Author {
                    id: author.id,
                    name: author.name,
                    books,
                }))
            }
            Action::BooksByAuthor => {
                let author = self.library.author(form.number(0)?)?;
                let books = self.library.books_by_author(author.id)?;
                self.screen = Screen::Report(ReportScreen::books_by_author(&author, &books));
                Ok(Mode::Normal)
            }
            Action::RegisterBorrower => {
                let borrower = self
                    .library
                    .register_borrower(&form.text(0)?, &form.text(1)?)?;
                self.finish(format!(
                    "Registered borrower {} ({}).",
                    borrower.id, borrower.name
                ))
            }
            Action::BorrowBook => {
                let due_date = form.optional_text(2);
                let record = self.library.borrow_book(
                    form.number(0)?,
                    form.number(1)?,
                    due_date.as_deref(),
                )?;
                self.finish(format!(
                    "Book {} borrowed on {} (record {}).",
                    record.book_id, record.borrow_date, record.id
                ))
            }
            Action::ReturnBook => {
                let record = self.library.return_book(form.number(0)?)?;
                let returned = record
                    .return_date
                    .map(|date| date.to_string())
                    .unwrap_or_default();
                self.finish(format!("Book {} returned on {returned}.", record.book_id))
            }
            Action::ImportBooks => {
                let path = PathBuf::from(form.text(0)?);
                let inserted = import_books(&mut self.library, &path)?;
                self.import_path = path;
                self.finish(format!("Imported {} book(s).", inserted.len()))
            }
            Action::ExportBooks => {
                let path = PathBuf::from(form.text(0)?);
                let count = export_books(&self.library, &path)?;
                let message = format!("Exported {count} book(s) to {}.", path.display());
                self.export_path = path;
                self.finish(message)
            }
            Action::ListBooks
            | Action::ListAuthorsAndBooks
            | Action::ListBorrowers
            | Action::ShowOpenRecords
            | Action::ShowAllRecords => Ok(Mode::Normal),
        }
    }

    /// Close the form, return to the menu, and report success.
    fn finish(&mut self, message: String) -> Result<Mode> {
        self.screen = Screen::Menu;
        self.set_status(message, StatusKind::Info);
        Ok(Mode::Normal)
    }

    fn handle_confirm(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                self.screen = Screen::Menu;
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.perform_delete(&confirm)?;
                self.screen = Screen::Menu;
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::Confirm(confirm)),
        }
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) -> Result<()> {
        let outcome = match confirm {
            ConfirmDelete::Book(book) => self.library.remove_book(book.id).map(|removed| {
                format!(
                    "Removed book {} ({}) and {} borrow record(s).",
                    removed.book.id, removed.book.title, removed.records_removed
                )
            }),
            ConfirmDelete::Author { id, .. } => self.library.remove_author(*id).map(|removed| {
                format!(
                    "Removed author {} ({}), {} book(s), {} borrow record(s).",
                    removed.author.id,
                    removed.author.name,
                    removed.books_removed.len(),
                    removed.records_removed
                )
            }),
        };

        match outcome {
            Ok(message) => self.set_status(message, StatusKind::Info),
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
        Ok(())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Menu => self.draw_menu(frame, content_area),
            Screen::Report(report) => self.draw_report(frame, content_area, report),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Form(form) => self.draw_form(frame, area, form),
            Mode::Confirm(confirm) => self.draw_confirm(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .menu
            .entries()
            .into_iter()
            .enumerate()
            .map(|(idx, label)| ListItem::new(format!("{}. {label}", idx + 1)))
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(self.menu.title())
                    .borders(Borders::ALL),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default().with_selected(Some(self.menu.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_report(&self, frame: &mut Frame, area: Rect, report: &ReportScreen) {
        let block = Block::default()
            .title(report.title.clone())
            .borders(Borders::ALL);
        let paragraph = Paragraph::new(report.lines.clone())
            .block(block)
            .scroll((report.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let text = match (&self.mode, &self.screen) {
            (Mode::Form(_), _) => "Enter submit | Tab/Up/Down switch field | Esc cancel",
            (Mode::Confirm(_), _) => "Y confirm | N/Esc cancel",
            (Mode::Normal, Screen::Report(_)) => "Up/Down/PgUp/PgDn scroll | Esc back to menu",
            (Mode::Normal, Screen::Menu) if self.menu.section.is_some() => {
                "Up/Down move | Enter select | Esc back | q quit"
            }
            (Mode::Normal, Screen::Menu) => "Up/Down move | Enter open | Esc/q quit",
        };
        Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &InputForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(form.title()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len())
            .map(|idx| form.build_line(idx))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to submit | Tab to switch | Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let cursor_x = (inner.x + form.cursor_offset()).min(inner.right().saturating_sub(1));
        let cursor_y = inner.y + form.active as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = confirm.prompt().into_iter().map(Line::from).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::db::open_in_memory;
    use crate::models::LibraryDate;

    fn app() -> App {
        let today = LibraryDate::from_ymd(2024, 11, 6).unwrap();
        let library = Library::with_clock(open_in_memory().unwrap(), FixedClock(today));
        let settings = Settings {
            db_path: PathBuf::from(":memory:"),
            log_path: PathBuf::from("library.log"),
            import_path: PathBuf::from("books.csv"),
            export_path: PathBuf::from("export_books.csv"),
        };
        App::new(library, &settings)
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            assert!(!app.handle_key(*key).unwrap());
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, &[KeyCode::Char(ch)]);
        }
    }

    fn status(app: &App) -> &str {
        app.status.as_ref().map(|s| s.text.as_str()).unwrap_or_default()
    }

    #[test]
    fn add_author_through_the_menu() {
        let mut app = app();
        // Authors section, then "Add Author".
        press(&mut app, &[KeyCode::Down, KeyCode::Enter]);
        press(&mut app, &[KeyCode::Down, KeyCode::Down, KeyCode::Enter]);
        assert!(matches!(app.mode, Mode::Form(ref form) if form.action == Action::AddAuthor));

        type_text(&mut app, "Ursula K. Le Guin");
        press(&mut app, &[KeyCode::Enter]);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status(&app), "Added author 1 (Ursula K. Le Guin).");
        assert_eq!(app.library.list_authors().unwrap().len(), 1);
    }

    #[test]
    fn rejected_borrow_keeps_form_open() {
        let mut app = app();
        let author = app.library.add_author("Frank Herbert").unwrap();
        let book = app
            .library
            .add_book(NewBook {
                title: "Dune".into(),
                author_id: author.id,
                genre: "Sci-Fi".into(),
            })
            .unwrap();
        let borrower = app.library.register_borrower("Alice Smith", "alice@example.com").unwrap();
        app.library.borrow_book(book.id, borrower.id, None).unwrap();

        app.mode = app.start_action(Action::BorrowBook).unwrap();
        type_text(&mut app, &book.id.to_string());
        press(&mut app, &[KeyCode::Tab]);
        type_text(&mut app, &borrower.id.to_string());
        press(&mut app, &[KeyCode::Enter]);

        match &app.mode {
            Mode::Form(form) => assert_eq!(
                form.error.as_deref(),
                Some(format!("Book {} is already borrowed.", book.id).as_str())
            ),
            _ => panic!("form should stay open"),
        }
    }

    #[test]
    fn remove_author_asks_for_confirmation() {
        let mut app = app();
        let author = app.library.add_author("George Orwell").unwrap();

        app.mode = app.start_action(Action::RemoveAuthor).unwrap();
        type_text(&mut app, &author.id.to_string());
        press(&mut app, &[KeyCode::Enter]);
        assert!(matches!(app.mode, Mode::Confirm(_)));

        press(&mut app, &[KeyCode::Char('y')]);
        assert!(app.library.list_authors().unwrap().is_empty());
        assert!(status(&app).starts_with("Removed author"));
    }

    #[test]
    fn listing_opens_report_and_esc_returns() {
        let mut app = app();
        app.mode = app.start_action(Action::ShowAllRecords).unwrap();
        assert!(matches!(app.screen, Screen::Report(ref report) if report.title == "Borrow Records"));

        press(&mut app, &[KeyCode::Esc]);
        assert!(matches!(app.screen, Screen::Menu));
    }

    #[test]
    fn quit_from_top_level() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }
}
