//! The nested main menu: a top level of sections, each opening a list of
//! actions.

/// Top-level menu groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    Books,
    Authors,
    Borrowers,
    Lending,
    Transfer,
}

impl Section {
    pub(crate) const ALL: [Section; 5] = [
        Section::Books,
        Section::Authors,
        Section::Borrowers,
        Section::Lending,
        Section::Transfer,
    ];

    pub(crate) fn title(self) -> &'static str {
        match self {
            Section::Books => "Books",
            Section::Authors => "Authors",
            Section::Borrowers => "Borrowers",
            Section::Lending => "Lending",
            Section::Transfer => "Import & Export",
        }
    }

    pub(crate) fn actions(self) -> &'static [Action] {
        match self {
            Section::Books => &[
                Action::ListBooks,
                Action::AddBook,
                Action::UpdateBook,
                Action::RemoveBook,
            ],
            Section::Authors => &[
                Action::ListAuthorsAndBooks,
                Action::BooksByAuthor,
                Action::AddAuthor,
                Action::RemoveAuthor,
            ],
            Section::Borrowers => &[Action::ListBorrowers, Action::RegisterBorrower],
            Section::Lending => &[
                Action::BorrowBook,
                Action::ReturnBook,
                Action::ShowOpenRecords,
                Action::ShowAllRecords,
            ],
            Section::Transfer => &[Action::ImportBooks, Action::ExportBooks],
        }
    }
}

/// Every operation reachable from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    ListBooks,
    AddBook,
    UpdateBook,
    RemoveBook,
    ListAuthorsAndBooks,
    BooksByAuthor,
    AddAuthor,
    RemoveAuthor,
    ListBorrowers,
    RegisterBorrower,
    BorrowBook,
    ReturnBook,
    ShowOpenRecords,
    ShowAllRecords,
    ImportBooks,
    ExportBooks,
}

impl Action {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Action::ListBooks => "List Books",
            Action::AddBook => "Add Book",
            Action::UpdateBook => "Update Book",
            Action::RemoveBook => "Remove Book",
            Action::ListAuthorsAndBooks => "List Authors and Books",
            Action::BooksByAuthor => "Books by Author",
            Action::AddAuthor => "Add Author",
            Action::RemoveAuthor => "Remove Author",
            Action::ListBorrowers => "List Borrowers",
            Action::RegisterBorrower => "Register Borrower",
            Action::BorrowBook => "Borrow Book",
            Action::ReturnBook => "Return Book",
            Action::ShowOpenRecords => "Open Borrow Records",
            Action::ShowAllRecords => "All Borrow Records",
            Action::ImportBooks => "Import Books",
            Action::ExportBooks => "Export Books",
        }
    }
}

/// What pressing Enter on the highlighted entry means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuChoice {
    Opened(Section),
    Run(Action),
    Quit,
}

/// Cursor position inside the nested menu.
#[derive(Debug, Clone, Default)]
pub(crate) struct MenuState {
    pub(crate) section: Option<Section>,
    pub(crate) selected: usize,
}

impl MenuState {
    pub(crate) fn title(&self) -> &'static str {
        self.section
            .map(Section::title)
            .unwrap_or("Library Management System")
    }

    /// Labels for the current level. The top level ends with "Quit".
    pub(crate) fn entries(&self) -> Vec<&'static str> {
        match self.section {
            Some(section) => section.actions().iter().map(|a| a.label()).collect(),
            None => Section::ALL
                .iter()
                .map(|s| s.title())
                .chain(std::iter::once("Quit"))
                .collect(),
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        let len = self.entries().len();
        if len == 0 {
            return;
        }
        let next = self.selected as isize + offset;
        self.selected = next.rem_euclid(len as isize) as usize;
    }

    pub(crate) fn choose(&mut self) -> MenuChoice {
        match self.section {
            Some(section) => {
                let actions = section.actions();
                MenuChoice::Run(actions[self.selected.min(actions.len() - 1)])
            }
            None => match Section::ALL.get(self.selected) {
                Some(section) => {
                    self.section = Some(*section);
                    self.selected = 0;
                    MenuChoice::Opened(*section)
                }
                None => MenuChoice::Quit,
            },
        }
    }

    /// Step back to the top level, keeping the section highlighted. Returns
    /// `false` when already at the top.
    pub(crate) fn back(&mut self) -> bool {
        match self.section.take() {
            Some(section) => {
                self.selected = Section::ALL
                    .iter()
                    .position(|s| *s == section)
                    .unwrap_or_default();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigates_into_and_out_of_sections() {
        let mut menu = MenuState::default();
        menu.move_selection(3);
        assert_eq!(menu.choose(), MenuChoice::Opened(Section::Lending));
        assert_eq!(menu.entries()[0], "Borrow Book");

        menu.move_selection(1);
        assert_eq!(menu.choose(), MenuChoice::Run(Action::ReturnBook));

        assert!(menu.back());
        assert_eq!(menu.selected, 3);
        assert!(!menu.back());
    }

    #[test]
    fn selection_wraps_and_last_entry_quits() {
        let mut menu = MenuState::default();
        menu.move_selection(-1);
        assert_eq!(menu.entries()[menu.selected], "Quit");
        assert_eq!(menu.choose(), MenuChoice::Quit);
    }
}
