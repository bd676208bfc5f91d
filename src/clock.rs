//! Current-date providers. Lending operations never read the system clock
//! directly so tests can pin "today".

use chrono::Local;

use crate::models::LibraryDate;

pub trait Clock {
    fn today(&self) -> LibraryDate;
}

/// Reads the local calendar date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> LibraryDate {
        LibraryDate::new(Local::now().date_naive())
    }
}

/// Always answers with the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub LibraryDate);

impl Clock for FixedClock {
    fn today(&self) -> LibraryDate {
        self.0
    }
}
