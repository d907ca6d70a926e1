//! Clock abstraction so "current month" is testable.

use chrono::NaiveDate;

/// Source of today's date
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Clock pinned to a single date (tests, `--month` override)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(NaiveDate);

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// First day of `month` in the current local year
    pub fn for_month(month: u32) -> Option<Self> {
        use chrono::Datelike;

        let year = chrono::Local::now().year();
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
