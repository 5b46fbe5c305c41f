//! Month ledger addressing.

use std::fmt;

use chrono::{Datelike, Month, NaiveDate};
use serde::{Deserialize, Serialize};

/// Identifies one month ledger: calendar month 1–12 and a four-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    month: u32,
    year: i32,
}

impl LedgerKey {
    pub fn new(month: u32, year: i32) -> Option<Self> {
        ((1..=12).contains(&month) && (1000..=9999).contains(&year))
            .then_some(LedgerKey { month, year })
    }

    /// The ledger a given date belongs to.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.month(), date.year())
    }

    /// The following month, rolling December over into January of the next year.
    pub fn next(self) -> Option<Self> {
        if self.month == 12 {
            Self::new(1, self.year + 1)
        } else {
            Self::new(self.month + 1, self.year)
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Two-digit month, as used in file names and form fields.
    pub fn month_padded(&self) -> String {
        format!("{:02}", self.month)
    }

    /// `MM_YYYY.csv`
    pub fn file_name(&self) -> String {
        format!("{}.csv", self)
    }

    /// English month name, e.g. "October".
    pub fn month_name(&self) -> &'static str {
        Month::try_from(self.month as u8)
            .map(|m| m.name())
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}_{:04}", self.month, self.year)
    }
}
