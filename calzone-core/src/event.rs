//! Event types.
//!
//! An [`Event`] is what a ledger row decodes to. It carries no month or
//! year; those come from the ledger the row lives in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A time of day in 24-hour form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    /// Returns `None` unless hour is 0–23 and minute is 0–59.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour <= 23 && minute <= 59).then_some(ClockTime { hour, minute })
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A calendar event as stored in a month ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub start: ClockTime,
    pub end: Option<ClockTime>,
    /// Day of month, 1–31
    pub day: u8,
    /// Index into the configured [`Categories`]
    pub category: usize,
    /// Raw title; never HTML-escaped at rest
    pub title: String,
}

/// The raw fields of an event submission, as they arrive from the form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventSubmission {
    /// `HH:MM`, 24-hour
    #[serde(rename = "evTime", default)]
    pub time: String,
    /// `HH:MM` or empty
    #[serde(rename = "evTimeEnd", default)]
    pub time_end: String,
    /// `YYYY-MM-DD`
    #[serde(rename = "evDate", default)]
    pub date: String,
    /// Single digit category index
    #[serde(rename = "evType", default)]
    pub event_type: String,
    #[serde(rename = "evName", default)]
    pub name: String,
    #[serde(default)]
    pub user: String,
}

static DEFAULT_CATEGORIES: [&str; 5] = [
    "Meeting",
    "Cascade",
    "Computer Setup",
    "Appointment",
    "Other",
];

/// The fixed, ordered list of event type names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Categories(Vec<String>);

impl Default for Categories {
    fn default() -> Self {
        Categories(DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect())
    }
}

impl Categories {
    pub fn new(names: Vec<String>) -> Self {
        Categories(names)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
