//! Calendar rendering.
//!
//! Turns the current and next month ledgers into display entries and the
//! HTML fragments the front end swaps into the page.

use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::display::{DisplayTime, escape_title};
use crate::error::{CalzoneError, CalzoneResult};
use crate::event::Categories;
use crate::ledger::LedgerStore;
use crate::month::LedgerKey;
use crate::record::decode;

pub const NO_EVENTS: &str = "<p>No events for this month.</p>";

/// One event ready for display, with the address needed to delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayEntry {
    pub key: LedgerKey,
    pub position: usize,
    /// HTML-escaped title
    pub title: String,
    pub start: DisplayTime,
    pub end: Option<DisplayTime>,
    pub category: String,
    pub day: u8,
}

impl DisplayEntry {
    fn write_html(&self, out: &mut String) {
        let times = match &self.end {
            Some(end) => format!("{} - {}", self.start, end),
            None => self.start.to_string(),
        };

        let _ = write!(
            out,
            "\n<div class=\"eventWrapper\"><div class=\"eventContainer\">\
             <p><span class=\"evTitle\">{title}</span></p>\n\
             <p>{times}</p>\n\
             <p>{category} - {month} {day}</p></div>\
             <form hx-post=\"/mod\" hx-target=\"#dialog\" hx-swap=\"outerHTML\" hx-indicator=\"#throbber\" style=\"display: grid;\" method=\"post\">\n\
             <input type=\"text\" name=\"month\" value=\"{mm}\" style=\"display: none;\">\n\
             <input type=\"text\" name=\"year\" value=\"{year}\" style=\"display: none;\">\n\
             <button type=\"submit\" name=\"del\" class=\"delButton material-symbols-rounded\" value=\"{position}\">delete</button>\n\
             </form>\n</div>",
            title = self.title,
            category = self.category,
            month = self.key.month_name(),
            day = self.day,
            mm = self.key.month_padded(),
            year = self.key.year(),
            position = self.position,
        );
    }
}

/// Events of one month, in ledger order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthView {
    pub key: LedgerKey,
    pub entries: Vec<DisplayEntry>,
}

impl MonthView {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The month's block list, or the "no events" placeholder.
    pub fn to_html(&self) -> String {
        if self.entries.is_empty() {
            return NO_EVENTS.to_string();
        }

        let mut out = String::new();
        for entry in &self.entries {
            entry.write_html(&mut out);
        }
        out
    }

    fn write_section(&self, out: &mut String) {
        let _ = write!(
            out,
            "<h1>{}</h1>\n<div class=\"monthContainer\">{}</div>",
            self.key.month_name(),
            self.to_html()
        );
    }
}

/// The current month and the one after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    pub current: MonthView,
    pub next: MonthView,
}

impl CalendarView {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.current.write_section(&mut out);
        out.push('\n');
        self.next.write_section(&mut out);
        out
    }
}

pub struct Renderer<'a> {
    store: &'a LedgerStore,
    categories: &'a Categories,
}

impl<'a> Renderer<'a> {
    pub fn new(store: &'a LedgerStore, categories: &'a Categories) -> Self {
        Renderer { store, categories }
    }

    pub fn render(&self, now: NaiveDate) -> CalzoneResult<CalendarView> {
        let current = LedgerKey::from_date(now)
            .ok_or_else(|| CalzoneError::Validation(format!("Date out of range: {now}")))?;
        let next = current
            .next()
            .ok_or_else(|| CalzoneError::Validation(format!("Date out of range: {now}")))?;

        Ok(CalendarView {
            current: self.render_month(current)?,
            next: self.render_month(next)?,
        })
    }

    /// Stops at the first row that fails to decode.
    pub fn render_month(&self, key: LedgerKey) -> CalzoneResult<MonthView> {
        let rows = self.store.read_all(key)?;
        let mut entries = Vec::with_capacity(rows.len());

        for (position, row) in rows.iter().enumerate() {
            let event = decode(row, self.categories).map_err(|source| {
                warn!(ledger = %key, position, error = %source, "corrupt record");
                CalzoneError::CorruptRecord {
                    ledger: key.file_name(),
                    position,
                    source,
                }
            })?;

            let category = self
                .categories
                .get(event.category)
                .unwrap_or_default()
                .to_string();

            entries.push(DisplayEntry {
                key,
                position,
                title: escape_title(&event.title),
                start: event.start.into(),
                end: event.end.map(DisplayTime::from),
                category,
                day: event.day,
            });
        }

        Ok(MonthView { key, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Meridiem;
    use crate::record::Row;

    fn append(store: &LedgerStore, key: LedgerKey, line: &str) {
        store.append(key, &Row::parse_line(line).unwrap()).unwrap();
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_months_render_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let categories = Categories::default();

        let view = Renderer::new(&store, &categories)
            .render(date(2025, 6, 14))
            .unwrap();

        assert!(view.current.is_empty());
        assert_eq!(view.current.to_html(), NO_EVENTS);
        assert_eq!(
            view.to_html(),
            "<h1>June</h1>\n<div class=\"monthContainer\"><p>No events for this month.</p></div>\n\
             <h1>July</h1>\n<div class=\"monthContainer\"><p>No events for this month.</p></div>"
        );
    }

    #[test]
    fn test_december_renders_january_of_next_year() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let categories = Categories::default();
        let january = LedgerKey::new(1, 2026).unwrap();
        append(&store, january, "08,00,-1,-1,02,0,\"Kickoff\"");

        let view = Renderer::new(&store, &categories)
            .render(date(2025, 12, 31))
            .unwrap();

        assert_eq!(view.current.key, LedgerKey::new(12, 2025).unwrap());
        assert_eq!(view.next.key, january);
        assert_eq!(view.next.entries[0].title, "Kickoff");
        assert!(view.current.is_empty());
    }

    #[test]
    fn test_entries_keep_ledger_order_and_format_times() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let categories = Categories::default();
        let june = LedgerKey::new(6, 2025).unwrap();
        append(&store, june, "15,30,-1,-1,20,1,\"Late\"");
        append(&store, june, "09,05,12,00,03,3,\"<b>Early</b>\"");

        let view = Renderer::new(&store, &categories)
            .render_month(june)
            .unwrap();

        let titles: Vec<_> = view.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Late", "&lt;b&gt;Early&lt;/b&gt;"]);

        let late = &view.entries[0];
        assert_eq!(late.start.label, "3:30");
        assert_eq!(late.start.meridiem, Meridiem::Pm);
        assert_eq!(late.end, None);
        assert_eq!(late.category, "Cascade");
        assert_eq!(late.position, 0);

        let early = &view.entries[1];
        assert_eq!(early.end.as_ref().map(|t| t.to_string()), Some("12:00 PM".into()));
        assert_eq!(early.position, 1);
        assert_eq!(early.day, 3);
    }

    #[test]
    fn test_block_html_carries_deletion_address() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let categories = Categories::default();
        let june = LedgerKey::new(6, 2025).unwrap();
        append(&store, june, "09,05,13,30,03,3,\"Dentist\"");

        let html = Renderer::new(&store, &categories)
            .render_month(june)
            .unwrap()
            .to_html();

        assert!(html.contains("<span class=\"evTitle\">Dentist</span>"));
        assert!(html.contains("<p>9:05 AM - 1:30 PM</p>"));
        assert!(html.contains("<p>Appointment - June 3</p>"));
        assert!(html.contains("name=\"month\" value=\"06\""));
        assert!(html.contains("name=\"year\" value=\"2025\""));
        assert!(html.contains("name=\"del\" class=\"delButton material-symbols-rounded\" value=\"0\""));
    }

    #[test]
    fn test_corrupt_row_aborts_render() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let categories = Categories::default();
        let june = LedgerKey::new(6, 2025).unwrap();
        append(&store, june, "09,05,-1,-1,03,3,\"fine\"");
        append(&store, june, "09,05,-1,-1,03,9,\"bad category\"");

        let err = Renderer::new(&store, &categories)
            .render(date(2025, 6, 1))
            .unwrap_err();

        assert!(matches!(err, CalzoneError::CorruptRecord { position: 1, .. }));
    }

    #[test]
    fn test_missing_end_checked_per_month() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let categories = Categories::default();
        append(&store, LedgerKey::new(6, 2025).unwrap(), "09,00,10,00,01,0,\"has end\"");
        append(&store, LedgerKey::new(7, 2025).unwrap(), "09,00,-1,-1,01,0,\"no end\"");

        let view = Renderer::new(&store, &categories)
            .render(date(2025, 6, 1))
            .unwrap();

        assert!(view.current.entries[0].end.is_some());
        assert!(view.next.entries[0].end.is_none());
    }
}
