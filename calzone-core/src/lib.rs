//! Event ledger and calendar rendering engine for calzone.
//!
//! Events live in plain-text per-month ledgers (`MM_YYYY.csv`), one line
//! per event. This crate provides:
//! - `record`: the row format and submission validation
//! - `ledger`: append, read and rewrite of month ledgers
//! - `render`: current/next month display entries and HTML fragments
//! - `deletion`: the request/confirm deletion workflow

pub mod calzone;
pub mod config;
pub mod deletion;
pub mod display;
pub mod error;
pub mod event;
pub mod ledger;
pub mod month;
pub mod record;
pub mod render;

pub use calzone::Calzone;
pub use error::{CalzoneError, CalzoneResult, RecordError};
pub use event::{Categories, ClockTime, Event, EventSubmission};
pub use month::LedgerKey;
