//! Human-readable forms of stored fields.

use std::fmt;

use serde::Serialize;

use crate::event::ClockTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Meridiem {
    Am,
    Pm,
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Meridiem::Am => write!(f, "AM"),
            Meridiem::Pm => write!(f, "PM"),
        }
    }
}

/// A 12-hour clock label such as `9:05` with its meridiem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayTime {
    pub label: String,
    pub meridiem: Meridiem,
}

impl fmt::Display for DisplayTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.label, self.meridiem)
    }
}

/// Convert a 24-hour time to 12-hour form. Hour 0 is 12 AM.
pub fn format_for_display(hour: u8, minute: u8) -> DisplayTime {
    let (display_hour, meridiem) = match hour {
        0 => (12, Meridiem::Am),
        1..=11 => (hour, Meridiem::Am),
        12 => (12, Meridiem::Pm),
        _ => (hour - 12, Meridiem::Pm),
    };

    DisplayTime {
        label: format!("{}:{:02}", display_hour, minute),
        meridiem,
    }
}

impl From<ClockTime> for DisplayTime {
    fn from(time: ClockTime) -> Self {
        format_for_display(time.hour, time.minute)
    }
}

/// Escape angle brackets for HTML output.
pub fn escape_title(title: &str) -> String {
    title.replace('<', "&lt;").replace('>', "&gt;")
}
