//! Ledger row codec.
//!
//! One event is one line:
//!
//! ```text
//! startHour,startMinute,endHour,endMinute,dayOfMonth,eventTypeIndex,"title"
//! ```
//!
//! A missing end time is written as `-1,-1`. The title is always quoted,
//! with embedded quotes doubled, so it may contain commas.

use chrono::{Datelike, NaiveDate};

use crate::error::{CalzoneError, CalzoneResult, RecordError};
use crate::event::{Categories, ClockTime, Event, EventSubmission};
use crate::month::LedgerKey;

pub const MAX_TITLE_CHARS: usize = 100;

const FIELD_COUNT: usize = 7;
const NO_END: &str = "-1";

/// The flat, undecoded fields of one ledger line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    fields: Vec<String>,
}

impl Row {
    pub fn from_event(event: &Event) -> Self {
        let (end_hour, end_minute) = match event.end {
            Some(end) => (format!("{:02}", end.hour), format!("{:02}", end.minute)),
            None => (NO_END.to_string(), NO_END.to_string()),
        };

        Row {
            fields: vec![
                format!("{:02}", event.start.hour),
                format!("{:02}", event.start.minute),
                end_hour,
                end_minute,
                format!("{:02}", event.day),
                event.category.to_string(),
                event.title.clone(),
            ],
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The last field, which holds the title in a well-formed row.
    pub fn title(&self) -> Option<&str> {
        self.fields.last().map(String::as_str)
    }

    /// Serialize without the trailing newline.
    pub fn to_line(&self) -> String {
        let mut line = String::new();
        let last = self.fields.len().saturating_sub(1);

        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            let quote = i == last || field.contains([',', '"']);
            if quote {
                line.push('"');
                line.push_str(&field.replace('"', "\"\""));
                line.push('"');
            } else {
                line.push_str(field);
            }
        }

        line
    }

    /// Split one ledger line into fields. Quoted fields may contain commas
    /// and doubled quotes; unquoted fields are taken verbatim.
    pub fn parse_line(line: &str) -> Result<Self, RecordError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut fields = Vec::with_capacity(FIELD_COUNT);
        let mut chars = line.chars().peekable();

        loop {
            let mut field = String::new();

            if chars.peek() == Some(&'"') {
                chars.next();
                loop {
                    match chars.next() {
                        Some('"') if chars.peek() == Some(&'"') => {
                            chars.next();
                            field.push('"');
                        }
                        Some('"') => break,
                        Some(c) => field.push(c),
                        None => return Err(RecordError::UnterminatedQuote),
                    }
                }
                match chars.peek() {
                    None | Some(',') => {}
                    Some(_) => return Err(RecordError::TrailingAfterQuote),
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    field.push(c);
                    chars.next();
                }
            }

            fields.push(field);

            match chars.next() {
                Some(',') => continue,
                _ => break,
            }
        }

        Ok(Row { fields })
    }
}

/// Check a submission and turn it into an event plus the ledger it belongs in.
pub fn validate(
    submission: &EventSubmission,
    categories: &Categories,
) -> CalzoneResult<(LedgerKey, Event)> {
    let invalid = |msg: &str| CalzoneError::Validation(msg.to_string());

    if submission.time.len() != 5
        || (submission.time_end.len() != 5 && !submission.time_end.is_empty())
        || submission.date.len() != 10
        || submission.event_type.len() != 1
    {
        return Err(invalid("Malformed time, date or event type"));
    }

    if submission.name.chars().count() > MAX_TITLE_CHARS {
        return Err(invalid("Name exceeds 100 characters"));
    }

    if submission.name.is_empty() || submission.user.is_empty() {
        return Err(invalid("Form not sent correctly."));
    }

    if submission.name.contains(['\n', '\r']) {
        return Err(invalid("Name must be a single line"));
    }

    let start = parse_hhmm(&submission.time).ok_or_else(|| invalid("Invalid start time"))?;
    let end = if submission.time_end.is_empty() {
        None
    } else {
        Some(parse_hhmm(&submission.time_end).ok_or_else(|| invalid("Invalid end time"))?)
    };

    let date = parse_ymd(&submission.date).ok_or_else(|| invalid("Invalid date"))?;
    let key = LedgerKey::from_date(date).ok_or_else(|| invalid("Invalid date"))?;

    let category = submission
        .event_type
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as usize)
        .filter(|&index| index < categories.len())
        .ok_or_else(|| invalid("Unknown event type"))?;

    let event = Event {
        start,
        end,
        day: date.day() as u8,
        category,
        title: submission.name.clone(),
    };

    Ok((key, event))
}

/// Validate a submission and produce the row to append.
pub fn encode(
    submission: &EventSubmission,
    categories: &Categories,
) -> CalzoneResult<(LedgerKey, Row)> {
    let (key, event) = validate(submission, categories)?;
    Ok((key, Row::from_event(&event)))
}

/// Decode a stored row into an event.
pub fn decode(row: &Row, categories: &Categories) -> Result<Event, RecordError> {
    let fields = row.fields();
    if fields.len() != FIELD_COUNT {
        return Err(RecordError::FieldCount(fields.len()));
    }

    let start_hour = parse_number("start hour", &fields[0])?;
    let start_minute = parse_number("start minute", &fields[1])?;
    let end_hour = parse_number("end hour", &fields[2])?;
    let end_minute = parse_number("end minute", &fields[3])?;
    let day = parse_number("day", &fields[4])?;
    let category = parse_number("event type", &fields[5])?;

    let start = clock_time(start_hour, start_minute)?;
    let end = match (end_hour, end_minute) {
        (-1, -1) => None,
        (-1, _) | (_, -1) => return Err(RecordError::PartialEndTime),
        (h, m) => Some(clock_time(h, m)?),
    };

    let day = in_range("day", day, 1, 31)? as u8;
    let category = in_range("event type", category, 0, i64::MAX)? as usize;
    if category >= categories.len() {
        return Err(RecordError::UnknownCategory {
            index: category,
            len: categories.len(),
        });
    }

    Ok(Event {
        start,
        end,
        day,
        category,
        title: fields[6].clone(),
    })
}

fn parse_hhmm(s: &str) -> Option<ClockTime> {
    let (hour, minute) = s.split_once(':')?;
    if hour.len() != 2 || minute.len() != 2 {
        return None;
    }
    if !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    ClockTime::new(hour.parse().ok()?, minute.parse().ok()?)
}

/// Strict `YYYY-MM-DD`: chrono alone lets padded fields like `2025- 3-14` through.
fn parse_ymd(s: &str) -> Option<NaiveDate> {
    let shape_ok = s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_number(field: &'static str, value: &str) -> Result<i64, RecordError> {
    value.parse().map_err(|_| RecordError::NotNumeric {
        field,
        value: value.to_string(),
    })
}

fn in_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<i64, RecordError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(RecordError::OutOfRange { field, value })
    }
}

fn clock_time(hour: i64, minute: i64) -> Result<ClockTime, RecordError> {
    let hour = in_range("hour", hour, 0, 23)?;
    let minute = in_range("minute", minute, 0, 59)?;
    Ok(ClockTime {
        hour: hour as u8,
        minute: minute as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> EventSubmission {
        EventSubmission {
            time: "09:05".to_string(),
            time_end: "13:30".to_string(),
            date: "2025-06-14".to_string(),
            event_type: "3".to_string(),
            name: "Dentist, downtown".to_string(),
            user: "alice".to_string(),
        }
    }

    #[test]
    fn test_encode_writes_padded_fields_and_quoted_title() {
        let (key, row) = encode(&submission(), &Categories::default()).unwrap();
        assert_eq!(key, LedgerKey::new(6, 2025).unwrap());
        assert_eq!(row.to_line(), "09,05,13,30,14,3,\"Dentist, downtown\"");
    }

    #[test]
    fn test_encode_absent_end_uses_sentinel() {
        let mut sub = submission();
        sub.time_end.clear();
        let (_, row) = encode(&sub, &Categories::default()).unwrap();
        assert_eq!(row.to_line(), "09,05,-1,-1,14,3,\"Dentist, downtown\"");

        let event = decode(&row, &Categories::default()).unwrap();
        assert_eq!(event.end, None);
    }

    #[test]
    fn test_encode_rejects_bad_shapes() {
        let categories = Categories::default();
        let cases: [fn(&mut EventSubmission); 16] = [
            |s: &mut EventSubmission| s.time = "9:05".into(),
            |s: &mut EventSubmission| s.time = "24:00".into(),
            |s: &mut EventSubmission| s.time = "ab:cd".into(),
            |s: &mut EventSubmission| s.time_end = "1:30".into(),
            |s: &mut EventSubmission| s.date = "2025-6-14".into(),
            |s: &mut EventSubmission| s.date = "2025-02-30".into(),
            |s: &mut EventSubmission| s.date = "2025- 3-14".into(),
            |s: &mut EventSubmission| s.date = "2025-03- 4".into(),
            |s: &mut EventSubmission| s.date = "2025/03/14".into(),
            |s: &mut EventSubmission| s.event_type = "12".into(),
            |s: &mut EventSubmission| s.event_type = "x".into(),
            |s: &mut EventSubmission| s.event_type = "7".into(),
            |s: &mut EventSubmission| s.name = "a".repeat(101),
            |s: &mut EventSubmission| s.name.clear(),
            |s: &mut EventSubmission| s.user.clear(),
            |s: &mut EventSubmission| s.name = "two\nlines".into(),
        ];

        for mutate in cases {
            let mut sub = submission();
            mutate(&mut sub);
            let err = encode(&sub, &categories).unwrap_err();
            assert!(matches!(err, CalzoneError::Validation(_)), "{:?}", sub);
        }
    }

    #[test]
    fn test_title_of_exactly_100_chars_is_accepted() {
        let mut sub = submission();
        sub.name = "é".repeat(100);
        assert!(encode(&sub, &Categories::default()).is_ok());
    }

    #[test]
    fn test_title_is_stored_unescaped() {
        let mut sub = submission();
        sub.name = "<script>\"hi\"</script>".to_string();
        let (_, row) = encode(&sub, &Categories::default()).unwrap();
        assert_eq!(
            row.to_line(),
            "09,05,13,30,14,3,\"<script>\"\"hi\"\"</script>\""
        );
        let parsed = Row::parse_line(&row.to_line()).unwrap();
        assert_eq!(parsed.title(), Some("<script>\"hi\"</script>"));
    }

    #[test]
    fn test_parse_line_accepts_unquoted_title() {
        let row = Row::parse_line("14,00,-1,-1,03,0,Standup\r").unwrap();
        let event = decode(&row, &Categories::default()).unwrap();
        assert_eq!(event.title, "Standup");
        assert_eq!(event.start, ClockTime { hour: 14, minute: 0 });
        assert_eq!(event.day, 3);
    }

    #[test]
    fn test_parse_line_errors() {
        assert_eq!(
            Row::parse_line("1,2,3,4,5,6,\"open"),
            Err(RecordError::UnterminatedQuote)
        );
        assert_eq!(
            Row::parse_line("1,2,3,4,5,6,\"closed\"x"),
            Err(RecordError::TrailingAfterQuote)
        );
    }

    #[test]
    fn test_decode_errors() {
        let categories = Categories::default();
        let decode_line = |line: &str| decode(&Row::parse_line(line).unwrap(), &categories);

        assert_eq!(
            decode_line("09,05,-1,-1,14,3"),
            Err(RecordError::FieldCount(6))
        );
        assert!(matches!(
            decode_line("nine,05,-1,-1,14,3,\"x\""),
            Err(RecordError::NotNumeric { field: "start hour", .. })
        ));
        assert_eq!(
            decode_line("09,05,-1,-1,14,5,\"x\""),
            Err(RecordError::UnknownCategory { index: 5, len: 5 })
        );
        assert_eq!(
            decode_line("09,05,-1,30,14,1,\"x\""),
            Err(RecordError::PartialEndTime)
        );
        assert!(matches!(
            decode_line("25,05,-1,-1,14,1,\"x\""),
            Err(RecordError::OutOfRange { field: "hour", value: 25 })
        ));
        assert!(matches!(
            decode_line("09,05,-1,-1,0,1,\"x\""),
            Err(RecordError::OutOfRange { field: "day", value: 0 })
        ));
    }

    #[test]
    fn test_decode_midnight_start() {
        let row = Row::parse_line("00,00,-1,-1,01,4,\"Midnight\"").unwrap();
        let event = decode(&row, &Categories::default()).unwrap();
        assert_eq!(event.start, ClockTime { hour: 0, minute: 0 });
    }
}
