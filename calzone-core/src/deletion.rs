//! Two-step event deletion.
//!
//! A deletion is first requested, which only reads the ledger and returns
//! the event for the user to confirm. Confirming re-reads the ledger under
//! its write lock and removes the row if the position is still valid.

use tracing::info;

use crate::error::{CalzoneError, CalzoneResult};
use crate::ledger::LedgerStore;
use crate::month::LedgerKey;
use crate::record::Row;

/// Points at one row of one ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionRef {
    pub key: LedgerKey,
    pub position: usize,
}

impl DeletionRef {
    pub fn new(key: LedgerKey, position: usize) -> Self {
        DeletionRef { key, position }
    }

    /// Parse the raw form fields: a 1–2 digit month, a 4 digit year and a
    /// non-negative row position.
    pub fn parse(month: &str, year: &str, position: &str) -> CalzoneResult<Self> {
        let invalid = |msg: &str| CalzoneError::InvalidReference(msg.to_string());
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

        if !all_digits(position) {
            return Err(invalid("position must be a non-negative integer"));
        }
        if year.len() != 4 || !all_digits(year) {
            return Err(invalid("year must be 4 digits"));
        }
        if !(1..=2).contains(&month.len()) || !all_digits(month) {
            return Err(invalid("month must be 1 or 2 digits"));
        }

        let position = position
            .parse()
            .map_err(|_| invalid("position is too large"))?;
        let month: u32 = month.parse().map_err(|_| invalid("month must be 1 or 2 digits"))?;
        let year: i32 = year.parse().map_err(|_| invalid("year must be 4 digits"))?;

        let key = LedgerKey::new(month, year).ok_or_else(|| invalid("month must be 1-12"))?;
        Ok(DeletionRef { key, position })
    }
}

/// A deletion awaiting confirmation.
#[derive(Debug, Clone)]
pub struct PendingDeletion {
    reference: DeletionRef,
    row: Row,
}

impl PendingDeletion {
    pub fn reference(&self) -> DeletionRef {
        self.reference
    }

    /// The raw (unescaped) title of the event about to be removed.
    pub fn title(&self) -> &str {
        self.row.title().unwrap_or_default()
    }

    /// Finish the deletion. Fails closed if the row at the position is no
    /// longer the one that was shown.
    pub fn confirm(self, store: &LedgerStore, accepted: bool) -> CalzoneResult<DeletionOutcome> {
        if !accepted {
            return Ok(DeletionOutcome::Declined);
        }
        let removed = remove(store, self.reference, Some(&self.row))?;
        Ok(DeletionOutcome::Applied {
            title: removed.title().unwrap_or_default().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The user said no; nothing was touched.
    Declined,
    Applied { title: String },
}

/// Look up the referenced event without modifying anything.
pub fn request_deletion(store: &LedgerStore, reference: DeletionRef) -> CalzoneResult<PendingDeletion> {
    let rows = store.read_all(reference.key)?;
    let row = rows
        .get(reference.position)
        .cloned()
        .ok_or_else(|| out_of_range(reference, rows.len()))?;

    Ok(PendingDeletion { reference, row })
}

/// Confirm a deletion from a fresh request, knowing only the position.
pub fn confirm_deletion(
    store: &LedgerStore,
    reference: DeletionRef,
    accepted: bool,
) -> CalzoneResult<DeletionOutcome> {
    if !accepted {
        return Ok(DeletionOutcome::Declined);
    }
    let removed = remove(store, reference, None)?;
    Ok(DeletionOutcome::Applied {
        title: removed.title().unwrap_or_default().to_string(),
    })
}

fn remove(store: &LedgerStore, reference: DeletionRef, expected: Option<&Row>) -> CalzoneResult<Row> {
    let removed = store.update(reference.key, |rows| {
        let current = rows
            .get(reference.position)
            .ok_or_else(|| out_of_range(reference, rows.len()))?;

        if expected.is_some_and(|row| row != current) {
            return Err(out_of_range(reference, rows.len()));
        }

        Ok(rows.remove(reference.position))
    })?;

    info!(ledger = %reference.key, position = reference.position, "deleted event");
    Ok(removed)
}

fn out_of_range(reference: DeletionRef, len: usize) -> CalzoneError {
    CalzoneError::OutOfRange {
        ledger: reference.key.file_name(),
        position: reference.position,
        len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> LedgerKey {
        LedgerKey::new(3, 2025).unwrap()
    }

    fn row(title: &str) -> Row {
        Row::parse_line(&format!("10,00,-1,-1,01,0,\"{}\"", title)).unwrap()
    }

    fn seeded(titles: &[&str]) -> (tempfile::TempDir, LedgerStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        for title in titles {
            store.append(key(), &row(title)).unwrap();
        }
        (dir, store)
    }

    fn titles(store: &LedgerStore) -> Vec<String> {
        store
            .read_all(key())
            .unwrap()
            .iter()
            .map(|r| r.title().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_parse_reference() {
        let reference = DeletionRef::parse("3", "2025", "2").unwrap();
        assert_eq!(reference, DeletionRef::new(key(), 2));
        assert_eq!(DeletionRef::parse("03", "2025", "0").unwrap().key, key());
    }

    #[test]
    fn test_parse_rejects_malformed_reference() {
        for (month, year, position) in [
            ("3", "2025", "-1"),
            ("3", "2025", ""),
            ("3", "2025", "x"),
            ("3", "25", "0"),
            ("3", "20255", "0"),
            ("003", "2025", "0"),
            ("", "2025", "0"),
            ("13", "2025", "0"),
            ("00", "2025", "0"),
        ] {
            let err = DeletionRef::parse(month, year, position).unwrap_err();
            assert!(
                matches!(err, CalzoneError::InvalidReference(_)),
                "{month}/{year}/{position}"
            );
        }
    }

    #[test]
    fn test_request_does_not_mutate() {
        let (_dir, store) = seeded(&["a", "b"]);
        let pending = request_deletion(&store, DeletionRef::new(key(), 1)).unwrap();
        assert_eq!(pending.title(), "b");
        assert_eq!(titles(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_request_out_of_range() {
        let (_dir, store) = seeded(&["a"]);
        let err = request_deletion(&store, DeletionRef::new(key(), 1)).unwrap_err();
        assert!(matches!(err, CalzoneError::OutOfRange { position: 1, len: 1, .. }));
    }

    #[test]
    fn test_declined_is_a_no_op() {
        let (_dir, store) = seeded(&["a", "b"]);
        let pending = request_deletion(&store, DeletionRef::new(key(), 0)).unwrap();
        assert_eq!(pending.confirm(&store, false).unwrap(), DeletionOutcome::Declined);
        assert_eq!(titles(&store), vec!["a", "b"]);
    }

    #[test]
    fn test_confirm_removes_only_that_row() {
        let (_dir, store) = seeded(&["a", "b", "c", "d"]);
        let outcome = confirm_deletion(&store, DeletionRef::new(key(), 1), true).unwrap();
        assert_eq!(outcome, DeletionOutcome::Applied { title: "b".into() });
        assert_eq!(titles(&store), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_confirm_out_of_range_leaves_ledger() {
        let (_dir, store) = seeded(&["a", "b"]);
        let before = std::fs::read_to_string(store.path_for(key())).unwrap();

        let err = confirm_deletion(&store, DeletionRef::new(key(), 2), true).unwrap_err();
        assert!(matches!(err, CalzoneError::OutOfRange { .. }));
        assert_eq!(std::fs::read_to_string(store.path_for(key())).unwrap(), before);
    }

    #[test]
    fn test_pending_fails_closed_when_rows_shift() {
        let (_dir, store) = seeded(&["a", "b", "c"]);
        let pending = request_deletion(&store, DeletionRef::new(key(), 1)).unwrap();

        // someone else removes "a", so "c" now sits at position 1
        confirm_deletion(&store, DeletionRef::new(key(), 0), true).unwrap();

        let err = pending.confirm(&store, true).unwrap_err();
        assert!(matches!(err, CalzoneError::OutOfRange { .. }));
        assert_eq!(titles(&store), vec!["b", "c"]);
    }

    #[test]
    fn test_pending_fails_when_ledger_shrinks() {
        let (_dir, store) = seeded(&["a", "b"]);
        let pending = request_deletion(&store, DeletionRef::new(key(), 1)).unwrap();
        store.rewrite_all(key(), &[row("a")]).unwrap();

        let err = pending.confirm(&store, true).unwrap_err();
        assert!(matches!(err, CalzoneError::OutOfRange { position: 1, len: 1, .. }));
    }
}
