//! The operations the HTTP layer calls into.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use crate::config::CalzoneConfig;
use crate::deletion::{self, DeletionOutcome, DeletionRef, PendingDeletion};
use crate::error::CalzoneResult;
use crate::event::{Categories, Event, EventSubmission};
use crate::ledger::LedgerStore;
use crate::month::LedgerKey;
use crate::record::{self, Row};
use crate::render::{CalendarView, Renderer};

pub struct Calzone {
    store: LedgerStore,
    categories: Categories,
}

impl Calzone {
    pub fn new(storage_root: impl Into<PathBuf>, categories: Categories) -> Self {
        Calzone {
            store: LedgerStore::new(storage_root),
            categories,
        }
    }

    pub fn from_config(config: &CalzoneConfig) -> Self {
        Self::new(config.storage_path(), config.categories.clone())
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    /// Validate a submission and append it to its month's ledger.
    pub fn submit_event(&self, submission: &EventSubmission) -> CalzoneResult<(LedgerKey, Event)> {
        let (key, event) = record::validate(submission, &self.categories)?;

        info!(
            user = %submission.user,
            date = %submission.date,
            time = %submission.time,
            title = %event.title,
            category = event.category,
            "event request"
        );

        self.store.append(key, &Row::from_event(&event))?;
        Ok((key, event))
    }

    pub fn render_calendar(&self, now: NaiveDate) -> CalzoneResult<CalendarView> {
        Renderer::new(&self.store, &self.categories).render(now)
    }

    pub fn request_deletion(&self, reference: DeletionRef) -> CalzoneResult<PendingDeletion> {
        deletion::request_deletion(&self.store, reference)
    }

    pub fn confirm_deletion(
        &self,
        reference: DeletionRef,
        accepted: bool,
    ) -> CalzoneResult<DeletionOutcome> {
        deletion::confirm_deletion(&self.store, reference, accepted)
    }
}
