// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::{cell::RefCell, path::Path};
use tmuxnote::{
    notify::Notify, Change, JournalFormat, JournalStore, MergePolicy, Record, Source,
};

pub(crate) struct JournalFixture {
    store: JournalStore,
    policy: MergePolicy,
    notices: Recorder,
}

impl JournalFixture {
    pub(crate) fn new(path: impl AsRef<Path>, format: JournalFormat) -> Self {
        Self {
            store: JournalStore::new(path.as_ref(), format),
            policy: MergePolicy::default(),
            notices: Recorder::default(),
        }
    }

    pub(crate) fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub(crate) fn store(&self) -> &JournalStore {
        &self.store
    }

    pub(crate) fn update(&self, record: &Record, now: NaiveDateTime) -> Result<Change> {
        Ok(self.store.update(record, &self.policy, now, &self.notices)?)
    }

    pub(crate) fn contents(&self) -> Result<String> {
        Ok(std::fs::read_to_string(self.store.path())?)
    }

    pub(crate) fn notices(&self) -> Vec<(Source, String)> {
        self.notices.seen.borrow().clone()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Recorder {
    seen: RefCell<Vec<(Source, String)>>,
}

impl Notify for Recorder {
    fn notify(&self, source: Source, message: &str) {
        self.seen.borrow_mut().push((source, message.to_string()));
    }
}

/// Time of day on Friday, 2026-10-16.
pub(crate) fn friday(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .and_then(|day| day.and_hms_opt(hour, minute, 0))
        .unwrap_or_default()
}
