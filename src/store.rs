// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Journal file management.
//!
//! The journal store owns no state between calls. Every update is one full
//! cycle:
//!
//! 1. Read the whole journal file, where a missing file is an empty journal.
//! 2. Merge the record in memory, producing the complete new content.
//! 3. Rewrite the whole file, but only if the merge changed something.
//! 4. Fire notifications for new lines.
//!
//! Only one process is expected to touch the journal at a time. Nothing here
//! locks the file.

use crate::{
    journal::{self, Change, Journal, JournalFormat, MergePolicy},
    notify::Notify,
    record::Record,
};

use chrono::NaiveDateTime;
use std::{
    fs::{read, write},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Read, merge, and rewrite the journal file.
#[derive(Clone, Debug)]
pub struct JournalStore {
    path: PathBuf,
    format: JournalFormat,
}

impl JournalStore {
    /// Construct new journal store.
    ///
    /// Nothing is touched on disk until the first update.
    pub fn new(path: impl Into<PathBuf>, format: JournalFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Location of journal file.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Encoding of journal file.
    pub fn format(&self) -> JournalFormat {
        self.format
    }

    /// Read raw journal content.
    ///
    /// A missing journal file reads as empty content. Invalid UTF-8 is
    /// replaced rather than rejected, leaving the locator to skip whatever
    /// no longer forms a segment.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ReadJournal`] if journal exists but cannot be
    ///   read.
    pub fn read(&self) -> Result<String> {
        match read(&self.path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no journal at {:?} yet", self.path.display());
                Ok(String::new())
            }
            Err(err) => Err(StoreError::ReadJournal {
                source: err,
                journal_path: self.path.clone(),
            }),
        }
    }

    /// Load decoded journal.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ReadJournal`] if journal exists but cannot be
    ///   read.
    pub fn load(&self) -> Result<Journal> {
        Ok(self.format.decode(&self.read()?))
    }

    /// Merge record into journal file.
    ///
    /// The file is only rewritten when the merge changed something, and the
    /// notifier only fires after a successful write that added a line.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::ReadJournal`] if journal cannot be read.
    /// - Return [`StoreError::Journal`] if new journal cannot be encoded.
    /// - Return [`StoreError::CreateParent`] if journal directory cannot be
    ///   created.
    /// - Return [`StoreError::WriteJournal`] if journal cannot be written.
    #[instrument(skip(self, policy, notifier), level = "debug")]
    pub fn update(
        &self,
        record: &Record,
        policy: &MergePolicy,
        now: NaiveDateTime,
        notifier: &impl Notify,
    ) -> Result<Change> {
        let existing = self.read()?;
        let merged = journal::apply(self.format, &existing, record, policy, now)?;

        let Some(content) = merged.content else {
            debug!("journal unchanged by {} record", record.source);
            return Ok(merged.change);
        };

        self.write(&content)?;
        info!("{} segment {:?}", record.source, merged.change);

        if let Some(notice) = merged.change.notice() {
            notifier.notify(record.source, notice);
        }

        Ok(merged.change)
    }

    fn write(&self, content: &str) -> Result<()> {
        // INVARIANT: Create parent directories of journal if needed.
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            mkdirp::mkdirp(parent).map_err(|err| StoreError::CreateParent {
                source: err,
                journal_path: self.path.clone(),
            })?;
        }

        write(&self.path, content.as_bytes()).map_err(|err| StoreError::WriteJournal {
            source: err,
            journal_path: self.path.clone(),
        })
    }
}

/// Journal store error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Journal file cannot be read from.
    #[error("failed to read journal at {:?}", journal_path.display())]
    ReadJournal {
        #[source]
        source: std::io::Error,
        journal_path: PathBuf,
    },

    /// Journal directory cannot be created when missing.
    #[error("failed to create directory of journal at {:?}", journal_path.display())]
    CreateParent {
        #[source]
        source: std::io::Error,
        journal_path: PathBuf,
    },

    /// Journal file cannot be written to.
    #[error("failed to write journal at {:?}", journal_path.display())]
    WriteJournal {
        #[source]
        source: std::io::Error,
        journal_path: PathBuf,
    },

    /// Journal content cannot be encoded.
    #[error(transparent)]
    Journal(#[from] crate::journal::JournalError),
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Source;
    use chrono::NaiveDate;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(Source, String)>>,
    }

    impl Notify for Recorder {
        fn notify(&self, source: Source, message: &str) {
            self.seen.borrow_mut().push((source, message.to_string()));
        }
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[sealed_test]
    fn missing_journal_reads_empty() -> anyhow::Result<()> {
        let store = JournalStore::new("missing.journal", JournalFormat::Text);
        assert_eq!(store.read()?, "");
        assert!(store.load()?.is_empty());
        Ok(())
    }

    #[sealed_test]
    fn update_writes_and_notifies_once() -> anyhow::Result<()> {
        let store = JournalStore::new("run/tmuxnote.journal", JournalFormat::Text);
        let policy = MergePolicy::default();
        let notifier = Recorder::default();
        let record = Record::append(Source::Chat, "alice", "hi");

        let change = store.update(&record, &policy, at(10, 0), &notifier)?;
        assert_eq!(change, Change::Inserted("alice: hi".into()));
        let change = store.update(&record, &policy, at(10, 1), &notifier)?;
        assert_eq!(change, Change::Unchanged);

        let expect = indoc! {"
            From irc message, reported at: Fri Oct 16 10:00
              alice: hi
            [IRC: alice: hi]
        "};
        assert_eq!(std::fs::read_to_string("run/tmuxnote.journal")?, expect);
        assert_eq!(
            notifier.seen.into_inner(),
            [(Source::Chat, "alice: hi".to_string())]
        );

        Ok(())
    }

    #[sealed_test]
    fn deletes_do_not_notify() -> anyhow::Result<()> {
        let store = JournalStore::new("tmuxnote.journal", JournalFormat::Json);
        let policy = MergePolicy::default();
        let notifier = Recorder::default();

        store.update(&Record::replace(Source::Agenda, "09:30", "Standup"), &policy, at(9, 20), &notifier)?;
        store.update(&Record::delete_short(Source::Agenda), &policy, at(9, 21), &notifier)?;
        assert_eq!(store.load()?.segment(Source::Agenda).unwrap().marker, None);

        let change = store.update(&Record::delete(Source::Agenda), &policy, at(9, 50), &notifier)?;
        assert_eq!(change, Change::Removed);
        assert_eq!(std::fs::read_to_string("tmuxnote.journal")?, "");
        assert_eq!(notifier.seen.into_inner().len(), 1);

        Ok(())
    }

    #[cfg(unix)]
    #[sealed_test]
    fn unwritable_journal_is_an_error() -> anyhow::Result<()> {
        std::os::unix::fs::symlink("missing/target", "tmuxnote.journal")?;
        let store = JournalStore::new("tmuxnote.journal", JournalFormat::Text);
        let notifier = Recorder::default();

        let result = store.update(
            &Record::append(Source::Chat, "alice", "hi"),
            &MergePolicy::default(),
            at(10, 0),
            &notifier,
        );
        assert!(matches!(result, Err(StoreError::WriteJournal { .. })));
        assert!(notifier.seen.into_inner().is_empty());

        Ok(())
    }

    #[cfg(unix)]
    #[sealed_test]
    fn uncreatable_parent_is_an_error() -> anyhow::Result<()> {
        std::os::unix::fs::symlink("missing/target", "run")?;
        let store = JournalStore::new("run/user/tmuxnote.journal", JournalFormat::Text);
        let notifier = Recorder::default();

        let result = store.update(
            &Record::replace(Source::Agenda, "09:30", "Standup"),
            &MergePolicy::default(),
            at(9, 20),
            &notifier,
        );
        assert!(matches!(result, Err(StoreError::CreateParent { .. })));
        assert!(notifier.seen.into_inner().is_empty());

        Ok(())
    }

    #[sealed_test]
    fn unreadable_journal_is_an_error() {
        std::fs::create_dir("journal").unwrap();
        let store = JournalStore::new("journal", JournalFormat::Text);
        assert!(matches!(store.read(), Err(StoreError::ReadJournal { .. })));
    }
}
