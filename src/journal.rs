// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Notification journal.
//!
//! The __journal__ is one small text file shared by every [`Source`]. It is
//! meant to be glanced at by a human (tmux status scripts `cat` it), and it is
//! the only state the relay keeps between invocations. There is no separate
//! index: every update reads the whole file, merges one record, and writes
//! the whole file back.
//!
//! # Journal Layout
//!
//! The journal holds at most one __segment__ per source, in the order the
//! segments were first created. A segment is made of a header line, an
//! indented body, and an optional short marker line:
//!
//! ```text
//! From gcalcli agenda, reported at: Fri Oct 16 09:20
//!   09:30 Standup
//! <09:30 Standup>
//!
//! From irc message, reported at: Fri Oct 16 09:25
//!   alice: hi
//!   bob: yo
//! [IRC: bob: yo]
//! ```
//!
//! Segments are separated by a blank line. See [`locate`] for the rules used
//! to find segments again on the next read.
//!
//! # Formats
//!
//! The layout above is the default [`JournalFormat::Text`] encoding. The same
//! two slot structure can also be stored as JSON through
//! [`JournalFormat::Json`], in which case the text layout only serves as a
//! display projection.

pub mod locate;
pub mod merge;
pub mod scrub;

pub use merge::{Change, MergePolicy, SourcePolicy};

use crate::record::{Record, Source};
use locate::{BODY_INDENT, HEADER_SEPARATOR};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
};
use tracing::warn;

/// In-memory form of the journal.
///
/// # Invariant
///
/// - At most one segment per source.
/// - Segments keep the order they were first inserted in.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Journal {
    segments: Vec<Segment>,
}

impl Journal {
    /// Construct new empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if journal holds no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments in file order.
    pub fn segments(&self) -> &[Segment] {
        self.segments.as_slice()
    }

    /// Segment of target source, if any.
    pub fn segment(&self, source: Source) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.source == source)
    }

    /// Map each present source to its body lines.
    pub fn bodies(&self) -> BTreeMap<Source, Vec<String>> {
        self.segments
            .iter()
            .map(|segment| (segment.source, segment.body.clone()))
            .collect()
    }

    pub(crate) fn position(&self, source: Source) -> Option<usize> {
        self.segments
            .iter()
            .position(|segment| segment.source == source)
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub(crate) fn segment_at_mut(&mut self, index: usize) -> &mut Segment {
        &mut self.segments[index]
    }

    pub(crate) fn remove(&mut self, source: Source) -> Option<Segment> {
        self.position(source)
            .map(|index| self.segments.remove(index))
    }

    /// Check structural invariants after decoding foreign input.
    fn deduplicated(mut self) -> Self {
        let mut seen = Vec::new();
        self.segments.retain(|segment| {
            if seen.contains(&segment.source) || segment.body.is_empty() {
                warn!("drop malformed {} segment", segment.source);
                return false;
            }
            seen.push(segment.source);
            true
        });
        self
    }
}

impl From<&str> for Journal {
    fn from(text: &str) -> Self {
        let segments = locate::scan(text)
            .into_iter()
            .map(|span| Segment {
                source: span.source,
                reported_at: span.stamp.to_string(),
                body: span.body_lines().map(str::to_owned).collect(),
                marker: span.marker.map(str::to_owned),
            })
            .collect();

        Self { segments }
    }
}

impl From<String> for Journal {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl Display for Journal {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                fmt.write_str("\n")?;
            }
            write!(fmt, "{segment}")?;
        }

        Ok(())
    }
}

/// Contiguous header, body, and marker region of one source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Segment {
    pub source: Source,

    /// Human timestamp written into the header line.
    pub reported_at: String,

    /// Message lines, oldest first.
    pub body: Vec<String>,

    /// Short marker summarizing the latest line.
    pub marker: Option<String>,
}

impl Segment {
    /// Full header line.
    pub fn header(&self) -> String {
        format!("{}{HEADER_SEPARATOR}{}", self.source.label(), self.reported_at)
    }

    /// Most recent body line.
    pub fn latest(&self) -> Option<&str> {
        self.body.last().map(String::as_str)
    }

    /// Check if body already holds a line, ignoring decoration.
    pub fn contains(&self, line: &str) -> bool {
        let key = scrub::dedup_key(line);
        self.body.iter().any(|entry| scrub::dedup_key(entry) == key)
    }
}

impl Display for Segment {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        writeln!(fmt, "{}", self.header())?;
        for line in &self.body {
            writeln!(fmt, "{BODY_INDENT}{line}")?;
        }
        if let Some(marker) = &self.marker {
            writeln!(fmt, "{marker}")?;
        }

        Ok(())
    }
}

/// Encoding used to persist the journal.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalFormat {
    /// Human readable segment layout.
    #[default]
    Text,

    /// Pretty printed JSON of the segment list.
    Json,
}

impl JournalFormat {
    /// Decode journal from file content.
    ///
    /// Never fails. Undecodable content is treated as an empty journal so the
    /// next write starts fresh.
    pub fn decode(self, content: &str) -> Journal {
        match self {
            Self::Text => Journal::from(content),
            Self::Json if content.trim().is_empty() => Journal::new(),
            Self::Json => match serde_json::from_str::<Journal>(content) {
                Ok(journal) => journal.deduplicated(),
                Err(error) => {
                    warn!("discard undecodable journal: {error}");
                    Journal::new()
                }
            },
        }
    }

    /// Encode journal into file content.
    ///
    /// An empty journal always encodes to empty content.
    ///
    /// # Errors
    ///
    /// - Return [`JournalError::Encode`] if JSON serialization fails.
    pub fn encode(self, journal: &Journal) -> Result<String> {
        if journal.is_empty() {
            return Ok(String::new());
        }

        match self {
            Self::Text => Ok(journal.to_string()),
            Self::Json => {
                let mut content = serde_json::to_string_pretty(journal)?;
                content.push('\n');
                Ok(content)
            }
        }
    }
}

/// Outcome of merging a record into journal content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub change: Change,

    /// New content to write, or `None` if the journal must be left alone.
    pub content: Option<String>,
}

/// Merge a record into existing journal content.
///
/// Pure given its inputs: decodes `existing`, applies the record, and encodes
/// the result. The full new content is computed before anything touches the
/// file system.
///
/// # Errors
///
/// - Return [`JournalError::Encode`] if the new journal cannot be encoded.
pub fn apply(
    format: JournalFormat,
    existing: &str,
    record: &Record,
    policy: &MergePolicy,
    now: NaiveDateTime,
) -> Result<Merged> {
    let mut journal = format.decode(existing);
    let change = journal.apply(record, policy, now);
    let content = match change {
        Change::Unchanged => None,
        _ => Some(format.encode(&journal)?),
    };

    Ok(Merged { change, content })
}

/// Journal encoding error types.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Failed to encode journal as JSON.
    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// Friendly result alias :3
pub type Result<T, E = JournalError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sample() -> Journal {
        let policy = MergePolicy::default();
        let mut journal = Journal::new();
        journal.apply(&Record::replace(Source::Agenda, "09:30", "Standup"), &policy, at(9, 20));
        journal.apply(&Record::append(Source::Chat, "alice", "hi"), &policy, at(9, 25));
        journal.apply(&Record::append(Source::Chat, "bob", "yo"), &policy, at(9, 26));
        journal
    }

    #[test]
    fn display_journal_layout() {
        let expect = indoc! {"
            From gcalcli agenda, reported at: Fri Oct 16 09:20
              09:30 Standup
            <09:30 Standup>

            From irc message, reported at: Fri Oct 16 09:26
              alice: hi
              bob: yo
            [IRC: bob: yo]
        "};
        assert_eq!(sample().to_string(), expect);
    }

    #[test]
    fn text_round_trip_keeps_bodies() {
        let journal = sample();
        let reparsed = Journal::from(journal.to_string());
        assert_eq!(reparsed.bodies(), journal.bodies());
        assert_eq!(reparsed, journal);
    }

    #[test]
    fn json_round_trip_keeps_bodies() -> anyhow::Result<()> {
        let journal = sample();
        let content = JournalFormat::Json.encode(&journal)?;
        assert_eq!(JournalFormat::Json.decode(&content), journal);
        Ok(())
    }

    #[test]
    fn empty_journal_encodes_to_nothing() -> anyhow::Result<()> {
        assert_eq!(JournalFormat::Text.encode(&Journal::new())?, "");
        assert_eq!(JournalFormat::Json.encode(&Journal::new())?, "");
        Ok(())
    }

    #[test]
    fn json_decode_degrades_on_garbage() {
        assert!(JournalFormat::Json.decode("{ not json").is_empty());
        assert!(JournalFormat::Json.decode("").is_empty());
    }

    #[test]
    fn json_decode_drops_duplicate_sources() {
        let content = r#"{
            "segments": [
                { "source": "chat", "reported_at": "Fri Oct 16 09:25", "body": ["alice: hi"], "marker": null },
                { "source": "chat", "reported_at": "Fri Oct 16 09:26", "body": ["bob: yo"], "marker": null },
                { "source": "agenda", "reported_at": "Fri Oct 16 09:20", "body": [], "marker": null }
            ]
        }"#;
        let journal = JournalFormat::Json.decode(content);
        assert_eq!(journal.segments().len(), 1);
        assert_eq!(journal.bodies()[&Source::Chat], ["alice: hi"]);
    }

    #[test]
    fn apply_leaves_content_alone_when_unchanged() -> anyhow::Result<()> {
        let policy = MergePolicy::default();
        let existing = sample().to_string();
        let record = Record::append(Source::Chat, "bob", "yo");
        let merged = apply(JournalFormat::Text, &existing, &record, &policy, at(9, 30))?;
        assert_eq!(merged.change, Change::Unchanged);
        assert_eq!(merged.content, None);
        Ok(())
    }
}
