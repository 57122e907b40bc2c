// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Journal merge engine.
//!
//! Merging is one state transition per record, keyed by the record's
//! [`Mode`]:
//!
//! - __Append__ adds a line to the segment, evicting the oldest lines once the
//!   source's history cap is exceeded.
//! - __Replace__ overwrites the segment body with the new line.
//! - __Delete__ removes the whole segment.
//! - __DeleteShort__ removes only the short marker, leaving history intact.
//!
//! Append and Replace create the segment when it is missing, and both skip
//! lines that are already present in the body. Segments never move: an
//! updated segment stays where it was first created.

use crate::{
    journal::{scrub, Journal, Segment},
    record::{Mode, Record, Source},
};

use chrono::NaiveDateTime;
use tracing::{debug, instrument, warn};

/// Timestamp layout of header lines.
pub const HEADER_TIME_FORMAT: &str = "%a %b %d %H:%M";

/// Default number of body lines kept per segment.
pub const DEFAULT_HISTORY_CAP: usize = 30;

/// Default number of characters summarized in a short marker.
pub const DEFAULT_MARKER_WIDTH: usize = 32;

/// Merge settings of a single source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePolicy {
    /// Maximum number of body lines kept by Append.
    pub history_cap: usize,

    /// Marker template used when a record does not carry one.
    pub marker_template: String,
}

impl SourcePolicy {
    /// Construct source policy with default template of source.
    pub fn new(source: Source, history_cap: usize) -> Self {
        Self {
            history_cap,
            marker_template: source.default_marker_template().into(),
        }
    }
}

/// Immutable merge settings handed to the engine on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicy {
    pub agenda: SourcePolicy,
    pub chat: SourcePolicy,

    /// Number of characters of the latest line shown in a short marker.
    pub marker_width: usize,
}

impl MergePolicy {
    /// Settings for target source.
    pub fn source(&self, source: Source) -> &SourcePolicy {
        match source {
            Source::Agenda => &self.agenda,
            Source::Chat => &self.chat,
        }
    }

    /// Pick marker template for a record.
    ///
    /// Prefer the record's own template, then the configured one, then the
    /// source default. Templates that would not frame the source's marker
    /// are skipped.
    fn marker_template<'a>(&'a self, record: &'a Record) -> &'a str {
        let source = record.source;
        if let Some(template) = &record.marker_template {
            if scrub::marker_template_fits(source, template) {
                return template;
            }
            warn!("ignore marker template {template:?} unfit for {source}");
        }

        let configured = &self.source(source).marker_template;
        if scrub::marker_template_fits(source, configured) {
            return configured;
        }

        source.default_marker_template()
    }
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            agenda: SourcePolicy::new(Source::Agenda, DEFAULT_HISTORY_CAP),
            chat: SourcePolicy::new(Source::Chat, DEFAULT_HISTORY_CAP),
            marker_width: DEFAULT_MARKER_WIDTH,
        }
    }
}

/// What a merge did to the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Nothing to do, journal must not be rewritten.
    Unchanged,

    /// New segment created holding the line.
    Inserted(String),

    /// Line added to existing segment.
    Appended(String),

    /// Existing segment body overwritten with the line.
    Replaced(String),

    /// Whole segment removed.
    Removed,

    /// Short marker removed from segment.
    MarkerCleared,
}

impl Change {
    /// Check if journal was left untouched.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Line that should be announced through notifications.
    pub fn notice(&self) -> Option<&str> {
        match self {
            Self::Inserted(line) | Self::Appended(line) | Self::Replaced(line) => Some(line),
            _ => None,
        }
    }
}

impl Journal {
    /// Merge record into journal.
    ///
    /// A Replace record whose line turns out blank is handled as a Delete,
    /// so an adapter with nothing to report clears its segment. A blank
    /// Append record leaves the journal alone, history is never dropped
    /// because of an empty message.
    #[instrument(skip(self, policy), level = "debug")]
    pub fn apply(&mut self, record: &Record, policy: &MergePolicy, now: NaiveDateTime) -> Change {
        let source = record.source;
        let line = scrub::sanitize_line(&record.raw_line());
        let mode = match record.mode {
            Mode::Replace if line.is_empty() => {
                debug!("blank {source} record, delete segment instead");
                Mode::Delete
            }
            Mode::Append if line.is_empty() => {
                debug!("ignore blank {source} record");
                return Change::Unchanged;
            }
            mode => mode,
        };

        match mode {
            Mode::Delete => match self.remove(source) {
                Some(_) => Change::Removed,
                None => Change::Unchanged,
            },
            Mode::DeleteShort => {
                let Some(index) = self.position(source) else {
                    return Change::Unchanged;
                };
                match self.segment_at_mut(index).marker.take() {
                    Some(_) => Change::MarkerCleared,
                    None => Change::Unchanged,
                }
            }
            Mode::Append | Mode::Replace => {
                let reported_at = now.format(HEADER_TIME_FORMAT).to_string();
                let marker =
                    scrub::render_marker(policy.marker_template(record), &line, policy.marker_width);

                let Some(index) = self.position(source) else {
                    self.push(Segment {
                        source,
                        reported_at,
                        body: vec![line.clone()],
                        marker: Some(marker),
                    });
                    return Change::Inserted(line);
                };

                let segment = self.segment_at_mut(index);
                if segment.contains(&line) {
                    debug!("{source} already holds {line:?}");
                    return Change::Unchanged;
                }

                segment.reported_at = reported_at;
                segment.marker = Some(marker);
                if mode == Mode::Replace {
                    segment.body = vec![line.clone()];
                    return Change::Replaced(line);
                }

                segment.body.push(line.clone());
                let cap = policy.source(source).history_cap.max(1);
                if segment.body.len() > cap {
                    let excess = segment.body.len() - cap;
                    segment.body.drain(..excess);
                }

                Change::Appended(line)
            }
        }
    }
}
