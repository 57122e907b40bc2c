// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Journal records.
//!
//! A __record__ is one event that needs to be merged into the notification
//! journal. Every record belongs to exactly one __source__, and carries a
//! __mode__ that tells the merge engine what to do with the source's segment.
//!
//! # Sources
//!
//! The journal is shared by a fixed set of sources. Each source owns one
//! segment of the journal at most, and has a few static traits that never
//! change at runtime: the label written into its header line, the bracket
//! pair that frames its short marker, and the separator placed between a
//! record's key and value.
//!
//! | Source   | Label                 | Marker  | Separator |
//! |----------|-----------------------|---------|-----------|
//! | `agenda` | `From gcalcli agenda` | `<...>` | `" "`     |
//! | `chat`   | `From irc message`    | `[...]` | `": "`    |

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Logical producer of journal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Calendar reminders.
    Agenda,

    /// Chat highlights and private messages.
    Chat,
}

impl Source {
    /// All known sources.
    pub const ALL: [Source; 2] = [Source::Agenda, Source::Chat];

    /// Label written at the start of the source's header line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Agenda => "From gcalcli agenda",
            Self::Chat => "From irc message",
        }
    }

    /// Bracket pair that frames the source's short marker.
    pub fn brackets(self) -> (char, char) {
        match self {
            Self::Agenda => ('<', '>'),
            Self::Chat => ('[', ']'),
        }
    }

    /// Separator placed between key and value of a rendered line.
    pub fn separator(self) -> &'static str {
        match self {
            Self::Agenda => " ",
            Self::Chat => ": ",
        }
    }

    /// Marker template used when nothing else is configured.
    pub fn default_marker_template(self) -> &'static str {
        match self {
            Self::Agenda => "<{}>",
            Self::Chat => "[IRC: {}]",
        }
    }

    /// Check that a marker line is framed by this source's brackets.
    pub fn frames_marker(self, line: &str) -> bool {
        let (open, close) = self.brackets();
        line.len() >= 2 && line.starts_with(open) && line.ends_with(close)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agenda => "agenda",
            Self::Chat => "chat",
        }
    }
}

impl Display for Source {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = UnknownSource;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "agenda" | "gcalcli" | "calendar" => Ok(Self::Agenda),
            "chat" | "irc" => Ok(Self::Chat),
            _ => Err(UnknownSource(name.to_string())),
        }
    }
}

/// Update policy applied when merging a record into its source's segment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Add a line to the segment's history.
    Append,

    /// Overwrite the segment's body with a single line.
    Replace,

    /// Remove the whole segment.
    Delete,

    /// Remove only the segment's short marker.
    #[default]
    DeleteShort,
}

/// One event to merge into the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub source: Source,
    pub mode: Mode,
    pub key: String,
    pub value: String,

    /// Template for the short marker, with `{}` standing in for the summary.
    pub marker_template: Option<String>,
}

impl Record {
    /// Construct new record carrying a payload.
    pub fn new(
        source: Source,
        mode: Mode,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            source,
            mode,
            key: key.into(),
            value: value.into(),
            marker_template: None,
        }
    }

    /// Construct new appending record.
    pub fn append(source: Source, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(source, Mode::Append, key, value)
    }

    /// Construct new replacing record.
    pub fn replace(source: Source, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(source, Mode::Replace, key, value)
    }

    /// Construct new record removing the whole segment of a source.
    pub fn delete(source: Source) -> Self {
        Self::new(source, Mode::Delete, "", "")
    }

    /// Construct new record removing only the short marker of a source.
    pub fn delete_short(source: Source) -> Self {
        Self::new(source, Mode::DeleteShort, "", "")
    }

    /// Use custom short marker template.
    pub fn with_marker_template(mut self, template: impl Into<String>) -> Self {
        self.marker_template = Some(template.into());
        self
    }

    /// Combine key and value into the raw display line.
    ///
    /// Empty keys contribute nothing, so the separator only shows up between
    /// two non-empty parts.
    pub fn raw_line(&self) -> String {
        let key = self.key.trim();
        let value = self.value.trim();
        match (key.is_empty(), value.is_empty()) {
            (true, _) => value.to_string(),
            (false, true) => key.to_string(),
            (false, false) => format!("{key}{}{value}", self.source.separator()),
        }
    }
}

/// Source name is not one of the known set.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown journal source {0:?}, expected \"agenda\" or \"chat\"")]
pub struct UnknownSource(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("agenda", Ok(Source::Agenda); "agenda")]
    #[test_case(" IRC ", Ok(Source::Chat); "irc alias")]
    #[test_case("gitlab", Err(UnknownSource("gitlab".into())); "unknown")]
    #[test]
    fn parse_source(name: &str, expect: Result<Source, UnknownSource>) {
        pretty_assertions::assert_eq!(name.parse::<Source>(), expect);
    }

    #[test]
    fn raw_line_joins_with_source_separator() {
        let chat = Record::append(Source::Chat, "alice", "hi");
        assert_eq!(chat.raw_line(), "alice: hi");

        let agenda = Record::replace(Source::Agenda, "14:00", "Standup");
        assert_eq!(agenda.raw_line(), "14:00 Standup");

        let keyless = Record::append(Source::Chat, "", "hello");
        assert_eq!(keyless.raw_line(), "hello");

        assert_eq!(Record::delete(Source::Chat).raw_line(), "");
    }

    #[test]
    fn marker_framing_follows_source_brackets() {
        assert!(Source::Chat.frames_marker("[IRC: hi]"));
        assert!(!Source::Chat.frames_marker("<hi>"));
        assert!(Source::Agenda.frames_marker("<14:00 Standup>"));
        assert!(!Source::Agenda.frames_marker("<"));
    }
}
