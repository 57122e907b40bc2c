// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file that tmuxnote uses to simplify
//! the process of serialization and deserialization. File I/O is left to the
//! caller to figure out.
//!
//! Every setting has a default, so an empty file, or no file at all, is a
//! valid configuration.

use crate::{
    agenda::{AgendaWindow, DEFAULT_WINDOW_AFTER, DEFAULT_WINDOW_BEFORE},
    journal::{
        merge::{DEFAULT_HISTORY_CAP, DEFAULT_MARKER_WIDTH},
        scrub, JournalFormat, MergePolicy, SourcePolicy,
    },
    path::default_journal_path,
    record::Source,
};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Relay settings layout.
///
/// Settings are read once per invocation and handed down as immutable values.
/// Nothing in the relay changes them at runtime.
///
/// # General Layout
///
/// ```toml
/// [journal]
/// path = "$XDG_RUNTIME_DIR/tmuxnote.journal"
/// format = "text"
/// marker_width = 32
///
/// [chat]
/// show_highlights = true
/// show_private = true
/// clear_on_input = true
/// history_cap = 30
/// marker = "[IRC: {}]"
///
/// [agenda]
/// window_before = 20
/// window_after = 10
/// history_cap = 30
/// marker = "<{}>"
///
/// [notify]
/// popup = true
/// desktop = true
/// status_line = true
/// ```
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Journal file settings.
    pub journal: JournalSettings,

    /// Chat source settings.
    pub chat: ChatSettings,

    /// Agenda source settings.
    pub agenda: AgendaSettings,

    /// Notification settings.
    pub notify: NotifySettings,
}

impl Settings {
    /// Merge policy derived from settings.
    pub fn merge_policy(&self) -> MergePolicy {
        MergePolicy {
            agenda: SourcePolicy {
                history_cap: self.agenda.history_cap,
                marker_template: self.agenda.marker.clone(),
            },
            chat: SourcePolicy {
                history_cap: self.chat.history_cap,
                marker_template: self.chat.marker.clone(),
            },
            marker_width: self.journal.marker_width,
        }
    }

    /// Agenda notification window derived from settings.
    pub fn agenda_window(&self) -> AgendaWindow {
        AgendaWindow::from_minutes(
            i64::from(self.agenda.window_before),
            i64::from(self.agenda.window_after),
        )
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on journal path field.
        settings.journal.path = JournalPath::new(
            shellexpand::full(settings.journal.path.to_string().as_str())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned(),
        );

        // INVARIANT: Marker templates must frame their source's marker line.
        for (source, template) in [
            (Source::Chat, &settings.chat.marker),
            (Source::Agenda, &settings.agenda.marker),
        ] {
            if !scrub::marker_template_fits(source, template) {
                return Err(ConfigError::MarkerTemplate {
                    source_name: source,
                    template: template.clone(),
                });
            }
        }

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Journal file settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JournalSettings {
    /// Location of journal file.
    pub path: JournalPath,

    /// Encoding of journal file.
    pub format: JournalFormat,

    /// Number of characters summarized in short markers.
    pub marker_width: usize,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            path: JournalPath::default(),
            format: JournalFormat::default(),
            marker_width: DEFAULT_MARKER_WIDTH,
        }
    }
}

/// Chat source settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Record highlights.
    pub show_highlights: bool,

    /// Record private messages.
    pub show_private: bool,

    /// Clear chat marker when typing into the IRC client.
    pub clear_on_input: bool,

    /// Maximum number of chat lines kept.
    pub history_cap: usize,

    /// Short marker template.
    pub marker: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            show_highlights: true,
            show_private: true,
            clear_on_input: true,
            history_cap: DEFAULT_HISTORY_CAP,
            marker: Source::Chat.default_marker_template().into(),
        }
    }
}

/// Agenda source settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgendaSettings {
    /// Minutes before an event that reminders start.
    pub window_before: u32,

    /// Minutes after an event that reminders stop.
    pub window_after: u32,

    /// Maximum number of agenda lines kept.
    pub history_cap: usize,

    /// Short marker template.
    pub marker: String,
}

impl Default for AgendaSettings {
    fn default() -> Self {
        Self {
            window_before: DEFAULT_WINDOW_BEFORE as u32,
            window_after: DEFAULT_WINDOW_AFTER as u32,
            history_cap: DEFAULT_HISTORY_CAP,
            marker: Source::Agenda.default_marker_template().into(),
        }
    }
}

/// Notification mechanism toggles.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifySettings {
    /// Show tmux popup.
    pub popup: bool,

    /// Show desktop balloon through `notify-send`.
    pub desktop: bool,

    /// Show message in tmux status line.
    pub status_line: bool,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            popup: true,
            desktop: true,
            status_line: true,
        }
    }
}

/// Path to journal file.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct JournalPath(PathBuf);

impl JournalPath {
    /// Construct new journal path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Treat journal path as [`Path`] slice.
    pub fn as_path(&self) -> &Path {
        self.0.as_path()
    }
}

impl Default for JournalPath {
    fn default() -> Self {
        Self(default_journal_path())
    }
}

impl Display for JournalPath {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_path().to_string_lossy().as_ref())
    }
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Marker template cannot frame its source's marker.
    #[error("marker template {template:?} of {source_name} must contain {{}} and be framed like {}", .source_name.default_marker_template())]
    MarkerTemplate { source_name: Source, template: String },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}
