// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Calendar reminder source.
//!
//! The agenda source reports at most one upcoming event at a time. A periodic
//! timer hands over today's pre-parsed agenda, and the event whose
//! notification window contains "now" becomes a Replace record. When no event
//! qualifies, the record turns into a Delete so stale reminders disappear on
//! their own.
//!
//! # Notification Window
//!
//! An event at time `t` is reportable while `t - before < now < t + after`.
//! Both bounds are exclusive. The check keeps no state of its own, so it is
//! safe to run on every tick.
//!
//! Event times carry no date. They are always placed on the day of `now`, so
//! the window never reaches across midnight: an event at 00:05 is not
//! reported at 23:50 the evening before, only from 00:00 onward.

use crate::record::{Record, Source};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::{str::FromStr, sync::LazyLock};
use tracing::debug;

static AGENDA_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?P<hour>\d{1,2}):(?P<minute>\d{2})\s+(?P<event>\S.*?)\s*$").unwrap());

/// Default minutes before an event that reminders start.
pub const DEFAULT_WINDOW_BEFORE: i64 = 20;

/// Default minutes after an event that reminders stop.
pub const DEFAULT_WINDOW_AFTER: i64 = 10;

/// Check if `now` falls inside the notification window of an event.
pub fn within_window(
    event: NaiveDateTime,
    now: NaiveDateTime,
    before: Duration,
    after: Duration,
) -> bool {
    event - before < now && now < event + after
}

/// Time span around an event in which it gets reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgendaWindow {
    pub before: Duration,
    pub after: Duration,
}

impl AgendaWindow {
    /// Construct new window from minute counts.
    pub fn from_minutes(before: i64, after: i64) -> Self {
        Self {
            before: Duration::minutes(before),
            after: Duration::minutes(after),
        }
    }

    /// Check if `now` falls inside the window of an event.
    pub fn contains(&self, event: NaiveDateTime, now: NaiveDateTime) -> bool {
        within_window(event, now, self.before, self.after)
    }
}

impl Default for AgendaWindow {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_WINDOW_BEFORE, DEFAULT_WINDOW_AFTER)
    }
}

/// One timed entry of today's agenda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaEvent {
    pub time: NaiveTime,
    pub text: String,
}

impl AgendaEvent {
    /// Construct new agenda event.
    pub fn new(time: NaiveTime, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }

    /// Anchor event on a day.
    pub fn on(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.time)
    }

    /// Replace record reporting this event.
    pub fn record(&self) -> Record {
        Record::replace(Source::Agenda, self.time.format("%H:%M").to_string(), &self.text)
    }
}

impl FromStr for AgendaEvent {
    type Err = AgendaError;

    /// Parse agenda line of the form `HH:MM text`.
    fn from_str(line: &str) -> Result<Self> {
        let captures = AGENDA_LINE
            .captures(line)
            .ok_or_else(|| AgendaError::Malformed(line.to_string()))?;

        // INVARIANT: Both captures are plain digit runs, so parsing only fails on range.
        let hour = captures["hour"].parse::<u32>().unwrap_or(u32::MAX);
        let minute = captures["minute"].parse::<u32>().unwrap_or(u32::MAX);
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| AgendaError::InvalidTime(line.to_string()))?;

        Ok(Self::new(time, &captures["event"]))
    }
}

/// Parse every timed event from an agenda feed.
///
/// Lines that are not timed events, e.g., day headers or all day entries, are
/// skipped.
pub fn parse_feed(feed: &str) -> Vec<AgendaEvent> {
    feed.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match line.parse::<AgendaEvent>() {
            Ok(event) => Some(event),
            Err(error) => {
                debug!("skip agenda line: {error}");
                None
            }
        })
        .collect()
}

/// First event in feed order whose window contains `now`.
pub fn current_event<'a>(
    events: &'a [AgendaEvent],
    now: NaiveDateTime,
    window: &AgendaWindow,
) -> Option<&'a AgendaEvent> {
    events
        .iter()
        .find(|event| window.contains(event.on(now.date()), now))
}

/// Build the agenda record for this tick.
///
/// Replace with the current event if there is one, otherwise Delete.
pub fn agenda_record(events: &[AgendaEvent], now: NaiveDateTime, window: &AgendaWindow) -> Record {
    match current_event(events, now, window) {
        Some(event) => event.record(),
        None => Record::delete(Source::Agenda),
    }
}

/// Agenda parsing error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AgendaError {
    /// Line does not look like `HH:MM text`.
    #[error("malformed agenda line {0:?}")]
    Malformed(String),

    /// Line carries an impossible time of day.
    #[error("invalid time of day in agenda line {0:?}")]
    InvalidTime(String),
}

/// Friendly result alias :3
type Result<T, E = AgendaError> = std::result::Result<T, E>;
