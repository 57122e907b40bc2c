// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Notification relay for tmux.
//!
//! Chat highlights and calendar reminders share one small journal file that
//! tmux status scripts can display. Each source keeps its own segment in the
//! journal, and every update merges a single [`Record`] into that segment
//! before the user gets notified.
//!
//! # See Also
//!
//! 1. [`journal`] for the journal layout and merge rules.
//! 2. [`store`] for the read, merge, and write cycle.

pub mod agenda;
pub mod chat;
pub mod config;
pub mod journal;
pub mod notify;
pub mod path;
pub mod record;
pub mod store;

pub use journal::{Change, Journal, JournalFormat, MergePolicy};
pub use record::{Mode, Record, Source};
pub use store::JournalStore;
