// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Chat highlight source.
//!
//! Turn IRC client signals into journal records. Highlights and private
//! messages are appended to the chat history, while typing into the client
//! clears the chat badge, i.e., the short marker, without dropping history.
//!
//! Messages arrive as `prefix<TAB>body`, which is how weechat hands them to
//! signal hooks.

use crate::{
    config::ChatSettings,
    record::{Record, Source},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use tracing::debug;

/// IRC client signal that may concern the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Someone highlighted the user.
    Highlight,

    /// Someone sent the user a private message.
    Private,

    /// User typed into the input bar.
    InputChanged,
}

impl FromStr for Signal {
    type Err = UnknownSignal;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "weechat_highlight" | "highlight" => Ok(Self::Highlight),
            "weechat_pv" | "private" => Ok(Self::Private),
            "input_text_changed" | "input" => Ok(Self::InputChanged),
            _ => Err(UnknownSignal(name.to_string())),
        }
    }
}

impl Display for Signal {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(match self {
            Self::Highlight => "weechat_highlight",
            Self::Private => "weechat_pv",
            Self::InputChanged => "input_text_changed",
        })
    }
}

/// Build the chat record for a signal, if the signal should touch the journal.
pub fn chat_record(signal: Signal, message: &str, settings: &ChatSettings) -> Option<Record> {
    match signal {
        Signal::Highlight if settings.show_highlights => message_record(message),
        Signal::Private if settings.show_private => message_record(message),
        Signal::InputChanged if settings.clear_on_input => Some(Record::delete_short(Source::Chat)),
        _ => {
            debug!("signal {signal} disabled by settings");
            None
        }
    }
}

/// Build append record from a `prefix<TAB>body` message.
///
/// Return `None` for messages without a body, and for messages that only
/// carry client noise, i.e., status buffer chatter and IRC server notices.
pub fn message_record(message: &str) -> Option<Record> {
    let (sender, body) = split_message(message)?;
    Some(Record::append(Source::Chat, sender, body))
}

fn split_message(message: &str) -> Option<(String, String)> {
    let (prefix, body) = message.split_once('\t').unwrap_or(("", message));
    let sender = prefix.trim();
    let body = body.replace('\'', "");
    let body = body.trim();
    if body.is_empty() {
        debug!("ignore chat message without body");
        return None;
    }

    // INVARIANT: Actions ("/me waves") carry the actor as first word of the body.
    let sender = match sender {
        "*" => body.split_whitespace().next().unwrap_or_default(),
        "*status" => {
            debug!("ignore status buffer message");
            return None;
        }
        "--" if body.starts_with("irc") => {
            debug!("ignore irc server notice");
            return None;
        }
        sender => sender,
    };

    Some((sender.to_string(), body.to_string()))
}

/// Signal name is not one the relay listens to.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown chat signal {0:?}")]
pub struct UnknownSignal(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Mode;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("alice\thi there", Some(("alice", "hi there")); "plain")]
    #[test_case(" bob \tdon't panic", Some(("bob", "dont panic")); "quotes removed")]
    #[test_case("*\tcarol waves", Some(("carol", "carol waves")); "action")]
    #[test_case("*status\tconnected", None; "status buffer")]
    #[test_case("--\tirc: disconnected", None; "server notice")]
    #[test_case("--\tnick changed", Some(("--", "nick changed")); "other notice")]
    #[test_case("no tab", Some(("", "no tab")); "missing prefix")]
    #[test_case("", None; "empty payload")]
    #[test_case("*\t", None; "action without body")]
    #[test_case("alice\t  ''  ", None; "only quotes")]
    #[test]
    fn split_weechat_message(message: &str, expect: Option<(&str, &str)>) {
        let expect = expect.map(|(sender, body)| (sender.to_string(), body.to_string()));
        pretty_assertions::assert_eq!(split_message(message), expect);
    }

    #[test]
    fn signals_respect_settings() {
        let mut settings = ChatSettings::default();

        let record = chat_record(Signal::Highlight, "alice\thi", &settings).unwrap();
        assert_eq!(record.mode, Mode::Append);
        assert_eq!(record.raw_line(), "alice: hi");

        let record = chat_record(Signal::InputChanged, "", &settings).unwrap();
        assert_eq!(record, Record::delete_short(Source::Chat));

        settings.show_private = false;
        assert_eq!(chat_record(Signal::Private, "alice\thi", &settings), None);
        settings.clear_on_input = false;
        assert_eq!(chat_record(Signal::InputChanged, "", &settings), None);
    }

    #[test]
    fn parse_signal_names() {
        assert_eq!("weechat_pv".parse::<Signal>(), Ok(Signal::Private));
        assert_eq!("input".parse::<Signal>(), Ok(Signal::InputChanged));
        assert_eq!(
            "buffer_opened".parse::<Signal>(),
            Err(UnknownSignal("buffer_opened".into()))
        );
    }
}
