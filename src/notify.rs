// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Notification side effects.
//!
//! After the journal gains a line, the relay tells the user about it through
//! up to three independent mechanisms:
//!
//! 1. A tmux popup in the middle of the screen.
//! 2. A desktop balloon through `notify-send`.
//! 3. A transient message in the tmux status line.
//!
//! All of them are best effort. Commands are spawned detached and never
//! awaited, and a command that cannot be spawned is logged and forgotten. The
//! journal write has already happened by the time any of this runs.

use crate::{config::NotifySettings, record::Source};

use regex::Regex;
use std::{
    borrow::Cow,
    process::{Command, Stdio},
    sync::LazyLock,
};
use tracing::{debug, instrument, warn};

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:https?|s?ftps?)://[^\s<>]+").unwrap());

/// Punctuation that ends a sentence rather than a URL.
const URL_TRAILERS: [char; 8] = [',', '.', ')', ']', '}', '?', '\'', '"'];

/// Longest link text shown before it gets shortened.
const LINK_TEXT_LIMIT: usize = 64;

/// Layer of indirection for notification delivery.
pub trait Notify {
    /// Announce a new journal line of a source.
    fn notify(&self, source: Source, message: &str);
}

/// Notification delivery through external commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNotifier {
    popup: bool,
    desktop: bool,
    status_line: bool,
}

impl CommandNotifier {
    /// Construct new command notifier from settings.
    pub fn new(settings: &NotifySettings) -> Self {
        Self {
            popup: settings.popup,
            desktop: settings.desktop,
            status_line: settings.status_line,
        }
    }

    /// Build the enabled notification commands for a message.
    pub fn commands(&self, source: Source, message: &str) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.popup {
            commands.push(popup_command(source, message));
        }
        if self.desktop {
            commands.push(desktop_command(source, message));
        }
        if self.status_line {
            commands.push(status_line_command(message));
        }

        commands
    }
}

impl Notify for CommandNotifier {
    #[instrument(skip(self), level = "debug")]
    fn notify(&self, source: Source, message: &str) {
        for mut command in self.commands(source, message) {
            spawn_detached(&mut command);
        }
    }
}

/// Notifier that stays quiet.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notify for Silent {
    fn notify(&self, source: Source, message: &str) {
        debug!("suppress {source} notification {message:?}");
    }
}

fn popup_command(source: Source, message: &str) -> Command {
    let script = format!(
        "printf '%s\\n  %s\\n' {} {}; stty -echo; sleep 3; stty echo",
        shell_quote(source.label()),
        shell_quote(message),
    );

    let mut command = Command::new("tmux");
    command.args([
        "display-popup",
        "-E",
        "-B",
        "-xC",
        "-yS",
        "-w",
        "30%",
        "-h",
        "20%",
        "-s",
        "fg=colour220,bg=colour243",
    ]);
    command.arg(script);
    command
}

fn desktop_command(source: Source, message: &str) -> Command {
    let mut command = Command::new("notify-send");
    command.args(["-t", "10000", "-i", "user-idle", source.label()]);
    command.arg(hyperlink(message));
    command
}

fn status_line_command(message: &str) -> Command {
    // INVARIANT: tmux expands '#' in messages as format sequences.
    let message = message
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('#', "##");

    let mut command = Command::new("tmux");
    command.args(["display-message", "-d", "5000"]);
    command.arg(message);
    command
}

fn spawn_detached(command: &mut Command) {
    let program = command.get_program().to_os_string();
    let spawned = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    let program = program.to_string_lossy();
    match spawned {
        Ok(child) => debug!("spawned {program} as pid {}", child.id()),
        Err(error) => warn!("cannot spawn {program}: {error}"),
    }
}

/// Wrap URLs in a message with HTML anchors for desktop balloons.
///
/// Trailing sentence punctuation stays outside the anchor. Link text longer
/// than 64 characters is shortened to its first 32 and last 16 characters.
/// Markup characters in the rest of the message are escaped, since the
/// balloon body is read as markup.
pub fn hyperlink(message: &str) -> String {
    let mut result = String::with_capacity(message.len());
    let mut rest = 0;
    for found in URL.find_iter(message) {
        let text = found.as_str();
        let (url, trailer) = match text.chars().last() {
            Some(last) if URL_TRAILERS.contains(&last) => text.split_at(text.len() - last.len_utf8()),
            _ => (text, ""),
        };

        result.push_str(&escape_markup(&message[rest..found.start()]));
        result.push_str(&format!(
            "<a href=\"{}\">{}</a>{}",
            escape_markup(url),
            escape_markup(&link_text(url)),
            escape_markup(trailer),
        ));
        rest = found.end();
    }
    result.push_str(&escape_markup(&message[rest..]));

    result
}

fn escape_markup(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }

    Cow::Owned(
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;"),
    )
}

fn link_text(url: &str) -> String {
    let count = url.chars().count();
    if count <= LINK_TEXT_LIMIT {
        return url.to_string();
    }

    let head = url.chars().take(32).collect::<String>();
    let tail = url.chars().skip(count - 16).collect::<String>();
    format!("{head}...{tail}")
}

/// Quote text for POSIX shell.
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    fn args(command: &Command) -> Vec<String> {
        command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test_case("no links here", "no links here"; "plain")]
    #[test_case(
        "see https://example.org/a.",
        "see <a href=\"https://example.org/a\">https://example.org/a</a>.";
        "trailing period"
    )]
    #[test_case(
        "(sftp://host/file)",
        "(<a href=\"sftp://host/file\">sftp://host/file</a>)";
        "wrapped in parens"
    )]
    #[test]
    fn hyperlink_urls(message: &str, expect: &str) {
        pretty_assertions::assert_eq!(hyperlink(message), expect);
    }

    #[test_case("a < b & c", "a &lt; b &amp; c"; "bare markup")]
    #[test_case(
        "<b>see</b> https://example.org/?a=1&b=2",
        "&lt;b&gt;see&lt;/b&gt; <a href=\"https://example.org/?a=1&amp;b=2\">https://example.org/?a=1&amp;b=2</a>";
        "markup around link"
    )]
    #[test]
    fn hyperlink_escapes_markup(message: &str, expect: &str) {
        pretty_assertions::assert_eq!(hyperlink(message), expect);
    }

    #[test]
    fn spawn_failure_is_swallowed() {
        let mut command = Command::new("tmuxnote-no-such-binary");
        command.arg("hello");
        spawn_detached(&mut command);

        let notifier = CommandNotifier::new(&NotifySettings {
            popup: false,
            desktop: false,
            status_line: false,
        });
        assert!(notifier.commands(Source::Chat, "hello").is_empty());
        notifier.notify(Source::Chat, "hello");
    }

    #[test]
    fn hyperlink_shortens_long_links() {
        let url = format!("https://example.org/{}", "x".repeat(80));
        let result = hyperlink(&url);
        let expect = format!(
            "<a href=\"{url}\">https://example.org/{}...{}</a>",
            "x".repeat(12),
            "x".repeat(16)
        );
        assert_eq!(result, expect);
    }

    #[test]
    fn commands_follow_settings() {
        let notifier = CommandNotifier::new(&NotifySettings {
            popup: false,
            desktop: true,
            status_line: true,
        });
        let commands = notifier.commands(Source::Chat, "alice:  issue  #42");
        assert_eq!(commands.len(), 2);

        assert_eq!(commands[0].get_program(), "notify-send");
        assert_eq!(
            args(&commands[0]),
            ["-t", "10000", "-i", "user-idle", "From irc message", "alice:  issue  #42"]
        );

        assert_eq!(commands[1].get_program(), "tmux");
        assert_eq!(
            args(&commands[1]),
            ["display-message", "-d", "5000", "alice: issue ##42"]
        );
    }

    #[test]
    fn popup_quotes_message() {
        let notifier = CommandNotifier::new(&NotifySettings::default());
        let commands = notifier.commands(Source::Agenda, "09:30 Bob's sync");
        let popup = args(&commands[0]);
        assert_eq!(
            popup.last().map(String::as_str),
            Some("printf '%s\\n  %s\\n' 'From gcalcli agenda' '09:30 Bob'\\''s sync'; stty -echo; sleep 3; stty echo")
        );
    }
}
