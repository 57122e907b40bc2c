// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Text scrubbing for journal lines.
//!
//! Incoming messages are full of decoration that does not belong in the
//! journal: terminal colour escapes, stray backticks, embedded newlines. Body
//! lines must also stay on one line, otherwise they could leak text into
//! column 0 and be mistaken for structure on the next read.

use crate::record::Source;

use regex::Regex;
use std::{borrow::Cow, sync::LazyLock};

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").unwrap());

/// Characters ignored when comparing lines for duplication.
const QUOTES: [char; 3] = ['\'', '"', '`'];

/// Remove terminal colour escape sequences.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

/// Turn raw message text into a storable body line.
///
/// Backticks and colour escapes are dropped, and every run of whitespace,
/// including newlines and tabs, collapses into a single space.
pub fn sanitize_line(text: &str) -> String {
    let text = text.replace('`', "");
    collapse_whitespace(&strip_ansi(&text))
}

/// Normalize a line for duplicate detection.
///
/// Two lines that only differ by colour escapes, quote characters, or
/// whitespace produce the same key.
pub fn dedup_key(text: &str) -> String {
    let text = strip_ansi(text).replace(QUOTES, "");
    collapse_whitespace(&text)
}

/// Render short marker from template and the line it summarizes.
///
/// Only the first `width` characters of the line make it into the marker.
pub fn render_marker(template: &str, line: &str, width: usize) -> String {
    let summary = line.chars().take(width).collect::<String>();
    template.replacen("{}", summary.trim_end(), 1)
}

/// Check that a marker template is usable for a source.
///
/// # Invariant
///
/// - Template carries a `{}` placeholder.
/// - Template is framed by the source's bracket pair, so the rendered marker
///   can be found again when the journal is re-read.
pub fn marker_template_fits(source: Source, template: &str) -> bool {
    template.contains("{}") && source.frames_marker(template)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("plain", "plain"; "untouched")]
    #[test_case("\x1b[1;31mred\x1b[0m text", "red text"; "csi colour")]
    #[test_case("a\x1bMb", "ab"; "single byte escape")]
    #[test]
    fn strip_ansi_escapes(input: &str, expect: &str) {
        pretty_assertions::assert_eq!(strip_ansi(input), expect);
    }

    #[test]
    fn sanitize_line_keeps_one_line() {
        let result = sanitize_line("  bob: `ls`\n\tthen\x1b[32m  done\x1b[0m  ");
        assert_eq!(result, "bob: ls then done");
    }

    #[test]
    fn dedup_key_ignores_decoration() {
        assert_eq!(
            dedup_key("alice: \x1b[1mit's \"fine\"\x1b[0m"),
            dedup_key("alice: its fine"),
        );
        assert_ne!(dedup_key("alice: hi"), dedup_key("alice: hey"));
    }

    #[test]
    fn render_marker_truncates_summary() {
        let line = "carol: this message is definitely longer than the marker";
        assert_eq!(
            render_marker("[IRC: {}]", line, 23),
            "[IRC: carol: this message is]"
        );
        assert_eq!(render_marker("<{}>", "09:30 Standup", 32), "<09:30 Standup>");
    }

    #[test]
    fn marker_template_must_frame_source() {
        assert!(marker_template_fits(Source::Chat, "[IRC: {}]"));
        assert!(!marker_template_fits(Source::Chat, "<{}>"));
        assert!(!marker_template_fits(Source::Agenda, "<nothing>"));
    }
}
