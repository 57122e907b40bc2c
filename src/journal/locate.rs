// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Segment location.
//!
//! Find where each source's segment lives inside raw journal text. Location is
//! purely structural, so it never trusts what a message says about itself:
//!
//! - A header is only recognized at column 0.
//! - Body lines always carry a two space indent.
//! - A marker is the first column 0 line after the body, and only counts if
//!   it is framed by the bracket pair of the header's source.
//!
//! A chat message that literally contains the agenda header text therefore
//! sits inside an indented body line, and cannot open a second agenda segment.
//!
//! Location never fails. Anything that does not form a complete segment is
//! skipped, which the merge engine sees as "segment absent".

use crate::record::Source;

use tracing::{debug, warn};

/// Text between a header's label and its timestamp.
pub const HEADER_SEPARATOR: &str = ", reported at: ";

/// Indentation that marks a body line.
pub const BODY_INDENT: &str = "  ";

/// Location of one segment inside journal text.
///
/// All slices borrow from the text that was scanned. Header, body, and marker
/// exclude their final newline, while `before` and `after` cover everything
/// else in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSpan<'a> {
    pub source: Source,
    pub before: &'a str,
    pub header: &'a str,
    pub stamp: &'a str,
    pub body: &'a str,
    pub marker: Option<&'a str>,
    pub after: &'a str,
}

impl<'a> SegmentSpan<'a> {
    /// Iterate body lines without their indentation.
    pub fn body_lines(&self) -> impl Iterator<Item = &'a str> {
        self.body
            .lines()
            .map(|line| line.strip_prefix(BODY_INDENT).unwrap_or(line))
    }
}

/// Locate segment of target source.
///
/// Return `None` when the text is empty, only holds other sources, or only
/// holds a malformed fragment of the target source.
pub fn locate(text: &str, source: Source) -> Option<SegmentSpan<'_>> {
    scan(text).into_iter().find(|span| span.source == source)
}

/// Locate every well-formed segment in text order.
///
/// # Invariant
///
/// - At most one span per source. The first complete segment of a source
///   wins, later ones are ignored.
pub fn scan(text: &str) -> Vec<SegmentSpan<'_>> {
    let lines = split_lines(text);
    let mut spans: Vec<SegmentSpan<'_>> = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let LineKind::Header { source, stamp } = classify(lines[index].text) else {
            if !lines[index].text.trim().is_empty() {
                debug!("skip stray journal line {:?}", lines[index].text);
            }
            index += 1;
            continue;
        };

        let header = &lines[index];
        let mut next = index + 1;
        while next < lines.len() && matches!(classify(lines[next].text), LineKind::Body) {
            next += 1;
        }

        // INVARIANT: Header without a body is a broken segment, not an empty one.
        if next == index + 1 {
            debug!("skip {source} header without body at line {}", index + 1);
            index += 1;
            continue;
        }
        let body_end = lines[next - 1].end;

        let mut marker = None;
        if next < lines.len()
            && matches!(classify(lines[next].text), LineKind::Other)
            && source.frames_marker(lines[next].text)
        {
            marker = Some(lines[next].text);
            next += 1;
        }

        if spans.iter().any(|span| span.source == source) {
            warn!("ignore duplicate {source} segment at line {}", index + 1);
            index = next;
            continue;
        }

        let start = header.start;
        let end = lines[next - 1].next;
        spans.push(SegmentSpan {
            source,
            before: &text[..start],
            header: header.text,
            stamp,
            body: &text[lines[index + 1].start..body_end],
            marker,
            after: &text[end..],
        });
        index = next;
    }

    spans
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Header { source: Source, stamp: &'a str },
    Body,
    Other,
}

fn classify(line: &str) -> LineKind<'_> {
    if let Some(text) = line.strip_prefix(BODY_INDENT) {
        if text.trim().is_empty() {
            return LineKind::Other;
        }
        return LineKind::Body;
    }

    for source in Source::ALL {
        let stamp = line
            .strip_prefix(source.label())
            .and_then(|rest| rest.strip_prefix(HEADER_SEPARATOR));
        if let Some(stamp) = stamp {
            return LineKind::Header { source, stamp };
        }
    }

    LineKind::Other
}

/// Line of text with byte offsets into the text it came from.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    text: &'a str,
    start: usize,
    end: usize,
    next: usize,
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let (end, next) = match text[start..].find('\n') {
            Some(offset) => (start + offset, start + offset + 1),
            None => (text.len(), text.len()),
        };

        // INVARIANT: Treat CRLF endings as plain LF endings.
        let content = text[start..end].trim_end_matches('\r');
        lines.push(Line {
            text: content,
            start,
            end: start + content.len(),
            next,
        });
        start = next;
    }

    lines
}
