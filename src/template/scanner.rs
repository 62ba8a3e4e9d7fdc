//! Splits template source into text and action segments
//!
//! Delimiters are runtime strings, so this step runs before the logos lexer.
//! `left` followed by `- ` trims whitespace before the action; ` -` followed
//! by `right` trims whitespace after it.

use crate::error::{Span, TemplateSyntaxError};

use super::DelimiterPair;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text, already trimmed by neighboring trim markers
    Text { text: String, span: Span },
    /// An action: spans of the left delimiter, the contents and the right delimiter
    Action { open: Span, body: Span, close: Span },
}

const TRIM_MARKER: char = '-';

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// `- ` right after a left delimiter
fn has_left_trim(after_open: &str) -> bool {
    let mut chars = after_open.chars();
    chars.next() == Some(TRIM_MARKER) && chars.next().is_some_and(is_space)
}

/// Where an action's contents end
struct Close {
    body_end: usize,
    delim_start: usize,
    trim_after: bool,
}

/// Find the right delimiter, skipping over string literals and comments
fn find_close(source: &str, from: usize, right: &str) -> Option<Close> {
    let bytes = source.as_bytes();
    let mut i = from;
    while i < source.len() {
        let rest = &source[i..];
        if rest.starts_with(right) {
            return Some(Close {
                body_end: i,
                delim_start: i,
                trim_after: false,
            });
        }

        let mut chars = rest.chars();
        let c = chars.next()?;
        let trim_marker_follows = chars
            .as_str()
            .strip_prefix(TRIM_MARKER)
            .is_some_and(|after| after.starts_with(right));
        if is_space(c) && trim_marker_follows {
            return Some(Close {
                body_end: i,
                delim_start: i + c.len_utf8() + TRIM_MARKER.len_utf8(),
                trim_after: true,
            });
        }

        i = match c {
            '"' | '\'' => {
                let mut j = i + 1;
                loop {
                    match bytes.get(j).copied()? {
                        b'\\' => j += 2,
                        b if b == c as u8 => break j + 1,
                        _ => j += 1,
                    }
                }
            }
            '`' => i + 1 + rest[1..].find('`')? + 1,
            '/' if rest.starts_with("/*") => i + 2 + rest[2..].find("*/")? + 2,
            _ => i + c.len_utf8(),
        };
    }
    None
}

fn push_text(segments: &mut Vec<Segment>, source: &str, span: Span, trim_start: bool, trim_end: bool) {
    let mut text = &source[span.clone()];
    let mut start = span.start;
    if trim_start {
        let trimmed = text.trim_start_matches(is_space);
        start += text.len() - trimmed.len();
        text = trimmed;
    }
    if trim_end {
        text = text.trim_end_matches(is_space);
    }
    if !text.is_empty() {
        segments.push(Segment::Text {
            text: text.to_string(),
            span: start..start + text.len(),
        });
    }
}

/// Split `source` into text and action segments
pub fn scan(source: &str, delimiters: &DelimiterPair) -> Result<Vec<Segment>, TemplateSyntaxError> {
    let left = delimiters.left.as_str();
    let right = delimiters.right.as_str();
    if left.is_empty() || right.is_empty() {
        return Err(TemplateSyntaxError::new(0..0, "delimiters must not be empty"));
    }

    let mut segments = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    while let Some(found) = source[pos..].find(left) {
        let open_start = pos + found;
        let mut body_start = open_start + left.len();
        let trim_before = has_left_trim(&source[body_start..]);
        if trim_before {
            // marker plus the single whitespace character after it
            body_start += 2;
        }
        push_text(&mut segments, source, pos..open_start, trim_next, trim_before);

        let close = find_close(source, body_start, right).ok_or_else(|| {
            TemplateSyntaxError::new(open_start..source.len(), "unclosed action")
        })?;
        let close_end = close.delim_start + right.len();
        segments.push(Segment::Action {
            open: open_start..body_start,
            body: body_start..close.body_end,
            close: close.body_end..close_end,
        });

        pos = close_end;
        trim_next = close.trim_after;
    }
    push_text(&mut segments, source, pos..source.len(), trim_next, false);

    Ok(segments)
}
