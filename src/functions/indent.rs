//! The `indentWithSpaces` transformer

use crate::error::RenderError;

/// Widest indentation `indentWithSpaces` accepts
pub const MAX_INDENT: usize = 4096;

/// Prefix `text` with one block of `count` spaces
///
/// Only the first line receives the indentation; following lines are left
/// as they are. Empty input stays empty.
pub fn indent_with_spaces(count: usize, text: &str) -> Result<String, RenderError> {
    if count > MAX_INDENT {
        return Err(RenderError::IndentTooWide {
            count: count as u64,
            max: MAX_INDENT,
        });
    }
    if text.is_empty() {
        return Ok(String::new());
    }

    let mut out = String::with_capacity(count + text.len());
    out.extend(std::iter::repeat(' ').take(count));
    out.push_str(text);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input() {
        assert_eq!(indent_with_spaces(4, "").unwrap(), "");
    }

    #[test]
    fn test_single_leading_block() {
        assert_eq!(indent_with_spaces(4, "a\nb\n").unwrap(), "    a\nb\n");
    }

    #[test]
    fn test_without_trailing_newline() {
        assert_eq!(indent_with_spaces(2, "a\nb").unwrap(), "  a\nb");
    }

    #[test]
    fn test_zero_spaces() {
        assert_eq!(indent_with_spaces(0, "x\n").unwrap(), "x\n");
    }

    #[test]
    fn test_width_limit() {
        assert_eq!(indent_with_spaces(MAX_INDENT, "x").unwrap().len(), MAX_INDENT + 1);
        assert_eq!(
            indent_with_spaces(usize::MAX, "x"),
            Err(RenderError::IndentTooWide {
                count: usize::MAX as u64,
                max: MAX_INDENT
            })
        );
    }
}
