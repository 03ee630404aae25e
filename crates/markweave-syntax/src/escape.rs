//! Markdown escaping without intermediate strings.
//!
//! [`EscapedText`] is a node whose output is its source text with a
//! backslash in front of every character that would otherwise be read as
//! markdown. The backslashes are counted once at construction, so the node
//! knows its length without building the escaped string.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

use markweave_engine::{InsufficientBuffer, Node};

/// Whether `c` needs a backslash in front of it.
///
/// `#` only matters at the start of a line and `!` only before `[`.
fn needs_escape(c: char, at_line_start: bool, next: Option<char>) -> bool {
    match c {
        '\\' | '*' | '_' | '[' | ']' | '`' | '|' | '<' | '>' | '~' => true,
        '#' => at_line_start,
        '!' => next == Some('['),
        _ => false,
    }
}

/// The escaped form of a string, one char at a time.
#[derive(Debug, Clone)]
pub struct EscapedChars<'a> {
    chars: Peekable<Chars<'a>>,
    pending: Option<char>,
    at_line_start: bool,
}

impl<'a> EscapedChars<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            pending: None,
            at_line_start: true,
        }
    }
}

impl Iterator for EscapedChars<'_> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        if let Some(c) = self.pending.take() {
            return Some(c);
        }
        let c = self.chars.next()?;
        let escape = needs_escape(c, self.at_line_start, self.chars.peek().copied());
        self.at_line_start = c == '\n';
        if escape {
            self.pending = Some(c);
            Some('\\')
        } else {
            Some(c)
        }
    }
}

/// Escapes `text` into a new string.
pub fn escape_markdown(text: &str) -> String {
    EscapedChars::new(text).collect()
}

/// Smallest backtick run (at least 1) that does not occur in `content`.
pub fn inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}

/// Smallest fence (at least 3) of `fence_char` that does not occur in
/// `content`.
pub fn fence_length(content: &str, fence_char: char) -> usize {
    longest_run(content, fence_char).max(2) + 1
}

fn longest_run(content: &str, target: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in content.chars() {
        if c == target {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Literal content that renders with markdown metacharacters escaped.
///
/// The inserted backslashes count as syntax; the source characters count as
/// content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapedText {
    text: Cow<'static, str>,
    char_len: usize,
    escapes: usize,
}

impl EscapedText {
    pub fn new(text: impl Into<Cow<'static, str>>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        let escapes = EscapedChars::new(&text).count() - char_len;
        Self {
            text,
            char_len,
            escapes,
        }
    }

    pub fn source(&self) -> &str {
        &self.text
    }

    pub fn escape_count(&self) -> usize {
        self.escapes
    }
}

impl Node for EscapedText {
    fn syntax_length(&self) -> usize {
        self.escapes
    }

    fn total_length(&self) -> usize {
        self.char_len + self.escapes
    }

    fn copy_to(&self, dest: &mut [char]) -> Result<usize, InsufficientBuffer> {
        let len = self.total_length();
        if dest.len() < len {
            return Err(InsufficientBuffer {
                required: len,
                available: dest.len(),
            });
        }
        for (slot, c) in dest.iter_mut().zip(EscapedChars::new(&self.text)) {
            *slot = c;
        }
        Ok(len)
    }

    fn try_get_char(&self, index: usize) -> Option<char> {
        if self.escapes == 0 {
            return self.text.chars().nth(index);
        }
        EscapedChars::new(&self.text).nth(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("plain text", "plain text")]
    #[case("a\\b", "a\\\\b")]
    #[case("*bold*", "\\*bold\\*")]
    #[case("_italic_", "\\_italic\\_")]
    #[case("[link]", "\\[link\\]")]
    #[case("`code`", "\\`code\\`")]
    #[case("a | b", "a \\| b")]
    #[case("<tag>", "\\<tag\\>")]
    #[case("~~gone~~", "\\~\\~gone\\~\\~")]
    #[case("![img]", "\\!\\[img\\]")]
    #[case("wow!", "wow!")]
    fn escapes_metacharacters(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_markdown(input), expected);
    }

    #[test]
    fn hash_only_escaped_at_line_start() {
        assert_eq!(escape_markdown("# Title"), "\\# Title");
        assert_eq!(escape_markdown("issue #5"), "issue #5");
        assert_eq!(escape_markdown("a\n# b"), "a\n\\# b");
    }

    #[rstest]
    #[case("code", 1)]
    #[case("a ` b", 2)]
    #[case("a `` b ` c", 3)]
    fn inline_ticks(#[case] content: &str, #[case] expected: usize) {
        assert_eq!(inline_code_ticks(content), expected);
    }

    #[rstest]
    #[case("let x = 1;", '`', 3)]
    #[case("```rust\ncode\n```", '`', 4)]
    #[case("~~~~~", '~', 6)]
    fn fences(#[case] content: &str, #[case] fence_char: char, #[case] expected: usize) {
        assert_eq!(fence_length(content, fence_char), expected);
    }

    #[test]
    fn node_length_includes_backslashes() {
        let node = EscapedText::new("2 * 3 = [six]");
        assert_eq!(node.escape_count(), 3);
        assert_eq!(node.total_length(), 16);
        assert_eq!(node.syntax_length(), 3);
        assert_eq!(node.content_length(), 13);
        assert_eq!(node.try_render().unwrap(), "2 \\* 3 = \\[six\\]");
    }

    #[test]
    fn node_get_char_sees_escapes() {
        let node = EscapedText::new("a*b");
        let chars: Vec<_> = (0..5).map(|i| node.try_get_char(i)).collect();
        assert_eq!(chars, [Some('a'), Some('\\'), Some('*'), Some('b'), None]);
    }

    #[test]
    fn node_short_buffer_untouched() {
        let node = EscapedText::new("_x_");
        let mut buf = ['.'; 4];
        assert!(node.copy_to(&mut buf).is_err());
        assert_eq!(buf, ['.'; 4]);
    }
}
