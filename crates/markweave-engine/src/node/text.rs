use std::borrow::Cow;

use crate::error::InsufficientBuffer;
use crate::node::{Node, ensure_capacity};

/// A literal string.
///
/// Content literals have a syntax length of zero; syntax literals (markdown
/// delimiters and the like) count entirely as syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    text: Cow<'static, str>,
    char_len: usize,
    syntax: bool,
}

impl TextNode {
    pub fn new(text: impl Into<Cow<'static, str>>) -> Self {
        Self::build(text.into(), false)
    }

    pub fn syntax(delimiter: impl Into<Cow<'static, str>>) -> Self {
        Self::build(delimiter.into(), true)
    }

    fn build(text: Cow<'static, str>, syntax: bool) -> Self {
        let char_len = text.chars().count();
        Self {
            text,
            char_len,
            syntax,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_syntax(&self) -> bool {
        self.syntax
    }

    fn is_ascii(&self) -> bool {
        self.text.len() == self.char_len
    }
}

impl Node for TextNode {
    fn syntax_length(&self) -> usize {
        if self.syntax { self.char_len } else { 0 }
    }

    fn total_length(&self) -> usize {
        self.char_len
    }

    fn copy_to(&self, dest: &mut [char]) -> Result<usize, InsufficientBuffer> {
        ensure_capacity(dest, self.char_len)?;
        for (slot, c) in dest.iter_mut().zip(self.text.chars()) {
            *slot = c;
        }
        Ok(self.char_len)
    }

    fn try_get_char(&self, index: usize) -> Option<char> {
        if index >= self.char_len {
            return None;
        }
        if self.is_ascii() {
            return self.text.as_bytes().get(index).map(|&b| b as char);
        }
        self.text.chars().nth(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn content_text_has_no_syntax() {
        let node = TextNode::new("Hello");
        assert_eq!(node.total_length(), 5);
        assert_eq!(node.syntax_length(), 0);
        assert_eq!(node.content_length(), 5);
    }

    #[test]
    fn syntax_text_is_all_syntax() {
        let node = TextNode::syntax("**");
        assert_eq!(node.total_length(), 2);
        assert_eq!(node.syntax_length(), 2);
        assert_eq!(node.content_length(), 0);
    }

    #[rstest]
    #[case("plain", 5)]
    #[case("héllo", 5)]
    #[case("日本語", 3)]
    #[case("🦀 crab", 6)]
    #[case("", 0)]
    fn length_counts_chars_not_bytes(#[case] text: &'static str, #[case] expected: usize) {
        assert_eq!(TextNode::new(text).total_length(), expected);
    }

    #[test]
    fn copy_to_exact_buffer() {
        let node = TextNode::new("héllo");
        let mut buf = ['\0'; 5];
        assert_eq!(node.copy_to(&mut buf), Ok(5));
        assert_eq!(buf.iter().collect::<String>(), "héllo");
    }

    #[test]
    fn copy_to_short_buffer_leaves_it_untouched() {
        let node = TextNode::new("hello");
        let mut buf = ['-'; 4];
        assert_eq!(
            node.copy_to(&mut buf),
            Err(InsufficientBuffer {
                required: 5,
                available: 4
            })
        );
        assert_eq!(buf, ['-'; 4]);
    }

    #[test]
    fn get_char_handles_ascii_and_unicode() {
        let ascii = TextNode::new("abc");
        assert_eq!(ascii.try_get_char(1), Some('b'));
        assert_eq!(ascii.try_get_char(3), None);

        let unicode = TextNode::new("a日c");
        assert_eq!(unicode.try_get_char(1), Some('日'));
        assert_eq!(unicode.try_get_char(2), Some('c'));
        assert_eq!(unicode.try_get_char(3), None);
    }

    #[test]
    fn owned_and_borrowed_text_compare_equal() {
        assert_eq!(TextNode::new("x"), TextNode::new(String::from("x")));
        assert_ne!(TextNode::new("x"), TextNode::syntax("x"));
    }
}
