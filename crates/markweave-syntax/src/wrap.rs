//! Markdown constructs as fragment trees.
//!
//! Each function wraps its content in syntax delimiters, so
//! `bold(x).syntax_length() == 4` whatever `x` is. Content is passed as a
//! [`Fragment`]; use [`escaped`] for untrusted text.

use std::borrow::Cow;

use markweave_engine::Fragment;

use crate::escape::{EscapedText, fence_length, inline_code_ticks};

/// Text with markdown metacharacters escaped.
pub fn escaped(text: impl Into<Cow<'static, str>>) -> Fragment {
    Fragment::leaf(EscapedText::new(text))
}

fn delimited(delimiter: &'static str, inner: Fragment) -> Fragment {
    Fragment::wrapped(
        Fragment::syntax(delimiter),
        inner,
        Fragment::syntax(delimiter),
    )
}

pub fn bold(inner: Fragment) -> Fragment {
    delimited("**", inner)
}

pub fn italic(inner: Fragment) -> Fragment {
    delimited("_", inner)
}

pub fn underline(inner: Fragment) -> Fragment {
    delimited("__", inner)
}

pub fn strikethrough(inner: Fragment) -> Fragment {
    delimited("~~", inner)
}

pub fn spoiler(inner: Fragment) -> Fragment {
    delimited("||", inner)
}

/// Inline code with enough backticks to contain any backticks in `code`.
///
/// Code that starts or ends with a backtick is padded with a space so the
/// fence stays unambiguous. Empty code becomes a span holding one space,
/// since two bare backticks are not a code span.
pub fn inline_code(code: impl Into<Cow<'static, str>>) -> Fragment {
    let code = code.into();
    if code.is_empty() {
        return Fragment::syntax("` `");
    }
    let fence = "`".repeat(inline_code_ticks(&code));
    let padded = code.starts_with('`') || code.ends_with('`');
    let (open, close) = if padded {
        (format!("{fence} "), format!(" {fence}"))
    } else {
        (fence.clone(), fence)
    };
    Fragment::wrapped(Fragment::syntax(open), Fragment::text(code), Fragment::syntax(close))
}

/// Fenced code block, with an optional info string.
pub fn code_block(code: impl Into<Cow<'static, str>>, language: Option<&str>) -> Fragment {
    let code = code.into();
    let fence = "`".repeat(fence_length(&code, '`'));
    let open = format!("{fence}{}\n", language.unwrap_or_default());
    let close = if code.is_empty() || code.ends_with('\n') {
        fence
    } else {
        format!("\n{fence}")
    };
    Fragment::wrapped(Fragment::syntax(open), Fragment::text(code), Fragment::syntax(close))
}

/// Inline link; the URL counts as syntax.
///
/// URLs that would end the destination early (spaces, unbalanced
/// parentheses, a leading `<`) are written in angle brackets.
pub fn link(label: Fragment, url: impl AsRef<str>) -> Fragment {
    Fragment::wrapped(
        Fragment::syntax("["),
        label,
        Fragment::syntax(format!("]({})", link_destination(url.as_ref()))),
    )
}

fn link_destination(url: &str) -> Cow<'_, str> {
    let bracketed = url.starts_with('<')
        || url.chars().any(|c| c.is_whitespace() || c.is_control())
        || !parentheses_balanced(url);
    if !bracketed {
        return Cow::Borrowed(url);
    }

    let mut out = String::with_capacity(url.len() + 2);
    out.push('<');
    for c in url.chars() {
        match c {
            '<' | '>' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("%0A"),
            '\r' => out.push_str("%0D"),
            _ => out.push(c),
        }
    }
    out.push('>');
    Cow::Owned(out)
}

fn parentheses_balanced(url: &str) -> bool {
    let mut depth = 0usize;
    for c in url.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

/// ATX heading; `level` is clamped to `1..=6`.
pub fn heading(level: u8, inner: Fragment) -> Fragment {
    let marker = "#".repeat(usize::from(level.clamp(1, 6)));
    Fragment::concat(Fragment::syntax(format!("{marker} ")), inner)
}

/// Block quote with one `> ` prefixed line per item.
pub fn block_quote<I>(lines: I) -> Fragment
where
    I: IntoIterator<Item = Fragment>,
{
    Fragment::join_with(
        lines
            .into_iter()
            .map(|line| Fragment::concat(Fragment::syntax("> "), line)),
        Fragment::syntax("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use markweave_engine::Node;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(bold, "**x**")]
    #[case(italic, "_x_")]
    #[case(underline, "__x__")]
    #[case(strikethrough, "~~x~~")]
    #[case(spoiler, "||x||")]
    fn delimiters(#[case] wrap: fn(Fragment) -> Fragment, #[case] expected: &str) {
        let node = wrap(Fragment::text("x"));
        assert_eq!(node.to_string(), expected);
        assert_eq!(node.content_length(), 1);
    }

    #[test]
    fn nested_wrappers_sum_syntax() {
        let node = bold(italic(Fragment::text("both")));
        assert_eq!(node.to_string(), "**_both_**");
        assert_eq!(node.syntax_length(), 6);
        assert_eq!(node.content_length(), 4);
    }

    #[rstest]
    #[case("x + y", "`x + y`")]
    #[case("a ` b", "``a ` b``")]
    #[case("`tick", "`` `tick ``")]
    #[case("", "` `")]
    fn inline_code_fences(#[case] code: &'static str, #[case] expected: &str) {
        assert_eq!(inline_code(code).to_string(), expected);
    }

    #[test]
    fn code_block_closes_on_new_line() {
        let node = code_block("fn main() {}", Some("rust"));
        assert_eq!(node.to_string(), "```rust\nfn main() {}\n```");

        let trailing = code_block("x\n", None);
        assert_eq!(trailing.to_string(), "```\nx\n```");
    }

    #[test]
    fn code_block_outgrows_inner_fence() {
        let node = code_block("```\nnested\n```", None);
        assert_eq!(node.to_string(), "````\n```\nnested\n```\n````");
    }

    #[test]
    fn link_counts_url_as_syntax() {
        let node = link(Fragment::text("docs"), "https://example.com");
        assert_eq!(node.to_string(), "[docs](https://example.com)");
        assert_eq!(node.content_length(), 4);
    }

    #[rstest]
    #[case("https://example.com/a_(b)", "[x](https://example.com/a_(b))")]
    #[case("my file.md", "[x](<my file.md>)")]
    #[case("https://example.com/a)", "[x](<https://example.com/a)>)")]
    #[case("<odd>", "[x](<\\<odd\\>>)")]
    #[case("a\nb", "[x](<a%0Ab>)")]
    fn link_destinations(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(link(Fragment::text("x"), url).to_string(), expected);
    }

    #[rstest]
    #[case(0, "# T")]
    #[case(2, "## T")]
    #[case(9, "###### T")]
    fn heading_levels(#[case] level: u8, #[case] expected: &str) {
        assert_eq!(heading(level, Fragment::text("T")).to_string(), expected);
    }

    #[test]
    fn block_quote_prefixes_every_line() {
        let node = block_quote([Fragment::text("one"), Fragment::value(2)]);
        assert_eq!(node.to_string(), "> one\n> 2");
    }

    #[test]
    fn escaped_text_inside_wrapper() {
        let node = bold(escaped("2*3"));
        assert_eq!(node.to_string(), "**2\\*3**");
        assert_eq!(node.syntax_length(), 5);
    }
}
