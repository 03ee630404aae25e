//! # markweave-syntax
//!
//! Markdown on top of the markweave node contract. Every construct here is a
//! plain [`Fragment`](markweave_engine::Fragment) tree, so the delimiters are
//! counted as syntax and the rendered length is known before anything is
//! written.
//!
//! ```
//! use markweave_engine::{Fragment, Node};
//! use markweave_syntax::{bold, escaped, link};
//!
//! let node = link(bold(escaped("v2_final")), "https://example.com");
//! assert_eq!(node.to_string(), "[**v2\\_final**](https://example.com)");
//! assert_eq!(node.content_length(), 8);
//! ```
//!
//! ## Modules
//!
//! - **`escape`**: [`EscapedText`], a node that escapes markdown
//!   metacharacters without building an intermediate string, plus fence and
//!   backtick sizing helpers
//! - **`wrap`**: wrapper constructors (bold, italic, code, links, ...)

pub mod escape;
pub mod wrap;

pub use escape::{EscapedText, escape_markdown, fence_length, inline_code_ticks};
pub use wrap::{
    block_quote, bold, code_block, escaped, heading, inline_code, italic, link, spoiler,
    strikethrough, underline,
};
