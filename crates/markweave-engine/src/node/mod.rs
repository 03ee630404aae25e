//! # Nodes
//!
//! A node is an immutable piece of text that knows its own length before it
//! is written anywhere. Materialising a tree therefore takes exactly one
//! allocation of the right size followed by one pass of [`Node::copy_to`].
//!
//! ## Modules
//!
//! - **`text`**: [`TextNode`], a literal string (content or syntax)
//! - **`composite`**: [`Composite`], binary concatenation of any two nodes
//! - **`fragment`**: [`Fragment`], the owned sum type used to build trees
//!
//! Formattable values live in [`crate::format::ValueNode`].
//!
//! ## Lengths
//!
//! Every length and index is counted in `char`s. For all nodes
//! `total_length() == syntax_length() + content_length()`, where syntax is
//! delimiter overhead (`**` around bold text, for example).

pub mod composite;
pub mod fragment;
pub mod text;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::builder::StringBuilder;
use crate::error::{ComposeError, InsufficientBuffer};

pub use composite::Composite;
pub use fragment::Fragment;
pub use text::TextNode;

/// Shared capability of every composable fragment.
pub trait Node {
    /// Delimiter characters contributed by this node and its descendants.
    fn syntax_length(&self) -> usize;

    /// Characters [`copy_to`](Self::copy_to) will write.
    fn total_length(&self) -> usize;

    /// Writes exactly `total_length()` chars to the start of `dest`.
    ///
    /// Fails without touching `dest` when it is shorter than
    /// `total_length()`.
    fn copy_to(&self, dest: &mut [char]) -> Result<usize, InsufficientBuffer>;

    /// The char [`copy_to`](Self::copy_to) would write at `index`, or `None`
    /// past the end.
    fn try_get_char(&self, index: usize) -> Option<char>;

    fn content_length(&self) -> usize {
        self.total_length() - self.syntax_length()
    }

    /// Materialises the node with the default builder settings.
    fn try_render(&self) -> Result<String, ComposeError> {
        StringBuilder::default().render(self)
    }
}

impl<N: Node + ?Sized> Node for &N {
    fn syntax_length(&self) -> usize {
        (**self).syntax_length()
    }

    fn total_length(&self) -> usize {
        (**self).total_length()
    }

    fn copy_to(&self, dest: &mut [char]) -> Result<usize, InsufficientBuffer> {
        (**self).copy_to(dest)
    }

    fn try_get_char(&self, index: usize) -> Option<char> {
        (**self).try_get_char(index)
    }
}

impl<N: Node + ?Sized> Node for Box<N> {
    fn syntax_length(&self) -> usize {
        (**self).syntax_length()
    }

    fn total_length(&self) -> usize {
        (**self).total_length()
    }

    fn copy_to(&self, dest: &mut [char]) -> Result<usize, InsufficientBuffer> {
        (**self).copy_to(dest)
    }

    fn try_get_char(&self, index: usize) -> Option<char> {
        (**self).try_get_char(index)
    }
}

impl<N: Node + ?Sized> Node for Arc<N> {
    fn syntax_length(&self) -> usize {
        (**self).syntax_length()
    }

    fn total_length(&self) -> usize {
        (**self).total_length()
    }

    fn copy_to(&self, dest: &mut [char]) -> Result<usize, InsufficientBuffer> {
        (**self).copy_to(dest)
    }

    fn try_get_char(&self, index: usize) -> Option<char> {
        (**self).try_get_char(index)
    }
}

const UNSET: usize = usize::MAX;

/// Write-once memo for a node's total length.
///
/// Racing threads may each compute the length, but they compute the same
/// value and a store is a single atomic word, so readers never observe a
/// torn or inconsistent length.
pub struct LengthCache(AtomicUsize);

impl LengthCache {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(UNSET))
    }

    pub fn get(&self) -> Option<usize> {
        match self.0.load(Ordering::Acquire) {
            UNSET => None,
            len => Some(len),
        }
    }

    pub fn set(&self, len: usize) {
        debug_assert!(self.get().is_none_or(|cached| cached == len));
        self.0.store(len, Ordering::Release);
    }

    pub fn get_or_init<F>(&self, compute: F) -> usize
    where
        F: FnOnce() -> usize,
    {
        if let Some(len) = self.get() {
            return len;
        }
        let len = compute();
        self.set(len);
        len
    }
}

impl Default for LengthCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LengthCache {
    fn clone(&self) -> Self {
        Self(AtomicUsize::new(self.0.load(Ordering::Acquire)))
    }
}

impl fmt::Debug for LengthCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LengthCache").field(&self.get()).finish()
    }
}

/// Fails with the exact requirement when `dest` cannot hold `len` chars.
pub(crate) fn ensure_capacity(dest: &[char], len: usize) -> Result<(), InsufficientBuffer> {
    if dest.len() < len {
        return Err(InsufficientBuffer {
            required: len,
            available: dest.len(),
        });
    }
    Ok(())
}
