use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt::{self, Write as _};
use std::ops::Deref;
use std::sync::Arc;

use crate::error::InsufficientBuffer;
use crate::format::{FormatSpec, FormatValue, Locale, ValueNode};
use crate::node::{Composite, Node, TextNode, ensure_capacity};

/// An owned fragment tree.
///
/// Cloning is cheap: leaves and composites are shared, and nodes never change
/// after construction. Walking, rendering and dropping a tree use an explicit
/// stack, so trees built by repeated [`concat`](Self::concat) may be as deep
/// as memory allows.
#[derive(Clone)]
pub enum Fragment {
    Text(TextNode),
    Leaf(Arc<dyn Node + Send + Sync>),
    Concat(Arc<Concat>),
}

/// Shared interior of [`Fragment::Concat`].
pub struct Concat(Composite<Fragment, Fragment>);

impl Deref for Concat {
    type Target = Composite<Fragment, Fragment>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for Concat {
    fn drop(&mut self) {
        let (left, right) = self.0.children_mut();
        let mut pending = vec![std::mem::take(left), std::mem::take(right)];
        while let Some(fragment) = pending.pop() {
            // Shared subtrees are left to their other owners.
            if let Fragment::Concat(shared) = fragment
                && let Some(mut inner) = Arc::into_inner(shared)
            {
                let (left, right) = inner.0.children_mut();
                pending.push(std::mem::take(left));
                pending.push(std::mem::take(right));
            }
        }
    }
}

impl Fragment {
    pub fn empty() -> Self {
        Fragment::Text(TextNode::new(""))
    }

    pub fn text(text: impl Into<Cow<'static, str>>) -> Self {
        Fragment::Text(TextNode::new(text))
    }

    /// Delimiter text, counted as syntax.
    pub fn syntax(delimiter: impl Into<Cow<'static, str>>) -> Self {
        Fragment::Text(TextNode::syntax(delimiter))
    }

    /// A formattable value with its family's default settings.
    pub fn value<T>(value: T) -> Self
    where
        T: FormatValue + Send + Sync + 'static,
    {
        Self::leaf(ValueNode::new(value))
    }

    pub fn value_with<T>(value: T, spec: FormatSpec, locale: Locale) -> Self
    where
        T: FormatValue + Send + Sync + 'static,
    {
        Self::leaf(ValueNode::with_format(value, spec, locale))
    }

    /// Wraps any other node implementation.
    pub fn leaf<N>(node: N) -> Self
    where
        N: Node + Send + Sync + 'static,
    {
        Fragment::Leaf(Arc::new(node))
    }

    pub fn concat(left: Fragment, right: Fragment) -> Self {
        Fragment::Concat(Arc::new(Concat(Composite::new(left, right))))
    }

    /// `prefix`, then `inner`, then `suffix`.
    pub fn wrapped(prefix: Fragment, inner: Fragment, suffix: Fragment) -> Self {
        Self::concat(Self::concat(prefix, inner), suffix)
    }

    /// Concatenates all parts in order.
    ///
    /// The tree is built pairwise so its depth grows with the logarithm of
    /// the part count.
    pub fn join<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        let mut level: Vec<Fragment> = parts.into_iter().collect();
        if level.is_empty() {
            return Self::empty();
        }
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut parts = level.into_iter();
            while let Some(left) = parts.next() {
                match parts.next() {
                    Some(right) => next.push(Self::concat(left, right)),
                    None => next.push(left),
                }
            }
            level = next;
        }
        level.pop().unwrap_or_else(Self::empty)
    }

    /// Concatenates all parts with `separator` between neighbours.
    pub fn join_with<I>(parts: I, separator: Fragment) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        let mut joined = Vec::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                joined.push(separator.clone());
            }
            joined.push(part);
        }
        Self::join(joined)
    }

    fn as_node(&self) -> &dyn Node {
        match self {
            Fragment::Text(node) => node,
            Fragment::Leaf(node) => node.as_ref(),
            Fragment::Concat(node) => &node.0,
        }
    }

    /// Text and leaves in output order, without recursing into composites.
    fn for_each_chunk<E, F>(&self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(&Fragment) -> Result<(), E>,
    {
        let mut pending = vec![self];
        while let Some(fragment) = pending.pop() {
            match fragment {
                Fragment::Concat(node) => {
                    pending.push(node.right());
                    pending.push(node.left());
                }
                chunk => visit(chunk)?,
            }
        }
        Ok(())
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::empty()
    }
}

/// Fills the length cache of every composite under `root`, deepest first.
fn concat_length(root: &Concat) -> usize {
    let mut pending: Vec<&Concat> = vec![root];
    while let Some(&node) = pending.last() {
        if node.cached_length().is_some() {
            pending.pop();
            continue;
        }
        let mut ready = true;
        for child in [node.left(), node.right()] {
            if let Fragment::Concat(inner) = child
                && inner.cached_length().is_none()
            {
                pending.push(inner);
                ready = false;
            }
        }
        if ready {
            // Both children are cached composites or non-composite chunks.
            node.cache_length(node.left().total_length() + node.right().total_length());
            pending.pop();
        }
    }
    root.0.total_length()
}

impl Node for Fragment {
    fn syntax_length(&self) -> usize {
        let mut syntax = 0;
        let Ok(()) = self.for_each_chunk(|chunk| -> Result<(), Infallible> {
            syntax += chunk.as_node().syntax_length();
            Ok(())
        });
        syntax
    }

    fn total_length(&self) -> usize {
        match self {
            Fragment::Concat(node) => concat_length(node),
            chunk => chunk.as_node().total_length(),
        }
    }

    fn copy_to(&self, dest: &mut [char]) -> Result<usize, InsufficientBuffer> {
        let total = self.total_length();
        ensure_capacity(dest, total)?;

        let mut offset = 0;
        self.for_each_chunk(|chunk| -> Result<(), InsufficientBuffer> {
            let written = chunk.as_node().copy_to(&mut dest[offset..])?;
            offset += written;
            Ok(())
        })?;
        Ok(total)
    }

    fn try_get_char(&self, index: usize) -> Option<char> {
        if index >= self.total_length() {
            return None;
        }

        let mut current = self;
        let mut index = index;
        loop {
            match current {
                Fragment::Concat(node) => {
                    let left_len = node.left().total_length();
                    if index < left_len {
                        current = node.left();
                    } else {
                        index -= left_len;
                        current = node.right();
                    }
                }
                chunk => return chunk.as_node().try_get_char(index),
            }
        }
    }
}

/// Streams the tree chunk by chunk, so rendering is not bound by any builder
/// maximum. Use [`Node::try_render`] for a size-checked string.
impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scratch = Vec::new();
        self.for_each_chunk(|chunk| match chunk {
            Fragment::Text(node) => f.write_str(node.as_str()),
            leaf => {
                let node = leaf.as_node();
                let len = node.total_length();
                scratch.clear();
                scratch.resize(len, '\0');
                match node.copy_to(&mut scratch) {
                    Ok(written) => scratch[..written].iter().try_for_each(|&c| f.write_char(c)),
                    Err(e) => {
                        log::warn!("Leaf refused an exact buffer ({e}), reading it by index");
                        (0..len)
                            .map_while(|i| node.try_get_char(i))
                            .try_for_each(|c| f.write_char(c))
                    }
                }
            }
        })
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Text(node) => f.debug_tuple("Text").field(&node.as_str()).finish(),
            Fragment::Leaf(node) => f
                .debug_struct("Leaf")
                .field("total_length", &node.total_length())
                .finish_non_exhaustive(),
            Fragment::Concat(node) => f
                .debug_tuple("Concat")
                .field(node.left())
                .field(node.right())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComposeError;
    use pretty_assertions::assert_eq;

    #[test]
    fn scenario_integer_leaf() {
        let node = Fragment::value(42);
        assert_eq!(node.total_length(), 2);
        assert_eq!(node.to_string(), "42");
        assert_eq!(node.try_get_char(2), None);
    }

    #[test]
    fn scenario_hello_world() {
        let node = Fragment::concat(Fragment::text("Hello, "), Fragment::text("World!"));
        assert_eq!(node.total_length(), 13);
        assert_eq!(node.to_string(), "Hello, World!");
    }

    #[test]
    fn join_preserves_order() {
        let parts = (0..10).map(Fragment::value);
        assert_eq!(Fragment::join(parts).to_string(), "0123456789");
    }

    #[test]
    fn join_of_nothing_is_empty() {
        let node = Fragment::join(Vec::new());
        assert_eq!(node.total_length(), 0);
        assert_eq!(node.to_string(), "");
    }

    #[test]
    fn join_with_separator() {
        let parts = ["a", "b", "c"].map(Fragment::text);
        let node = Fragment::join_with(parts, Fragment::text(", "));
        assert_eq!(node.to_string(), "a, b, c");
    }

    #[test]
    fn join_many_parts_stays_shallow() {
        let parts = (0..10_000).map(|_| Fragment::text("x"));
        let node = Fragment::join(parts);
        assert_eq!(node.total_length(), 10_000);
        assert_eq!(node.try_get_char(9_999), Some('x'));
        assert_eq!(node.to_string().len(), 10_000);
    }

    #[test]
    fn wrapped_counts_delimiters_as_syntax() {
        let node = Fragment::wrapped(
            Fragment::syntax("||"),
            Fragment::text("secret"),
            Fragment::syntax("||"),
        );
        assert_eq!(node.to_string(), "||secret||");
        assert_eq!(node.syntax_length(), 4);
        assert_eq!(node.content_length(), 6);
    }

    #[test]
    fn clones_share_structure() {
        let node = Fragment::concat(Fragment::value(1.5), Fragment::text("x"));
        let copy = node.clone();
        assert_eq!(node.to_string(), copy.to_string());
    }

    #[test]
    fn display_is_not_bound_by_builder_maximum() {
        let half = "x".repeat(9 << 20);
        let node = Fragment::concat(Fragment::text(half.clone()), Fragment::text(half));

        assert!(matches!(
            node.try_render(),
            Err(ComposeError::CapacityExceeded { .. })
        ));
        let rendered = node.to_string();
        assert_eq!(rendered.len(), 18 << 20);
        assert_eq!(rendered.len(), node.total_length());
    }

    #[test]
    fn display_streams_leaves_in_order() {
        let node = Fragment::join([
            Fragment::value(-3),
            Fragment::syntax("**"),
            Fragment::value('é'),
            Fragment::text(" ok"),
        ]);
        assert_eq!(format!("[{node}]"), "[-3**é ok]");
    }

    #[test]
    fn left_nested_concat_chain_is_safe() {
        const DEPTH: usize = 100_000;
        let mut node = Fragment::text("a");
        for _ in 0..DEPTH {
            node = Fragment::concat(node, Fragment::syntax("b"));
        }

        assert_eq!(node.total_length(), DEPTH + 1);
        assert_eq!(node.syntax_length(), DEPTH);
        assert_eq!(node.content_length(), 1);
        assert_eq!(node.try_get_char(0), Some('a'));
        assert_eq!(node.try_get_char(DEPTH), Some('b'));
        assert_eq!(node.try_get_char(DEPTH + 1), None);

        let mut buf = vec!['\0'; DEPTH + 1];
        assert_eq!(node.copy_to(&mut buf), Ok(DEPTH + 1));
        assert_eq!(buf[..2], ['a', 'b']);

        let rendered = node.try_render().unwrap();
        assert_eq!(rendered, node.to_string());
        drop(node);
    }

    #[test]
    fn right_nested_chain_with_shared_subtree() {
        const DEPTH: usize = 100_000;
        let shared = Fragment::join((0..4).map(Fragment::value));
        let mut node = Fragment::empty();
        for _ in 0..DEPTH {
            node = Fragment::concat(Fragment::text("-"), node);
        }
        node = Fragment::concat(node, shared.clone());

        assert_eq!(node.total_length(), DEPTH + 4);
        assert_eq!(node.try_get_char(DEPTH + 3), Some('3'));
        drop(node);

        // The shared part outlives the tree it was attached to.
        assert_eq!(shared.to_string(), "0123");
    }

    #[test]
    fn debug_shows_tree_shape() {
        let node = Fragment::concat(Fragment::text("a"), Fragment::text("b"));
        assert_eq!(format!("{node:?}"), r#"Concat(Text("a"), Text("b"))"#);
    }
}
