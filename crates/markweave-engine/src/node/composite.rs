use crate::error::InsufficientBuffer;
use crate::node::{LengthCache, Node, ensure_capacity};

/// Concatenation of two nodes of any kind.
#[derive(Debug, Clone)]
pub struct Composite<L, R> {
    left: L,
    right: R,
    total: LengthCache,
}

impl<L: Node, R: Node> Composite<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self {
            left,
            right,
            total: LengthCache::new(),
        }
    }

    pub fn left(&self) -> &L {
        &self.left
    }

    pub fn right(&self) -> &R {
        &self.right
    }

    pub(crate) fn cached_length(&self) -> Option<usize> {
        self.total.get()
    }

    pub(crate) fn cache_length(&self, len: usize) {
        self.total.set(len);
    }

    pub(crate) fn children_mut(&mut self) -> (&mut L, &mut R) {
        (&mut self.left, &mut self.right)
    }
}

impl<L: Node, R: Node> Node for Composite<L, R> {
    fn syntax_length(&self) -> usize {
        self.left.syntax_length() + self.right.syntax_length()
    }

    fn total_length(&self) -> usize {
        self.total
            .get_or_init(|| self.left.total_length() + self.right.total_length())
    }

    fn copy_to(&self, dest: &mut [char]) -> Result<usize, InsufficientBuffer> {
        ensure_capacity(dest, self.total_length())?;
        let (head, tail) = dest.split_at_mut(self.left.total_length());
        let left = self.left.copy_to(head)?;
        let right = self.right.copy_to(tail)?;
        Ok(left + right)
    }

    fn try_get_char(&self, index: usize) -> Option<char> {
        if let Some(total) = self.total.get()
            && index >= total
        {
            return None;
        }

        let left_len = self.left.total_length();
        if index < left_len {
            self.left.try_get_char(index)
        } else {
            self.right.try_get_char(index - left_len)
        }
    }
}
