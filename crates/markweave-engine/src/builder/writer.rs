use crate::error::InsufficientBuffer;
use crate::format::{FormatSpec, FormatValue, Locale, try_format};
use crate::node::Node;

/// Append cursor over one attempt's buffer.
///
/// Every push either writes all of its chars or fails with
/// [`InsufficientBuffer`], so callbacks can bail out with `?` and let the
/// builder retry in a larger buffer.
pub struct Writer<'b> {
    buf: &'b mut [char],
    pos: usize,
}

impl<'b> Writer<'b> {
    pub(crate) fn new(buf: &'b mut [char]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Chars written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn push_char(&mut self, c: char) -> Result<(), InsufficientBuffer> {
        match self.buf.get_mut(self.pos) {
            Some(slot) => {
                *slot = c;
                self.pos += 1;
                Ok(())
            }
            None => Err(self.short_by(1)),
        }
    }

    pub fn push_str(&mut self, s: &str) -> Result<(), InsufficientBuffer> {
        let len = s.chars().count();
        if len > self.remaining() {
            return Err(self.short_by(len));
        }
        for (slot, c) in self.buf[self.pos..].iter_mut().zip(s.chars()) {
            *slot = c;
        }
        self.pos += len;
        Ok(())
    }

    /// Copies a whole node tree into the tail.
    pub fn push_node<N: Node + ?Sized>(&mut self, node: &N) -> Result<(), InsufficientBuffer> {
        match node.copy_to(&mut self.buf[self.pos..]) {
            Ok(written) => {
                self.pos += written;
                Ok(())
            }
            Err(e) => Err(self.short_by(e.required)),
        }
    }

    /// Formats a value straight into the tail, without a node around it.
    pub fn push_value<T>(&mut self, value: &T) -> Result<(), InsufficientBuffer>
    where
        T: FormatValue + ?Sized,
    {
        self.push_value_with(value, &FormatSpec::PLAIN, &Locale::INVARIANT)
    }

    pub fn push_value_with<T: FormatValue + ?Sized>(
        &mut self,
        value: &T,
        spec: &FormatSpec,
        locale: &Locale,
    ) -> Result<(), InsufficientBuffer> {
        match try_format(value, &mut self.buf[self.pos..], spec, locale) {
            Some(written) => {
                self.pos += written;
                Ok(())
            }
            None => Err(InsufficientBuffer::lower_bound(self.capacity())),
        }
    }

    pub(crate) fn written(&self) -> &[char] {
        &self.buf[..self.pos]
    }

    pub(crate) fn finish(&self) -> String {
        self.written().iter().collect()
    }

    fn short_by(&self, needed: usize) -> InsufficientBuffer {
        InsufficientBuffer {
            required: self.pos + needed,
            available: self.capacity(),
        }
    }
}
