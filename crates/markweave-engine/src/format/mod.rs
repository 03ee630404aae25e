//! # Value formatting
//!
//! Values whose text length is unknown until they are formatted (numbers,
//! dates, identifiers, enum names) implement [`FormatValue`]. Formatting
//! happens straight into `char` buffers through a bounded sink: running out
//! of room is reported as `None` rather than an allocation.
//!
//! ## Modules
//!
//! - **`impls`**: [`FormatValue`] for primitives, `Uuid`, chrono types and
//!   the [`Displayed`] adapter
//! - **`retry`**: [`format_with_retry`], the grow-and-retry trial formatter
//! - **`value`**: [`ValueNode`], the generic leaf node over any value

pub mod impls;
pub mod retry;
pub mod value;

use std::fmt;
use std::sync::Arc;

use markweave_config::Family;

pub use impls::Displayed;
pub use retry::format_with_retry;
pub use value::ValueNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    Left,
    #[default]
    Right,
    Center,
}

/// Fixed formatting inputs of a value.
///
/// `width` pads with spaces according to `align`; `precision` applies to
/// floats and truncates [`Displayed`] text; `pattern` is interpreted by the
/// value type (radix for integers, a chrono format string for dates).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSpec {
    pub width: usize,
    pub align: Align,
    pub precision: Option<usize>,
    pub pattern: Option<Arc<str>>,
}

impl FormatSpec {
    pub const PLAIN: FormatSpec = FormatSpec {
        width: 0,
        align: Align::Right,
        precision: None,
        pattern: None,
    };

    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<Arc<str>>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn pattern_str(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}

/// Culture-specific formatting inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    pub decimal_separator: char,
}

impl Locale {
    pub const INVARIANT: Locale = Locale {
        decimal_separator: '.',
    };

    pub const fn with_decimal_separator(decimal_separator: char) -> Self {
        Self { decimal_separator }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::INVARIANT
    }
}

/// A value that can write its own text.
///
/// Implementations write the raw text only; width and alignment are applied
/// afterwards. Output must depend on nothing but `self`, `spec` and `locale`,
/// because callers format the same value more than once and rely on getting
/// the same chars every time.
pub trait FormatValue {
    /// Settings family whose trial-buffer sizes fit this type.
    const FAMILY: Family;

    fn write_raw<W: fmt::Write>(
        &self,
        out: &mut W,
        spec: &FormatSpec,
        locale: &Locale,
    ) -> fmt::Result;
}

impl<T: FormatValue + ?Sized> FormatValue for &T {
    const FAMILY: Family = T::FAMILY;

    fn write_raw<W: fmt::Write>(
        &self,
        out: &mut W,
        spec: &FormatSpec,
        locale: &Locale,
    ) -> fmt::Result {
        (**self).write_raw(out, spec, locale)
    }
}

/// `fmt::Write` over a fixed `char` slice that refuses to overflow.
pub(crate) struct CharSink<'a> {
    buf: &'a mut [char],
    len: usize,
    overflowed: bool,
}

impl<'a> CharSink<'a> {
    pub(crate) fn new(buf: &'a mut [char]) -> Self {
        Self {
            buf,
            len: 0,
            overflowed: false,
        }
    }
}

impl fmt::Write for CharSink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            self.write_char(c)?;
        }
        Ok(())
    }

    fn write_char(&mut self, c: char) -> fmt::Result {
        match self.buf.get_mut(self.len) {
            Some(slot) => {
                *slot = c;
                self.len += 1;
                Ok(())
            }
            None => {
                self.overflowed = true;
                Err(fmt::Error)
            }
        }
    }
}

/// Rewrites `.` to the locale's decimal separator on the way through.
pub(crate) struct Localized<'w, W> {
    inner: &'w mut W,
    decimal_separator: char,
}

impl<'w, W: fmt::Write> Localized<'w, W> {
    pub(crate) fn new(inner: &'w mut W, locale: &Locale) -> Self {
        Self {
            inner,
            decimal_separator: locale.decimal_separator,
        }
    }
}

impl<W: fmt::Write> fmt::Write for Localized<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.decimal_separator == '.' {
            return self.inner.write_str(s);
        }
        for c in s.chars() {
            self.inner
                .write_char(if c == '.' { self.decimal_separator } else { c })?;
        }
        Ok(())
    }
}

/// Formats `value` into the start of `dest`, padding to `spec.width`.
///
/// Returns the number of chars written, or `None` when `dest` is too small.
/// A failed attempt may leave scratch chars in `dest`.
pub fn try_format<T>(
    value: &T,
    dest: &mut [char],
    spec: &FormatSpec,
    locale: &Locale,
) -> Option<usize>
where
    T: FormatValue + ?Sized,
{
    let mut sink = CharSink::new(dest);
    if value.write_raw(&mut sink, spec, locale).is_err() {
        if !sink.overflowed {
            log::debug!("Formatter failed without running out of space");
        }
        return None;
    }
    let written = sink.len;
    pad_in_place(dest, written, spec)
}

/// Formats `value` with no size limit into a fresh vector.
///
/// This is the heap fallback for values larger than their family maximum.
pub fn format_to_chars<T>(value: &T, spec: &FormatSpec, locale: &Locale) -> Vec<char>
where
    T: FormatValue + ?Sized,
{
    let mut raw = String::new();
    if value.write_raw(&mut raw, spec, locale).is_err() {
        log::warn!("Formatter failed, keeping partial output");
    }
    let mut chars: Vec<char> = raw.chars().collect();
    let written = chars.len();
    if spec.width > written {
        chars.resize(spec.width, ' ');
    }
    let len = pad_in_place(&mut chars, written, spec).unwrap_or(written);
    chars.truncate(len);
    chars
}

/// Pads the first `written` chars of `buf` out to `spec.width`.
fn pad_in_place(buf: &mut [char], written: usize, spec: &FormatSpec) -> Option<usize> {
    if written >= spec.width {
        return Some(written);
    }
    if buf.len() < spec.width {
        return None;
    }

    let pad = spec.width - written;
    let before = match spec.align {
        Align::Left => 0,
        Align::Right => pad,
        Align::Center => pad / 2,
    };
    buf.copy_within(0..written, before);
    buf[..before].fill(' ');
    buf[before + written..spec.width].fill(' ');
    Some(spec.width)
}
