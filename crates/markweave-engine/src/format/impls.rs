use std::fmt::{self, Write};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use markweave_config::Family;
use uuid::Uuid;

use crate::format::{FormatSpec, FormatValue, Locale, Localized};

macro_rules! integer_format_value {
    ($($ty:ty),* $(,)?) => {$(
        impl FormatValue for $ty {
            const FAMILY: Family = Family::Integer;

            fn write_raw<W: fmt::Write>(
                &self,
                out: &mut W,
                spec: &FormatSpec,
                _locale: &Locale,
            ) -> fmt::Result {
                match spec.pattern_str() {
                    Some("x") => write!(out, "{self:x}"),
                    Some("X") => write!(out, "{self:X}"),
                    Some("o") => write!(out, "{self:o}"),
                    Some("b") => write!(out, "{self:b}"),
                    _ => write!(out, "{self}"),
                }
            }
        }
    )*};
}

integer_format_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_format_value {
    ($($ty:ty),* $(,)?) => {$(
        impl FormatValue for $ty {
            const FAMILY: Family = Family::Float;

            fn write_raw<W: fmt::Write>(
                &self,
                out: &mut W,
                spec: &FormatSpec,
                locale: &Locale,
            ) -> fmt::Result {
                let mut out = Localized::new(out, locale);
                let exponent = spec.pattern_str() == Some("e");
                match (spec.precision, exponent) {
                    (Some(p), true) => write!(out, "{self:.p$e}"),
                    (Some(p), false) => write!(out, "{self:.p$}"),
                    (None, true) => write!(out, "{self:e}"),
                    (None, false) => write!(out, "{self}"),
                }
            }
        }
    )*};
}

float_format_value!(f32, f64);

impl FormatValue for bool {
    const FAMILY: Family = Family::Enumeration;

    fn write_raw<W: fmt::Write>(&self, out: &mut W, _: &FormatSpec, _: &Locale) -> fmt::Result {
        out.write_str(if *self { "true" } else { "false" })
    }
}

impl FormatValue for char {
    const FAMILY: Family = Family::Enumeration;

    fn write_raw<W: fmt::Write>(&self, out: &mut W, _: &FormatSpec, _: &Locale) -> fmt::Result {
        out.write_char(*self)
    }
}

/// Patterns: `simple`, `braced`, `urn`, `upper`; hyphenated otherwise.
impl FormatValue for Uuid {
    const FAMILY: Family = Family::Identifier;

    fn write_raw<W: fmt::Write>(&self, out: &mut W, spec: &FormatSpec, _: &Locale) -> fmt::Result {
        match spec.pattern_str() {
            Some("simple") => write!(out, "{}", self.simple()),
            Some("braced") => write!(out, "{}", self.braced()),
            Some("urn") => write!(out, "{}", self.urn()),
            Some("upper") => write!(out, "{:X}", self.hyphenated()),
            _ => write!(out, "{}", self.hyphenated()),
        }
    }
}

macro_rules! temporal_format_value {
    ($ty:ty, $default:literal) => {
        impl FormatValue for $ty {
            const FAMILY: Family = Family::Temporal;

            fn write_raw<W: fmt::Write>(
                &self,
                out: &mut W,
                spec: &FormatSpec,
                _locale: &Locale,
            ) -> fmt::Result {
                let pattern = spec.pattern_str().unwrap_or($default);
                write!(out, "{}", self.format(pattern))
            }
        }
    };
}

temporal_format_value!(NaiveDate, "%Y-%m-%d");
temporal_format_value!(NaiveTime, "%H:%M:%S%.f");
temporal_format_value!(NaiveDateTime, "%Y-%m-%dT%H:%M:%S%.f");
temporal_format_value!(DateTime<Utc>, "%+");

/// Adapter for any `Display` type, such as enum names.
///
/// A `precision` on the spec truncates the text to that many chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Displayed<T>(pub T);

impl<T: fmt::Display> FormatValue for Displayed<T> {
    const FAMILY: Family = Family::Enumeration;

    fn write_raw<W: fmt::Write>(&self, out: &mut W, spec: &FormatSpec, _: &Locale) -> fmt::Result {
        match spec.precision {
            Some(limit) => write!(Truncate { inner: out, remaining: limit }, "{}", self.0),
            None => write!(out, "{}", self.0),
        }
    }
}

struct Truncate<'w, W> {
    inner: &'w mut W,
    remaining: usize,
}

impl<W: fmt::Write> fmt::Write for Truncate<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.remaining == 0 {
                break;
            }
            self.inner.write_char(c)?;
            self.remaining -= 1;
        }
        Ok(())
    }
}
