//! Command-line segments: `kind:value`, or a bare word.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use markweave_engine::{Composer, Fragment};
use markweave_syntax::{
    block_quote, bold, escaped, inline_code, italic, spoiler, strikethrough, underline,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    Raw,
    Bold,
    Italic,
    Underline,
    Strike,
    Spoiler,
    Code,
    Quote,
    Int,
    Float,
    Uuid,
    Date,
}

impl SegmentKind {
    fn from_prefix(prefix: &str) -> Option<Self> {
        let kind = match prefix {
            "text" => Self::Text,
            "raw" => Self::Raw,
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "strike" => Self::Strike,
            "spoiler" => Self::Spoiler,
            "code" => Self::Code,
            "quote" => Self::Quote,
            "int" => Self::Int,
            "float" => Self::Float,
            "uuid" => Self::Uuid,
            "date" => Self::Date,
            _ => return None,
        };
        Some(kind)
    }
}

/// Splits `arg` into its kind and value. Anything without a known prefix is
/// text, so `https://example.com` stays a single escaped word.
pub fn split(arg: &str) -> (SegmentKind, &str) {
    if let Some((prefix, value)) = arg.split_once(':')
        && let Some(kind) = SegmentKind::from_prefix(prefix)
    {
        return (kind, value);
    }
    (SegmentKind::Text, arg)
}

/// Turns one argument into a fragment, with values sized by `composer`.
pub fn parse(arg: &str, composer: &Composer) -> Result<Fragment> {
    let (kind, value) = split(arg);
    let owned = || value.to_owned();
    let fragment = match kind {
        SegmentKind::Text => escaped(owned()),
        SegmentKind::Raw => Fragment::text(owned()),
        SegmentKind::Bold => bold(escaped(owned())),
        SegmentKind::Italic => italic(escaped(owned())),
        SegmentKind::Underline => underline(escaped(owned())),
        SegmentKind::Strike => strikethrough(escaped(owned())),
        SegmentKind::Spoiler => spoiler(escaped(owned())),
        SegmentKind::Code => inline_code(owned()),
        SegmentKind::Quote => {
            block_quote(value.split("\\n").map(|line| escaped(line.to_owned())))
        }
        SegmentKind::Int => {
            let n: i64 = value
                .parse()
                .with_context(|| format!("Invalid integer in segment '{arg}'"))?;
            composer.value(n)
        }
        SegmentKind::Float => {
            let x: f64 = value
                .parse()
                .with_context(|| format!("Invalid number in segment '{arg}'"))?;
            composer.value(x)
        }
        SegmentKind::Uuid => {
            let id = if value == "new" {
                Uuid::new_v4()
            } else {
                Uuid::parse_str(value)
                    .with_context(|| format!("Invalid UUID in segment '{arg}'"))?
            };
            composer.value(id)
        }
        SegmentKind::Date => {
            let date = if value == "today" {
                chrono::Local::now().date_naive()
            } else {
                NaiveDate::parse_from_str(value, "%Y-%m-%d").with_context(|| {
                    format!("Invalid date in segment '{arg}', expected YYYY-MM-DD")
                })?
            };
            composer.value(date)
        }
    };
    Ok(fragment)
}

/// Parses every argument, failing on the first bad one.
pub fn parse_all(args: &[String], composer: &Composer) -> Result<Vec<Fragment>> {
    if args.is_empty() {
        bail!("Nothing to render: give at least one segment");
    }
    args.iter().map(|arg| parse(arg, composer)).collect()
}
