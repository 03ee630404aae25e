use markweave_config::FamilySettings;

use crate::buffer::AllocationPolicy;
use crate::error::{ComposeError, InsufficientBuffer};
use crate::format::{
    FormatSpec, FormatValue, Locale, format_to_chars, format_with_retry, try_format,
};
use crate::node::{LengthCache, Node, ensure_capacity};

/// Leaf node over a formattable value.
///
/// The text length is discovered by trial-formatting into a scratch buffer
/// and memoised. Values longer than their family's `max_buffer_length` are
/// formatted once more on the heap, with a warning, so the node always has
/// a length.
#[derive(Debug, Clone)]
pub struct ValueNode<T> {
    value: T,
    spec: FormatSpec,
    locale: Locale,
    settings: FamilySettings,
    length: LengthCache,
}

impl<T: FormatValue> ValueNode<T> {
    pub fn new(value: T) -> Self {
        Self::with_format(value, FormatSpec::default(), Locale::default())
    }

    pub fn with_format(value: T, spec: FormatSpec, locale: Locale) -> Self {
        Self {
            value,
            spec,
            locale,
            settings: FamilySettings::defaults_for(T::FAMILY),
            length: LengthCache::new(),
        }
    }

    /// Replaces the family defaults, typically with a registry's record.
    pub fn with_settings(mut self, settings: FamilySettings) -> Self {
        self.settings = settings;
        self.length = LengthCache::new();
        self
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    pub fn settings(&self) -> &FamilySettings {
        &self.settings
    }

    fn trial<R, F>(&self, on_success: F) -> Result<R, ComposeError>
    where
        F: FnMut(&[char]) -> R,
    {
        let policy = AllocationPolicy::new(&self.settings);
        format_with_retry(
            &self.value,
            &self.spec,
            &self.locale,
            &self.settings,
            &policy,
            on_success,
        )
    }

    fn heap_chars(&self, cause: ComposeError) -> Vec<char> {
        log::warn!(
            "{} value exceeded its trial buffers, formatting on the heap: {cause}",
            T::FAMILY
        );
        let chars = format_to_chars(&self.value, &self.spec, &self.locale);
        self.length.set(chars.len());
        chars
    }
}

impl<T: FormatValue> Node for ValueNode<T> {
    fn syntax_length(&self) -> usize {
        0
    }

    fn total_length(&self) -> usize {
        if let Some(len) = self.length.get() {
            return len;
        }
        match self.trial(|chars| chars.len()) {
            Ok(len) => {
                self.length.set(len);
                len
            }
            Err(cause) => self.heap_chars(cause).len(),
        }
    }

    fn copy_to(&self, dest: &mut [char]) -> Result<usize, InsufficientBuffer> {
        if let Some(len) = self.length.get() {
            ensure_capacity(dest, len)?;
            match try_format(&self.value, &mut dest[..len], &self.spec, &self.locale) {
                Some(written) => return Ok(written),
                None => log::warn!(
                    "{} value no longer fits its memoised length of {len}",
                    T::FAMILY
                ),
            }
        }

        let copied = self.trial(|chars| -> Result<usize, InsufficientBuffer> {
            self.length.set(chars.len());
            ensure_capacity(dest, chars.len())?;
            dest[..chars.len()].copy_from_slice(chars);
            Ok(chars.len())
        });
        match copied {
            Ok(result) => result,
            Err(cause) => {
                let chars = self.heap_chars(cause);
                ensure_capacity(dest, chars.len())?;
                dest[..chars.len()].copy_from_slice(&chars);
                Ok(chars.len())
            }
        }
    }

    fn try_get_char(&self, index: usize) -> Option<char> {
        if let Some(len) = self.length.get() {
            if index >= len {
                return None;
            }
            // Already known not to fit any trial buffer.
            if len > self.settings.max_buffer_length {
                return format_to_chars(&self.value, &self.spec, &self.locale)
                    .get(index)
                    .copied();
            }
        }
        let found = self.trial(|chars| {
            self.length.set(chars.len());
            chars.get(index).copied()
        });
        match found {
            Ok(c) => c,
            Err(cause) => self.heap_chars(cause).get(index).copied(),
        }
    }
}
