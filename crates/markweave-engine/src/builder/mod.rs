//! # String builders
//!
//! A builder runs an append callback against a buffer from the
//! [`AllocationPolicy`] and turns the written chars into a `String`. Three
//! strategies differ only in how the first capacity is chosen:
//!
//! - [`StringBuilder::precomputed`]: the caller knows the exact length; one
//!   buffer, one pass, and a length mismatch is an error
//! - [`StringBuilder::auto_growing`]: start at `initial_buffer_length`
//! - [`StringBuilder::hybrid`]: start at a caller hint
//!
//! The growing strategies rerun the whole callback in a larger buffer every
//! time it runs out of space, up to `max_buffer_length`. Callbacks must
//! therefore produce the same output on every run.

pub mod writer;

use markweave_config::{Family, FamilySettings, SettingsRegistry};

use crate::buffer::{AllocationPolicy, BufferPool};
use crate::error::{ComposeError, InsufficientBuffer, Result};
use crate::node::Node;

pub use writer::Writer;

/// Materialises text through one family's buffer settings.
#[derive(Debug, Clone, Copy)]
pub struct StringBuilder<'p> {
    settings: FamilySettings,
    policy: AllocationPolicy<'p>,
}

impl StringBuilder<'static> {
    pub fn new(settings: FamilySettings) -> Self {
        Self {
            settings,
            policy: AllocationPolicy::new(&settings),
        }
    }

    /// Builder using the registry's `builder` family.
    pub fn from_registry(registry: &SettingsRegistry) -> Self {
        Self::new(*registry.get(Family::Builder))
    }
}

impl Default for StringBuilder<'static> {
    fn default() -> Self {
        Self::new(FamilySettings::defaults_for(Family::Builder))
    }
}

impl<'p> StringBuilder<'p> {
    pub fn with_pool(settings: FamilySettings, pool: &'p dyn BufferPool) -> Self {
        Self {
            settings,
            policy: AllocationPolicy::with_pool(&settings, pool),
        }
    }

    pub fn settings(&self) -> &FamilySettings {
        &self.settings
    }

    /// Single pass into a buffer of exactly `length` chars.
    ///
    /// The callback must write exactly `length` chars: running out of room
    /// is [`ComposeError::LengthOverrun`] and stopping short is
    /// [`ComposeError::LengthUnderrun`].
    pub fn precomputed<F>(&self, length: usize, mut write: F) -> Result<String>
    where
        F: FnMut(&mut Writer<'_>) -> std::result::Result<(), InsufficientBuffer>,
    {
        let max = self.settings.max_buffer_length;
        if length > max {
            return Err(ComposeError::CapacityExceeded {
                requested: length,
                max,
            });
        }

        log::trace!("Precomputed build of {length} chars");
        self.policy.with_buffer(length, |buf| {
            let mut writer = Writer::new(buf);
            match write(&mut writer) {
                Ok(()) if writer.position() == length => Ok(writer.finish()),
                Ok(()) => Err(ComposeError::LengthUnderrun {
                    declared: length,
                    written: writer.position(),
                }),
                Err(_) => Err(ComposeError::LengthOverrun { declared: length }),
            }
        })
    }

    /// Starts at `initial_buffer_length` and grows until the callback fits.
    pub fn auto_growing<F>(&self, write: F) -> Result<String>
    where
        F: FnMut(&mut Writer<'_>) -> std::result::Result<(), InsufficientBuffer>,
    {
        self.grow_from(self.settings.initial_buffer_length, write)
    }

    /// Starts at `hint`, clamped to `1..=max_buffer_length`, then grows like
    /// [`auto_growing`](Self::auto_growing).
    pub fn hybrid<F>(&self, hint: usize, write: F) -> Result<String>
    where
        F: FnMut(&mut Writer<'_>) -> std::result::Result<(), InsufficientBuffer>,
    {
        self.grow_from(hint.clamp(1, self.settings.max_buffer_length), write)
    }

    /// Materialises a node tree in one exactly sized pass.
    pub fn render<N: Node + ?Sized>(&self, node: &N) -> Result<String> {
        self.precomputed(node.total_length(), |writer| writer.push_node(node))
    }

    fn grow_from<F>(&self, start: usize, mut write: F) -> Result<String>
    where
        F: FnMut(&mut Writer<'_>) -> std::result::Result<(), InsufficientBuffer>,
    {
        let max = self.settings.max_buffer_length;
        let mut capacity = start.min(max);
        let mut attempt = 1;
        loop {
            log::trace!("Build attempt {attempt} with {capacity} chars");
            let outcome = self.policy.with_buffer(capacity, |buf| {
                let mut writer = Writer::new(buf);
                write(&mut writer).map(|()| writer.finish())
            });

            let short = match outcome {
                Ok(text) => return Ok(text),
                Err(short) => short,
            };
            match self.settings.next_capacity(capacity) {
                Some(next) => {
                    log::debug!(
                        "Build needed at least {} chars, growing {capacity} -> {next}",
                        short.required
                    );
                    capacity = next;
                    attempt += 1;
                }
                None => {
                    return Err(ComposeError::CapacityExceeded {
                        requested: short.required.max(max + 1),
                        max,
                    });
                }
            }
        }
    }
}
