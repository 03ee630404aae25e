//! # Buffer allocation policy
//!
//! Scratch and output buffers come from one of three tiers, chosen by the
//! requested length and the consumer's [`FamilySettings`]:
//!
//! | tier | lengths | lifetime |
//! |------|---------|----------|
//! | [`BufferTier::Stack`] | `..= max_stack_alloc_length` | array on the call stack, gone at scope exit |
//! | [`BufferTier::Pooled`] | `..= max_pooled_array_length` | rented from a [`BufferPool`], returned on drop |
//! | [`BufferTier::Heap`] | above that | one-off `Vec`, freed at scope exit |
//!
//! Buffers never escape [`AllocationPolicy::with_buffer`]: the callback
//! borrows the slice and whatever it needs to keep has to be copied out.

pub mod pool;

use std::fmt;

use markweave_config::{FamilySettings, STACK_ALLOC_CEILING};

pub use pool::{BufferPool, PooledBuffer, SharedPool};

const SMALL_STACK_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTier {
    Stack,
    Pooled,
    Heap,
}

/// Chooses and provides buffers according to one family's thresholds.
#[derive(Clone, Copy)]
pub struct AllocationPolicy<'p> {
    max_stack_alloc_length: usize,
    max_pooled_array_length: usize,
    pool: &'p dyn BufferPool,
}

impl AllocationPolicy<'static> {
    /// Policy backed by the process-wide [`SharedPool`].
    pub fn new(settings: &FamilySettings) -> Self {
        Self::with_pool(settings, SharedPool::global())
    }
}

impl<'p> AllocationPolicy<'p> {
    pub fn with_pool(settings: &FamilySettings, pool: &'p dyn BufferPool) -> Self {
        Self {
            // Unvalidated records must still never overflow the stack array.
            max_stack_alloc_length: settings.max_stack_alloc_length.min(STACK_ALLOC_CEILING),
            max_pooled_array_length: settings.max_pooled_array_length,
            pool,
        }
    }

    pub fn tier(&self, len: usize) -> BufferTier {
        if len <= self.max_stack_alloc_length {
            BufferTier::Stack
        } else if len <= self.max_pooled_array_length {
            BufferTier::Pooled
        } else {
            BufferTier::Heap
        }
    }

    /// Runs `f` against a buffer of exactly `len` chars, all `'\0'`.
    pub fn with_buffer<R, F>(&self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [char]) -> R,
    {
        match self.tier(len) {
            BufferTier::Stack if len <= SMALL_STACK_LEN => {
                let mut stack = ['\0'; SMALL_STACK_LEN];
                f(&mut stack[..len])
            }
            BufferTier::Stack => {
                let mut stack = ['\0'; STACK_ALLOC_CEILING];
                f(&mut stack[..len])
            }
            BufferTier::Pooled => {
                let mut lease = PooledBuffer::rent(self.pool, len);
                let buffer = &mut lease[..len];
                buffer.fill('\0');
                f(buffer)
            }
            BufferTier::Heap => {
                let mut heap = vec!['\0'; len];
                f(&mut heap)
            }
        }
    }
}

impl fmt::Debug for AllocationPolicy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationPolicy")
            .field("max_stack_alloc_length", &self.max_stack_alloc_length)
            .field("max_pooled_array_length", &self.max_pooled_array_length)
            .finish_non_exhaustive()
    }
}
