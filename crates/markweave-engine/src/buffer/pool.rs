use std::ops::{Deref, DerefMut};
use std::sync::{LazyLock, Mutex};

use markweave_config::POOLED_ARRAY_CEILING;

/// Source of reusable `char` buffers.
pub trait BufferPool: Send + Sync {
    /// Returns a buffer with `len() >= min_len`. Contents are unspecified.
    fn rent(&self, min_len: usize) -> Vec<char>;

    /// Hands a rented buffer back for reuse.
    fn give_back(&self, buffer: Vec<char>);
}

/// A rented buffer that returns itself to its pool when dropped.
///
/// Dropping happens on every exit path of the borrowing scope, including
/// early returns and unwinding, so a lease can never leak.
pub struct PooledBuffer<'p> {
    pool: &'p dyn BufferPool,
    buffer: Vec<char>,
}

impl<'p> PooledBuffer<'p> {
    pub fn rent(pool: &'p dyn BufferPool, min_len: usize) -> Self {
        let buffer = pool.rent(min_len);
        debug_assert!(buffer.len() >= min_len);
        Self { pool, buffer }
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = [char];

    fn deref(&self) -> &[char] {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [char] {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buffer));
    }
}

const MIN_CLASS_LEN: usize = 16;
const CLASS_COUNT: usize =
    (POOLED_ARRAY_CEILING.trailing_zeros() - MIN_CLASS_LEN.trailing_zeros()) as usize + 1;
const RETAINED_PER_CLASS: usize = 8;

static SHARED: LazyLock<SharedPool> = LazyLock::new(SharedPool::new);

/// Size-classed pool shared by every builder and node in the process.
///
/// Buffers come in power-of-two lengths from 16 up to
/// [`POOLED_ARRAY_CEILING`]; each class keeps at most a handful of idle
/// buffers. Requests above the ceiling are served with one-off allocations
/// that are dropped on return.
pub struct SharedPool {
    classes: [Mutex<Vec<Vec<char>>>; CLASS_COUNT],
}

impl SharedPool {
    pub fn new() -> Self {
        Self {
            classes: std::array::from_fn(|_| Mutex::new(Vec::new())),
        }
    }

    /// The process-wide instance.
    pub fn global() -> &'static SharedPool {
        &SHARED
    }

    /// Number of idle buffers currently held.
    pub fn retained(&self) -> usize {
        self.classes
            .iter()
            .map(|class| class.lock().unwrap_or_else(|e| e.into_inner()).len())
            .sum()
    }

    fn class_of(len: usize) -> Option<(usize, usize)> {
        let class_len = len.max(MIN_CLASS_LEN).checked_next_power_of_two()?;
        if class_len > POOLED_ARRAY_CEILING {
            return None;
        }
        let index = (class_len.trailing_zeros() - MIN_CLASS_LEN.trailing_zeros()) as usize;
        Some((index, class_len))
    }
}

impl Default for SharedPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool for SharedPool {
    fn rent(&self, min_len: usize) -> Vec<char> {
        let Some((index, class_len)) = Self::class_of(min_len) else {
            log::debug!("Pool request for {min_len} chars exceeds the ceiling, allocating");
            return vec!['\0'; min_len];
        };

        let reused = self.classes[index]
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop();
        reused.unwrap_or_else(|| {
            log::trace!("Pool class {class_len} empty, allocating");
            vec!['\0'; class_len]
        })
    }

    fn give_back(&self, buffer: Vec<char>) {
        // Only exact class lengths are kept; anything else came from an
        // oversized request.
        let Some((index, class_len)) = Self::class_of(buffer.len()) else {
            return;
        };
        if class_len != buffer.len() {
            return;
        }

        let mut idle = self.classes[index].lock().unwrap_or_else(|e| e.into_inner());
        if idle.len() < RETAINED_PER_CLASS {
            idle.push(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 16)]
    #[case(1, 16)]
    #[case(16, 16)]
    #[case(17, 32)]
    #[case(1000, 1024)]
    #[case(POOLED_ARRAY_CEILING, POOLED_ARRAY_CEILING)]
    fn rents_next_power_of_two(#[case] requested: usize, #[case] expected: usize) {
        let pool = SharedPool::new();
        assert_eq!(pool.rent(requested).len(), expected);
    }

    #[test]
    fn oversized_requests_are_exact_and_not_retained() {
        let pool = SharedPool::new();
        let buffer = pool.rent(POOLED_ARRAY_CEILING + 1);
        assert_eq!(buffer.len(), POOLED_ARRAY_CEILING + 1);

        pool.give_back(buffer);
        assert_eq!(pool.retained(), 0);
    }

    #[test]
    fn returned_buffers_are_reused() {
        let pool = SharedPool::new();
        let mut buffer = pool.rent(100);
        buffer[0] = 'x';
        pool.give_back(buffer);
        assert_eq!(pool.retained(), 1);

        let again = pool.rent(70);
        assert_eq!(again.len(), 128);
        assert_eq!(again[0], 'x');
        assert_eq!(pool.retained(), 0);
    }

    #[test]
    fn retention_per_class_is_bounded() {
        let pool = SharedPool::new();
        for _ in 0..RETAINED_PER_CLASS + 4 {
            pool.give_back(vec!['\0'; 64]);
        }
        assert_eq!(pool.retained(), RETAINED_PER_CLASS);
    }

    #[test]
    fn foreign_lengths_are_dropped() {
        let pool = SharedPool::new();
        pool.give_back(vec!['\0'; 100]);
        assert_eq!(pool.retained(), 0);
    }

    #[test]
    fn lease_returns_buffer_on_drop() {
        let pool = SharedPool::new();
        {
            let mut lease = PooledBuffer::rent(&pool, 40);
            lease[39] = 'z';
            assert_eq!(lease.len(), 64);
        }
        assert_eq!(pool.retained(), 1);
    }
}
