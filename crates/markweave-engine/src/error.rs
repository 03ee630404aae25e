//! Error types for composing and materialising text.

use thiserror::Error;

/// A destination buffer was too small for the text written into it.
///
/// `required` is exact when the writer knew the full length up front and a
/// lower bound (`available + 1`) when it only learned that space ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Buffer too small: {required} chars required, {available} available")]
pub struct InsufficientBuffer {
    pub required: usize,
    pub available: usize,
}

impl InsufficientBuffer {
    pub(crate) fn lower_bound(available: usize) -> Self {
        Self {
            required: available + 1,
            available,
        }
    }
}

/// Errors that can occur while materialising a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error(transparent)]
    InsufficientBuffer(#[from] InsufficientBuffer),

    #[error("Capacity exceeded: {requested} chars requested, maximum is {max}")]
    CapacityExceeded { requested: usize, max: usize },

    #[error("Callback wrote past the declared length of {declared} chars")]
    LengthOverrun { declared: usize },

    #[error("Callback wrote {written} chars but declared {declared}")]
    LengthUnderrun { declared: usize, written: usize },
}

pub type Result<T> = std::result::Result<T, ComposeError>;
