//! Errors in the library.
use thiserror::Error;

/// Errors raised by the replay buffer and its components.
///
/// All of them are contract violations on the caller side and are reported
/// synchronously. Nothing is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplayBufferError {
    /// Bad construction parameters or mismatched argument lengths.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An encoded state does not have the configured dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Configured dimension.
        expected: usize,
        /// Length of the given vector.
        actual: usize,
    },

    /// Sampling was attempted before any transition was stored.
    #[error("Replay buffer is empty")]
    EmptyBuffer,

    /// An index does not point to a live slot.
    #[error("Index {index} out of range for {len} live transitions")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Current number of live slots.
        len: usize,
    },
}
