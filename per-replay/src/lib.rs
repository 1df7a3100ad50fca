#![warn(missing_docs)]
//! Prioritized experience replay for reinforcement learning.
//!
//! The crate provides [`PrioritizedReplayBuffer`](replay_buffer::PrioritizedReplayBuffer),
//! a fixed-capacity buffer of transitions from which mini-batches are drawn with
//! probability proportional to a per-transition priority. Sampling is backed by a
//! [`SumTree`](replay_buffer::SumTree) and each batch carries importance sampling
//! weights that compensate for the non-uniform sampling.
//!
//! ```rust
//! use per_replay::replay_buffer::{PerConfig, PrioritizedReplayBuffer, ReplayBufferConfig};
//!
//! # fn main() -> Result<(), per_replay::ReplayBufferError> {
//! let config = ReplayBufferConfig::default()
//!     .capacity(4)
//!     .batch_size(2)
//!     .dimension(2)
//!     .per_config(PerConfig::default().alpha(1.0));
//! let mut buffer = PrioritizedReplayBuffer::build(&config)?;
//!
//! buffer.store(&[0.0, 1.0], 0, 1.0, &[1.0, 1.0], false)?;
//! buffer.store(&[1.0, 1.0], 1, 0.0, &[2.0, 1.0], true)?;
//!
//! let batch = buffer.sample(2, 0.4)?;
//! buffer.update_priorities(&batch.ix_sample, &[0.5, 2.0])?;
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod replay_buffer;

mod base;
pub use base::{Encode, ExperienceBufferBase, ReplayBufferBase};
pub use error::ReplayBufferError;
