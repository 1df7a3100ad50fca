//! Prioritized experience replay.
//!
//! # Key Components
//!
//! - [`PrioritizedReplayBuffer`]: the buffer, composing the two structures below
//! - [`SumTree`]: priority index with logarithmic update and inverse-CDF lookup
//! - [`TransitionStore`]: circular columnar storage of transitions
//! - [`ReplayBufferConfig`], [`PerConfig`]: construction parameters
//! - [`IwScheduler`]: annealing of the importance sampling exponent
//!
//! # Examples
//!
//! ```rust
//! use per_replay::replay_buffer::{PerConfig, PrioritizedReplayBuffer, ReplayBufferConfig};
//!
//! let config = ReplayBufferConfig::default()
//!     .capacity(10000)
//!     .batch_size(32)
//!     .dimension(4)
//!     .seed(42)
//!     .per_config(PerConfig::default().alpha(0.6).beta_0(0.4));
//! let buffer = PrioritizedReplayBuffer::build(&config).unwrap();
//! assert!(buffer.is_empty());
//! ```
mod base;
mod batch;
mod config;
mod iw_scheduler;
mod store;
mod sum_tree;
pub use base::PrioritizedReplayBuffer;
pub use batch::TransitionBatch;
pub use config::{PerConfig, ReplayBufferConfig};
pub use iw_scheduler::IwScheduler;
pub use store::{Transition, TransitionStore};
pub use sum_tree::SumTree;
