//! Core interfaces.
mod encode;
mod replay_buffer;
pub use encode::Encode;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
