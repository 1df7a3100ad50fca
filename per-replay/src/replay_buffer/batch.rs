//! Batches of transitions drawn from a replay buffer.

/// A batch of transitions with the data needed for importance sampling.
///
/// States are laid out row-major: the `i`-th state of the batch occupies
/// `states[i * dimension..(i + 1) * dimension]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch {
    /// Length of each encoded state.
    pub dimension: usize,

    /// Encoded states, row-major.
    pub states: Vec<f64>,

    /// Actions.
    pub actions: Vec<i64>,

    /// Rewards.
    pub rewards: Vec<f64>,

    /// Encoded next states, row-major.
    pub next_states: Vec<f64>,

    /// Episode termination flags.
    pub is_terminal: Vec<bool>,

    /// Indices of the sampled slots, to be passed back with new priorities.
    pub ix_sample: Vec<usize>,

    /// Importance sampling weights, normalized so that the largest is 1.
    pub weight: Vec<f64>,
}

impl TransitionBatch {
    /// Number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns `true` if the batch holds no transition.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// The `i`-th state.
    pub fn state(&self, i: usize) -> &[f64] {
        &self.states[i * self.dimension..(i + 1) * self.dimension]
    }

    /// The `i`-th next state.
    pub fn next_state(&self, i: usize) -> &[f64] {
        &self.next_states[i * self.dimension..(i + 1) * self.dimension]
    }

    /// Decomposes the batch into
    /// `(states, actions, rewards, next_states, is_terminal, ix_sample, weight)`.
    #[allow(clippy::type_complexity)]
    pub fn unpack(
        self,
    ) -> (
        Vec<f64>,
        Vec<i64>,
        Vec<f64>,
        Vec<f64>,
        Vec<bool>,
        Vec<usize>,
        Vec<f64>,
    ) {
        (
            self.states,
            self.actions,
            self.rewards,
            self.next_states,
            self.is_terminal,
            self.ix_sample,
            self.weight,
        )
    }
}
