//! Circular storage of transitions.
use super::TransitionBatch;
use crate::ReplayBufferError;

/// A single `(s_t, a_t, r_t, s_t+1, is_terminal_t)` record.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Encoded state.
    pub state: Vec<f64>,

    /// Action taken in `state`.
    pub action: i64,

    /// Reward received after the action.
    pub reward: f64,

    /// Encoded state after the action.
    pub next_state: Vec<f64>,

    /// Whether `next_state` ends the episode.
    pub is_terminal: bool,
}

/// Fixed-capacity columnar storage of transitions.
///
/// States are kept row-major in flat vectors of `capacity * dimension` values.
/// The store knows nothing about priorities or about which slots are live;
/// that bookkeeping belongs to the owning buffer.
#[derive(Debug, Clone)]
pub struct TransitionStore {
    capacity: usize,
    dimension: usize,
    states: Vec<f64>,
    actions: Vec<i64>,
    rewards: Vec<f64>,
    next_states: Vec<f64>,
    is_terminal: Vec<bool>,
}

impl TransitionStore {
    /// Allocates a store of `capacity` slots for states of `dimension` values.
    pub fn new(capacity: usize, dimension: usize) -> Result<Self, ReplayBufferError> {
        if capacity == 0 {
            return Err(ReplayBufferError::InvalidArgument(
                "capacity must be positive".to_string(),
            ));
        }
        if dimension == 0 {
            return Err(ReplayBufferError::InvalidArgument(
                "dimension must be positive".to_string(),
            ));
        }

        Ok(Self {
            capacity,
            dimension,
            states: vec![0.0; capacity * dimension],
            actions: vec![0; capacity],
            rewards: vec![0.0; capacity],
            next_states: vec![0.0; capacity * dimension],
            is_terminal: vec![false; capacity],
        })
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Length of each encoded state.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Fails if `v` does not have the configured dimension.
    pub(super) fn check_dimension(&self, v: &[f64]) -> Result<(), ReplayBufferError> {
        if v.len() != self.dimension {
            return Err(ReplayBufferError::DimensionMismatch {
                expected: self.dimension,
                actual: v.len(),
            });
        }
        Ok(())
    }

    #[inline]
    fn row(&self, ix: usize) -> std::ops::Range<usize> {
        ix * self.dimension..(ix + 1) * self.dimension
    }

    /// Overwrites the `ix`-th slot.
    ///
    /// Both states are checked before anything is written.
    pub fn put(&mut self, ix: usize, tr: &Transition) -> Result<(), ReplayBufferError> {
        self.put_parts(
            ix,
            &tr.state,
            tr.action,
            tr.reward,
            &tr.next_state,
            tr.is_terminal,
        )
    }

    pub(super) fn put_parts(
        &mut self,
        ix: usize,
        state: &[f64],
        action: i64,
        reward: f64,
        next_state: &[f64],
        is_terminal: bool,
    ) -> Result<(), ReplayBufferError> {
        debug_assert!(ix < self.capacity);
        self.check_dimension(state)?;
        self.check_dimension(next_state)?;

        let row = self.row(ix);
        self.states[row.clone()].copy_from_slice(state);
        self.next_states[row].copy_from_slice(next_state);
        self.actions[ix] = action;
        self.rewards[ix] = reward;
        self.is_terminal[ix] = is_terminal;

        Ok(())
    }

    /// Returns a copy of the `ix`-th slot.
    pub fn transition(&self, ix: usize) -> Transition {
        let row = self.row(ix);
        Transition {
            state: self.states[row.clone()].to_vec(),
            action: self.actions[ix],
            reward: self.rewards[ix],
            next_state: self.next_states[row].to_vec(),
            is_terminal: self.is_terminal[ix],
        }
    }

    /// Gathers the given slots into a batch, preserving the order of `ixs`.
    ///
    /// Indices are not validated here. The returned batch has no sample
    /// indices or weights attached.
    pub fn get(&self, ixs: &[usize]) -> TransitionBatch {
        let n = ixs.len();
        let mut states = Vec::with_capacity(n * self.dimension);
        let mut next_states = Vec::with_capacity(n * self.dimension);

        for &ix in ixs.iter() {
            states.extend_from_slice(&self.states[self.row(ix)]);
            next_states.extend_from_slice(&self.next_states[self.row(ix)]);
        }

        TransitionBatch {
            dimension: self.dimension,
            states,
            actions: ixs.iter().map(|&ix| self.actions[ix]).collect(),
            rewards: ixs.iter().map(|&ix| self.rewards[ix]).collect(),
            next_states,
            is_terminal: ixs.iter().map(|&ix| self.is_terminal[ix]).collect(),
            ix_sample: Vec::new(),
            weight: Vec::new(),
        }
    }
}
