//! Prioritized replay buffer.
use super::{IwScheduler, ReplayBufferConfig, SumTree, Transition, TransitionBatch, TransitionStore};
use crate::{Encode, ExperienceBufferBase, ReplayBufferBase, ReplayBufferError};
use log::{debug, info, trace, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A replay buffer sampling transitions in proportion to their priorities.
///
/// Transitions are written in a circular fashion: once `capacity` transitions
/// have been stored, each new one overwrites the oldest. A newly stored
/// transition gets the largest priority seen so far, so that it is likely to
/// be sampled at least once before its priority is corrected by
/// [`update_priorities`](Self::update_priorities).
///
/// The sampling probability of slot $i$ is $P(i) = p_i^\alpha / \sum_k p_k^\alpha$
/// and each sampled transition comes with the importance sampling weight
/// $w_i = (N P(i))^{-\beta}$, normalized by the largest weight in the batch.
///
/// The buffer is not synchronized. Share it between threads behind a mutex.
pub struct PrioritizedReplayBuffer {
    capacity: usize,
    batch_size: usize,
    alpha: f64,

    /// Next slot to overwrite.
    i: usize,

    /// Set once the write cursor has wrapped around.
    full: bool,

    /// Largest raw priority stored so far.
    max_priority: f64,

    sum_tree: SumTree,
    transitions: TransitionStore,
    rng: StdRng,
    iw_scheduler: IwScheduler,
}

impl PrioritizedReplayBuffer {
    /// Creates an empty buffer.
    pub fn build(config: &ReplayBufferConfig) -> Result<Self, ReplayBufferError> {
        config.check()?;
        let per_config = &config.per_config;

        if config.capacity < config.batch_size {
            warn!(
                "Capacity of the replay buffer ({}) is smaller than the batch size ({})",
                config.capacity, config.batch_size
            );
        }

        let sum_tree = SumTree::with_capacity(config.capacity)?;
        info!(
            "Built a prioritized replay buffer: capacity = {}, leaves = {}, dimension = {}, alpha = {}",
            config.capacity,
            sum_tree.leaf_count(),
            config.dimension,
            per_config.alpha
        );

        Ok(Self {
            capacity: config.capacity,
            batch_size: config.batch_size,
            alpha: per_config.alpha,
            i: 0,
            full: false,
            max_priority: 1.0,
            sum_tree,
            transitions: TransitionStore::new(config.capacity, config.dimension)?,
            rng: StdRng::seed_from_u64(config.seed),
            iw_scheduler: IwScheduler::from_config(per_config),
        })
    }

    /// Number of live transitions.
    pub fn len(&self) -> usize {
        if self.full {
            self.capacity
        } else {
            self.i
        }
    }

    /// Returns `true` if nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once the buffer has wrapped around.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Prioritization exponent.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Length of encoded states.
    pub fn dimension(&self) -> usize {
        self.transitions.dimension()
    }

    /// Largest raw priority stored so far. Starts at `1`.
    pub fn max_priority(&self) -> f64 {
        self.max_priority
    }

    /// Sum of `priority^alpha` over live transitions.
    pub fn total_priority(&self) -> f64 {
        self.sum_tree.total()
    }

    /// `priority^alpha` of the `ix`-th slot, zero for slots never written.
    ///
    /// Fails if `ix` is not below the capacity.
    pub fn leaf_value(&self, ix: usize) -> Result<f64, ReplayBufferError> {
        if ix >= self.capacity {
            return Err(ReplayBufferError::IndexOutOfRange {
                index: ix,
                len: self.capacity,
            });
        }
        self.sum_tree.get(ix)
    }

    /// Current exponent of the importance sampling weight used by
    /// [`ReplayBufferBase::batch`].
    pub fn beta(&self) -> f64 {
        self.iw_scheduler.beta()
    }

    /// Returns a copy of the transition at the `ix`-th slot.
    pub fn transition(&self, ix: usize) -> Result<Transition, ReplayBufferError> {
        self.check_live(ix)?;
        Ok(self.transitions.transition(ix))
    }

    fn check_live(&self, ix: usize) -> Result<(), ReplayBufferError> {
        let len = self.len();
        if ix >= len {
            return Err(ReplayBufferError::IndexOutOfRange { index: ix, len });
        }
        Ok(())
    }

    /// Stores a transition with the largest priority seen so far.
    ///
    /// Fails with [`ReplayBufferError::DimensionMismatch`] if a state does not
    /// have the configured dimension, and with
    /// [`ReplayBufferError::InvalidArgument`] if the new priority would push the
    /// total priority mass past `f64::MAX`. In both cases the buffer is
    /// unchanged.
    pub fn store(
        &mut self,
        state: &[f64],
        action: i64,
        reward: f64,
        next_state: &[f64],
        is_terminal: bool,
    ) -> Result<(), ReplayBufferError> {
        self.transitions.check_dimension(state)?;
        self.transitions.check_dimension(next_state)?;

        let prev = self.sum_tree.get(self.i)?;
        self.sum_tree
            .set(self.i, self.max_priority.powf(self.alpha))?;
        if !self.sum_tree.total().is_finite() {
            self.sum_tree.set(self.i, prev)?;
            return Err(ReplayBufferError::InvalidArgument(format!(
                "priority {} of a new transition overflows the total priority",
                self.max_priority
            )));
        }
        self.transitions
            .put_parts(self.i, state, action, reward, next_state, is_terminal)?;

        self.i += 1;
        if self.i == self.capacity {
            if !self.full {
                debug!("Replay buffer is full, oldest transitions will be overwritten");
            }
            self.full = true;
            self.i = 0;
        }

        Ok(())
    }

    /// Encodes the states and stores the transition.
    pub fn store_encoded<S: Encode>(
        &mut self,
        state: &S,
        action: i64,
        reward: f64,
        next_state: &S,
        is_terminal: bool,
    ) -> Result<(), ReplayBufferError> {
        self.store(
            &state.encode(),
            action,
            reward,
            &next_state.encode(),
            is_terminal,
        )
    }

    /// Draws `batch_size` slot indices in proportion to their priorities.
    ///
    /// The priority mass is split into `batch_size` segments of equal width and
    /// one index is drawn uniformly within each segment. An index can appear
    /// more than once when its mass spans several segments.
    pub fn sample_proportional(
        &mut self,
        batch_size: usize,
    ) -> Result<Vec<usize>, ReplayBufferError> {
        if self.is_empty() {
            return Err(ReplayBufferError::EmptyBuffer);
        }
        if batch_size == 0 {
            return Err(ReplayBufferError::InvalidArgument(
                "batch_size must be positive".to_string(),
            ));
        }

        // Leaves outside the live range are zero, so the total is the sum
        // over live slots.
        let width = self.sum_tree.total() / batch_size as f64;
        let ixs = (0..batch_size)
            .map(|b| {
                let mass = self.rng.gen::<f64>() * width + b as f64 * width;
                self.sum_tree.find_prefix_sum(mass)
            })
            .collect::<Vec<_>>();

        debug_assert!(ixs.iter().all(|&ix| ix < self.len()));
        Ok(ixs)
    }

    /// Samples a batch with importance sampling weights.
    ///
    /// `beta` in `[0, 1]` sets the strength of the correction: `0` gives unit
    /// weights, `1` fully compensates for prioritized sampling.
    pub fn sample(
        &mut self,
        batch_size: usize,
        beta: f64,
    ) -> Result<TransitionBatch, ReplayBufferError> {
        if !(0.0..=1.0).contains(&beta) {
            return Err(ReplayBufferError::InvalidArgument(format!(
                "beta must lie in [0, 1], got {}",
                beta
            )));
        }

        let ixs = self.sample_proportional(batch_size)?;
        let weight = self.importance_weights(&ixs, beta)?;
        let mut batch = self.transitions.get(&ixs);
        batch.ix_sample = ixs;
        batch.weight = weight;

        Ok(batch)
    }

    /// Samples a batch of the configured size.
    pub fn sample_batch(&mut self, beta: f64) -> Result<TransitionBatch, ReplayBufferError> {
        self.sample(self.batch_size, beta)
    }

    fn importance_weights(
        &self,
        ixs: &[usize],
        beta: f64,
    ) -> Result<Vec<f64>, ReplayBufferError> {
        let n = self.len() as f64;
        let total = self.sum_tree.total();
        let leaves = ixs
            .iter()
            .map(|&ix| self.sum_tree.get(ix))
            .collect::<Result<Vec<_>, _>>()?;
        let ws = leaves
            .iter()
            .map(|&leaf| (n * (leaf / total)).powf(-beta))
            .collect::<Vec<_>>();

        // normalizer within batch
        let w_max = ws.iter().cloned().fold(0.0, f64::max);
        let ws = if w_max.is_finite() {
            ws.iter().map(|w| w / w_max).collect::<Vec<_>>()
        } else {
            // P(i) underflowed for the rarest sample. The normalized weight
            // only depends on the ratio to the smallest sampled leaf.
            let leaf_min = leaves.iter().cloned().fold(f64::INFINITY, f64::min);
            leaves
                .iter()
                .map(|&leaf| (leaf_min / leaf).powf(beta))
                .collect::<Vec<_>>()
        };

        Ok(ws.into_iter().map(|w| w.max(f64::MIN_POSITIVE)).collect())
    }

    /// Sets new priorities of the given slots.
    ///
    /// Priorities must be positive and finite, every index must point to a live
    /// slot, and the total priority mass must stay finite. A call failing any
    /// of these checks leaves every priority unchanged.
    pub fn update_priorities(
        &mut self,
        ixs: &[usize],
        priorities: &[f64],
    ) -> Result<(), ReplayBufferError> {
        if ixs.len() != priorities.len() {
            return Err(ReplayBufferError::InvalidArgument(format!(
                "got {} indices and {} priorities",
                ixs.len(),
                priorities.len()
            )));
        }
        for (&ix, &p) in ixs.iter().zip(priorities.iter()) {
            self.check_live(ix)?;
            if !(p > 0.0) || !p.is_finite() {
                return Err(ReplayBufferError::InvalidArgument(format!(
                    "priority must be positive and finite, got {} at index {}",
                    p, ix
                )));
            }
        }

        let prev = ixs
            .iter()
            .map(|&ix| self.sum_tree.get(ix))
            .collect::<Result<Vec<_>, _>>()?;
        for (&ix, &p) in ixs.iter().zip(priorities.iter()) {
            self.sum_tree.set(ix, p.powf(self.alpha))?;
        }
        if !self.sum_tree.total().is_finite() {
            for (&ix, &v) in ixs.iter().zip(prev.iter()) {
                self.sum_tree.set(ix, v)?;
            }
            return Err(ReplayBufferError::InvalidArgument(format!(
                "priorities {:?} overflow the total priority",
                priorities
            )));
        }

        self.max_priority = priorities.iter().cloned().fold(self.max_priority, f64::max);
        trace!(
            "Updated {} priorities, max priority = {}",
            ixs.len(),
            self.max_priority
        );

        Ok(())
    }
}

impl ExperienceBufferBase for PrioritizedReplayBuffer {
    type Item = Transition;

    fn push(&mut self, tr: Self::Item) -> anyhow::Result<()> {
        self.store(
            &tr.state,
            tr.action,
            tr.reward,
            &tr.next_state,
            tr.is_terminal,
        )?;
        Ok(())
    }

    fn len(&self) -> usize {
        PrioritizedReplayBuffer::len(self)
    }
}

impl ReplayBufferBase for PrioritizedReplayBuffer {
    type Config = ReplayBufferConfig;
    type Batch = TransitionBatch;

    fn build(config: &Self::Config) -> anyhow::Result<Self> {
        Ok(PrioritizedReplayBuffer::build(config)?)
    }

    /// Samples with the exponent given by the scheduler.
    fn batch(&mut self, size: usize) -> anyhow::Result<Self::Batch> {
        let beta = self.iw_scheduler.beta();
        Ok(self.sample(size, beta)?)
    }

    /// Updates priorities and advances the schedule of `beta` by one step.
    fn update_priority(&mut self, ixs: &[usize], priorities: &[f64]) -> anyhow::Result<()> {
        self.update_priorities(ixs, priorities)?;
        self.iw_scheduler.step();
        Ok(())
    }
}
