//! Annealing of the importance sampling exponent.
use super::PerConfig;
use serde::{Deserialize, Serialize};

/// Anneals $\beta$ from `beta_0` to `beta_final`.
///
/// Each successful priority update through
/// [`ReplayBufferBase::update_priority`](crate::ReplayBufferBase::update_priority)
/// counts as one optimization step. $\beta$ moves linearly with the fraction of
/// `n_opts_final` steps done so far and stays at `beta_final` afterwards. With
/// `n_opts_final == 0` the schedule starts at `beta_final`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct IwScheduler {
    beta_0: f64,
    beta_final: f64,
    n_opts_final: usize,
    n_opts: usize,
}

impl IwScheduler {
    /// Takes the schedule from a validated [`PerConfig`].
    pub fn from_config(per_config: &PerConfig) -> Self {
        Self {
            beta_0: per_config.beta_0,
            beta_final: per_config.beta_final,
            n_opts_final: per_config.n_opts_final,
            n_opts: 0,
        }
    }

    /// Fraction of the schedule done, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.n_opts >= self.n_opts_final {
            1.0
        } else {
            self.n_opts as f64 / self.n_opts_final as f64
        }
    }

    /// Current exponent of importance sampling weight.
    pub fn beta(&self) -> f64 {
        let beta = self.beta_0 + (self.beta_final - self.beta_0) * self.progress();
        beta.max(0.0).min(1.0)
    }

    /// Number of optimization steps counted so far.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Counts one optimization step. Steps past the end of the schedule are
    /// not counted.
    pub fn step(&mut self) {
        if self.n_opts < self.n_opts_final {
            self.n_opts += 1;
        }
    }
}

#[cfg(test)]
mod test {
    use super::IwScheduler;
    use crate::replay_buffer::PerConfig;

    fn scheduler(beta_0: f64, beta_final: f64, n_opts_final: usize) -> IwScheduler {
        IwScheduler::from_config(
            &PerConfig::default()
                .beta_0(beta_0)
                .beta_final(beta_final)
                .n_opts_final(n_opts_final),
        )
    }

    #[test]
    fn test_linear_schedule() {
        let mut scheduler = scheduler(0.4, 1.0, 4);
        assert_eq!(scheduler.beta(), 0.4);
        assert_eq!(scheduler.progress(), 0.0);

        scheduler.step();
        scheduler.step();
        assert_eq!(scheduler.progress(), 0.5);
        assert!((scheduler.beta() - 0.7).abs() < 1e-12);

        (0..10).for_each(|_| scheduler.step());
        assert_eq!(scheduler.n_opts(), 4);
        assert_eq!(scheduler.beta(), 1.0);
    }

    #[test]
    fn test_decreasing_schedule() {
        let mut scheduler = scheduler(1.0, 0.5, 2);
        scheduler.step();
        assert!((scheduler.beta() - 0.75).abs() < 1e-12);
        scheduler.step();
        assert_eq!(scheduler.beta(), 0.5);
    }

    #[test]
    fn test_zero_steps_is_final() {
        let mut scheduler = scheduler(0.4, 0.9, 0);
        assert_eq!(scheduler.beta(), 0.9);
        scheduler.step();
        assert_eq!(scheduler.n_opts(), 0);
        assert_eq!(scheduler.beta(), 0.9);
    }
}
