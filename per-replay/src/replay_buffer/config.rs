//! Configuration of [`PrioritizedReplayBuffer`](super::PrioritizedReplayBuffer).
//!
//! Both structures can be serialized, and [`ReplayBufferConfig`] can be loaded
//! from or saved to a YAML file.
use crate::{Encode, ReplayBufferError};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of prioritized sampling.
///
/// # Examples
///
/// ```rust
/// use per_replay::replay_buffer::PerConfig;
///
/// let config = PerConfig::default()
///     .alpha(0.6)
///     .beta_0(0.4)
///     .beta_final(1.0)
///     .n_opts_final(500_000);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PerConfig {
    /// Exponent applied to priorities. `0` gives uniform sampling, `1` fully
    /// proportional sampling.
    pub alpha: f64,

    /// Initial value of the importance sampling exponent.
    pub beta_0: f64,

    /// Final value of the importance sampling exponent.
    pub beta_final: f64,

    /// Number of optimization steps after which `beta` reaches `beta_final`.
    pub n_opts_final: usize,
}

impl Default for PerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta_0: 0.4,
            beta_final: 1.0,
            n_opts_final: 500_000,
        }
    }
}

impl PerConfig {
    /// Sets the prioritization exponent `alpha`.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the initial importance sampling exponent.
    pub fn beta_0(mut self, beta_0: f64) -> Self {
        self.beta_0 = beta_0;
        self
    }

    /// Sets the final importance sampling exponent.
    pub fn beta_final(mut self, beta_final: f64) -> Self {
        self.beta_final = beta_final;
        self
    }

    /// Sets the number of optimization steps to reach `beta_final`.
    pub fn n_opts_final(mut self, n_opts_final: usize) -> Self {
        self.n_opts_final = n_opts_final;
        self
    }

    fn check(&self) -> Result<(), ReplayBufferError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.alpha) {
            return Err(ReplayBufferError::InvalidArgument(format!(
                "alpha must lie in [0, 1], got {}",
                self.alpha
            )));
        }
        if !in_unit(self.beta_0) || !in_unit(self.beta_final) {
            return Err(ReplayBufferError::InvalidArgument(format!(
                "beta_0 and beta_final must lie in [0, 1], got {} and {}",
                self.beta_0, self.beta_final
            )));
        }
        Ok(())
    }
}

/// Configuration of the replay buffer.
///
/// # Examples
///
/// ```rust
/// use per_replay::replay_buffer::{PerConfig, ReplayBufferConfig};
///
/// let config = ReplayBufferConfig::default()
///     .capacity(10000)
///     .batch_size(64)
///     .dimension(8)
///     .seed(42)
///     .per_config(PerConfig::default().alpha(0.7));
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// Maximum number of transitions. The oldest ones are overwritten once
    /// the buffer is full.
    pub capacity: usize,

    /// Default number of transitions per batch.
    pub batch_size: usize,

    /// Length of encoded states.
    pub dimension: usize,

    /// Random seed used for sampling.
    pub seed: u64,

    /// Parameters of prioritized sampling.
    pub per_config: PerConfig,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            batch_size: 32,
            dimension: 1,
            seed: 42,
            per_config: PerConfig::default(),
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the default batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the length of encoded states.
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Takes the length of encoded states from an [`Encode`] implementation.
    pub fn dimension_of<S: Encode>(self) -> Self {
        self.dimension(S::DIMENSION)
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the configuration of prioritized sampling.
    pub fn per_config(mut self, per_config: PerConfig) -> Self {
        self.per_config = per_config;
        self
    }

    /// Checks the parameters.
    pub fn check(&self) -> Result<(), ReplayBufferError> {
        if self.capacity == 0 {
            return Err(ReplayBufferError::InvalidArgument(
                "capacity must be positive".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ReplayBufferError::InvalidArgument(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.dimension == 0 {
            return Err(ReplayBufferError::InvalidArgument(
                "dimension must be positive".to_string(),
            ));
        }
        self.per_config.check()
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{PerConfig, ReplayBufferConfig};
    use crate::{Encode, ReplayBufferError};
    use anyhow::Result;
    use tempdir::TempDir;

    struct Pendulum;

    impl Encode for Pendulum {
        const DIMENSION: usize = 3;

        fn encode(&self) -> Vec<f64> {
            vec![0.0; 3]
        }
    }

    #[test]
    fn test_serde_replay_buffer_config() -> Result<()> {
        let config = ReplayBufferConfig::default()
            .capacity(500)
            .batch_size(16)
            .dimension_of::<Pendulum>()
            .seed(7)
            .per_config(PerConfig::default().alpha(0.5).n_opts_final(1000));

        let dir = TempDir::new("replay_buffer_config")?;
        let path = dir.path().join("replay_buffer_config.yaml");
        config.save(&path)?;
        let config_ = ReplayBufferConfig::load(&path)?;

        assert_eq!(config_.dimension, 3);
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_check() {
        assert!(ReplayBufferConfig::default().check().is_ok());

        let bad = [
            ReplayBufferConfig::default().capacity(0),
            ReplayBufferConfig::default().batch_size(0),
            ReplayBufferConfig::default().dimension(0),
            ReplayBufferConfig::default().per_config(PerConfig::default().alpha(1.5)),
            ReplayBufferConfig::default().per_config(PerConfig::default().alpha(f64::NAN)),
            ReplayBufferConfig::default().per_config(PerConfig::default().beta_0(-0.1)),
        ];
        for config in bad.iter() {
            assert!(matches!(
                config.check(),
                Err(ReplayBufferError::InvalidArgument(_))
            ));
        }
    }
}
