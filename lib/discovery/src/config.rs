//! Configuration for success-path discovery.

use pathmatch_core::profile::{MAX_PATHS_EXCLUSIVE, MIN_PATHS};
use pathmatch_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters of the discovery and profile-building stage.
///
/// # Validation
///
/// [`DiscoveryConfig::validate`] must pass before the config is handed to
/// [`crate::PathDiscoveryEngine::new`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Categories with fewer historical applicants are not clustered.
    pub min_applicants: usize,

    /// Smallest candidate number of paths.
    pub k_min: usize,

    /// Exclusive upper bound of the candidate range.
    pub k_max_exclusive: usize,

    /// Random restarts per candidate k; the lowest-inertia fit wins.
    pub n_init: usize,

    /// Lloyd iterations per restart.
    pub max_iterations: usize,

    /// Stop once no centroid moves further than this (standardized units).
    pub tolerance: f64,

    /// A k is only selected when its silhouette exceeds this.
    pub min_silhouette: f64,

    /// Seed for initialization and silhouette subsampling.
    pub seed: u64,

    /// Categories larger than this are scored on a seeded subsample.
    pub silhouette_sample_size: usize,

    /// Key distinguishing features kept per path.
    pub max_key_features: usize,

    /// Feature-importance entries kept in the category summary.
    pub max_importance_features: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_applicants: 100,
            k_min: MIN_PATHS,
            k_max_exclusive: MAX_PATHS_EXCLUSIVE,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            min_silhouette: 0.3,
            seed: 42,
            silhouette_sample_size: 2000,
            max_key_features: 5,
            max_importance_features: 10,
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k_min < MIN_PATHS {
            return Err(Error::InvalidConfig(format!(
                "k_min must be at least {}",
                MIN_PATHS
            )));
        }
        if self.k_max_exclusive > MAX_PATHS_EXCLUSIVE || self.k_max_exclusive <= self.k_min {
            return Err(Error::InvalidConfig(format!(
                "k range [{}, {}) must be non-empty and within [{}, {})",
                self.k_min, self.k_max_exclusive, MIN_PATHS, MAX_PATHS_EXCLUSIVE
            )));
        }
        if self.n_init == 0 {
            return Err(Error::InvalidConfig("n_init must be > 0".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("max_iterations must be > 0".to_string()));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::InvalidConfig(
                "tolerance must be a finite positive number".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.min_silhouette) {
            return Err(Error::InvalidConfig(
                "min_silhouette must be within [-1, 1]".to_string(),
            ));
        }
        if self.silhouette_sample_size < self.k_max_exclusive {
            return Err(Error::InvalidConfig(
                "silhouette_sample_size is too small".to_string(),
            ));
        }
        if self.min_applicants < self.k_min {
            return Err(Error::InvalidConfig(
                "min_applicants must be at least k_min".to_string(),
            ));
        }
        Ok(())
    }

    /// Candidate k values, in ascending order.
    pub fn k_candidates(&self) -> std::ops::Range<usize> {
        self.k_min..self.k_max_exclusive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DiscoveryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.k_candidates().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_k_range_bounds() {
        let mut config = DiscoveryConfig {
            k_max_exclusive: 7,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.k_max_exclusive = 2;
        assert!(config.validate().is_err());

        config.k_min = 1;
        config.k_max_exclusive = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_tolerance_rejected() {
        let config = DiscoveryConfig {
            tolerance: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DiscoveryConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.n_init, 10);
    }
}
