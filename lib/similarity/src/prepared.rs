//! Load-time indexing of category profiles
//!
//! Everything the matchers need beyond the raw profile (resolved weights,
//! robust fill values, standardized centers, per-path spreads) is derived
//! once here so requests only do O(paths × features) arithmetic.

use crate::weights::FeatureWeights;
use pathmatch_core::{CategoryProfile, FeatureSchema, QueryVector, Result};
use std::sync::Arc;

/// Spread below which a robust scale falls back to 1
const MIN_SCALE: f64 = 1e-9;

/// A category profile plus the values derived from it for matching
#[derive(Debug, Clone)]
pub struct PreparedCategory {
    profile: Arc<CategoryProfile>,
    /// `(feature index, weight)` for weighted features present in the schema
    weights: Vec<(usize, f64)>,
    /// Category robust mean per feature
    fill: Vec<f64>,
    /// Category robust std per feature, never zero
    scale: Vec<f64>,
    /// Path centers in robust-standardized units
    standardized_centers: Vec<Vec<f64>>,
    /// Per-path, per-feature spread: `max(clipped_std, category IQR / 2)`
    robust_spreads: Vec<Vec<f64>>,
    /// Query clip range per feature: the category fences widened to every
    /// path's observed member range
    clip_bounds: Vec<(f64, f64)>,
}

impl PreparedCategory {
    pub fn new(profile: Arc<CategoryProfile>, weights: &FeatureWeights) -> Self {
        let stats = profile.feature_stats();
        let fill: Vec<f64> = stats.iter().map(|s| s.robust_mean).collect();
        let scale: Vec<f64> = stats
            .iter()
            .map(|s| if s.robust_std > MIN_SCALE { s.robust_std } else { 1.0 })
            .collect();

        let standardized_centers = profile
            .paths()
            .iter()
            .map(|p| standardize(p.center(), &fill, &scale))
            .collect();

        let robust_spreads = profile
            .paths()
            .iter()
            .map(|p| {
                p.per_feature_stats()
                    .iter()
                    .zip(stats.iter())
                    .map(|(path_stats, category_stats)| {
                        path_stats.clipped_std.max(category_stats.iqr / 2.0)
                    })
                    .collect()
            })
            .collect();

        let clip_bounds = stats
            .iter()
            .enumerate()
            .map(|(j, s)| {
                profile
                    .paths()
                    .iter()
                    .map(|p| &p.per_feature_stats()[j])
                    .fold((s.lower_fence, s.upper_fence), |(lo, hi), f| {
                        (lo.min(f.min), hi.max(f.max))
                    })
            })
            .collect();

        Self {
            weights: weights.resolve(profile.schema()),
            profile,
            fill,
            scale,
            standardized_centers,
            robust_spreads,
            clip_bounds,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.profile.name()
    }

    #[inline]
    pub fn profile(&self) -> &Arc<CategoryProfile> {
        &self.profile
    }

    #[inline]
    pub fn schema(&self) -> &Arc<FeatureSchema> {
        self.profile.schema()
    }

    #[inline]
    pub fn weights(&self) -> &[(usize, f64)] {
        &self.weights
    }

    #[inline]
    pub fn fill_values(&self) -> &[f64] {
        &self.fill
    }

    #[inline]
    pub fn standardized_center(&self, path: usize) -> &[f64] {
        &self.standardized_centers[path]
    }

    #[inline]
    pub fn robust_spread(&self, path: usize, feature: usize) -> f64 {
        self.robust_spreads[path][feature]
    }

    /// Clip a query value into the feature's clip range
    ///
    /// Values any path actually observed are never moved, so a small path's
    /// members are not pulled toward the majority's fences.
    #[inline]
    pub fn clip(&self, feature: usize, value: f64) -> f64 {
        let (lo, hi) = self.clip_bounds[feature];
        if lo <= hi {
            value.clamp(lo, hi)
        } else {
            value
        }
    }

    /// Standardize a dense vector with the category's robust statistics
    pub fn standardize(&self, values: &[f64]) -> Vec<f64> {
        standardize(values, &self.fill, &self.scale)
    }

    /// Fail unless the query uses this category's feature schema
    pub fn check_query(&self, query: &QueryVector) -> Result<()> {
        if Arc::ptr_eq(query.schema(), self.schema()) {
            return Ok(());
        }
        self.schema().ensure_same(query.schema())
    }

    /// True when at least one weighted feature has a value in the query
    pub fn has_weighted_values(&self, query: &QueryVector) -> bool {
        self.weights.iter().any(|(j, _)| query.get(*j).is_some())
    }
}

fn standardize(values: &[f64], center: &[f64], scale: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(center.iter().zip(scale.iter()))
        .map(|(v, (c, s))| (v - c) / s)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, STRONG};

    #[test]
    fn test_clip_range_covers_every_path() {
        let schema = Arc::new(FeatureSchema::standard());
        let profile = Arc::new(fixtures::minority_category(schema));
        let category = PreparedCategory::new(profile.clone(), &FeatureWeights::default());

        for path in profile.paths() {
            for (j, stats) in path.per_feature_stats().iter().enumerate() {
                assert_eq!(category.clip(j, stats.min), stats.min);
                assert_eq!(category.clip(j, stats.max), stats.max);
            }
        }
        // far outside both the fences and the strong path's range
        let upper = category.clip(0, 1_000.0);
        assert!(upper < 1_000.0 && upper >= STRONG[0]);
        let lower = category.clip(0, -1_000.0);
        assert!(lower > -1_000.0);
    }
}
