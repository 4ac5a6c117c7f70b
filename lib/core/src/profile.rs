//! Success paths and category profiles
//!
//! These are the durable products of discovery: immutable once built and
//! validated on construction, so matching code never has to guard against
//! missing fields.

use crate::stats::{FeatureStats, RobustStats};
use crate::vector::all_finite;
use crate::{Error, FeatureSchema, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Smallest number of paths a category profile may hold
pub const MIN_PATHS: usize = 2;

/// Exclusive upper bound on the number of paths per category
pub const MAX_PATHS_EXCLUSIVE: usize = 6;

/// Allowed deviation of the summed path coverage from 1.0
pub const COVERAGE_TOLERANCE: f64 = 0.01;

/// Raw material for a [`SuccessPath`]
#[derive(Debug, Clone)]
pub struct PathParts {
    pub label: String,
    pub size: usize,
    pub coverage: f64,
    pub representativeness: f64,
    pub center: Vec<f64>,
    pub per_feature_stats: Vec<FeatureStats>,
    pub success_indicators: BTreeMap<String, f64>,
    pub key_features: Vec<String>,
}

/// One latent pattern discovered within a category's applicant population
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessPath {
    id: usize,
    label: String,
    size: usize,
    coverage: f64,
    representativeness: f64,
    center: Vec<f64>,
    per_feature_stats: Vec<FeatureStats>,
    success_indicators: BTreeMap<String, f64>,
    key_features: Vec<String>,
}

impl SuccessPath {
    pub fn new(id: usize, schema: &FeatureSchema, parts: PathParts) -> Result<Self> {
        let PathParts {
            label,
            size,
            coverage,
            representativeness,
            center,
            per_feature_stats,
            success_indicators,
            key_features,
        } = parts;

        let ctx = |msg: String| Error::corrupt(format!("path {}: {}", id, msg));

        if size == 0 {
            return Err(ctx("sample size is zero".to_string()));
        }
        if !(coverage > 0.0 && coverage <= 1.0 + COVERAGE_TOLERANCE) {
            return Err(ctx(format!("coverage {} outside (0, 1]", coverage)));
        }
        if !(0.0..=1.0).contains(&representativeness) {
            return Err(ctx(format!(
                "representativeness {} outside [0, 1]",
                representativeness
            )));
        }
        if center.len() != schema.len() {
            return Err(ctx(format!(
                "center has {} values, schema has {} features",
                center.len(),
                schema.len()
            )));
        }
        if !all_finite(&center) {
            return Err(ctx("center contains non-finite values".to_string()));
        }
        if per_feature_stats.len() != schema.len() {
            return Err(ctx(format!(
                "{} feature statistics for {} features",
                per_feature_stats.len(),
                schema.len()
            )));
        }
        if let Some(i) = per_feature_stats.iter().position(|s| !s.is_finite()) {
            return Err(ctx(format!(
                "statistics for '{}' are not finite",
                schema.name(i).unwrap_or("?")
            )));
        }
        if let Some((name, v)) = success_indicators
            .iter()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(ctx(format!("indicator '{}' = {} outside [0, 1]", name, v)));
        }
        if let Some(name) = key_features.iter().find(|n| !schema.contains(n)) {
            return Err(ctx(format!("key feature '{}' not in schema", name)));
        }

        Ok(Self {
            id,
            label,
            size,
            coverage,
            representativeness,
            center,
            per_feature_stats,
            success_indicators,
            key_features,
        })
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Persisted path key, e.g. `path_0`
    pub fn key(&self) -> String {
        format!("path_{}", self.id)
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    #[inline]
    pub fn representativeness(&self) -> f64 {
        self.representativeness
    }

    #[inline]
    pub fn center(&self) -> &[f64] {
        &self.center
    }

    #[inline]
    pub fn per_feature_stats(&self) -> &[FeatureStats] {
        &self.per_feature_stats
    }

    #[inline]
    pub fn stats(&self, feature: usize) -> &FeatureStats {
        &self.per_feature_stats[feature]
    }

    #[inline]
    pub fn success_indicators(&self) -> &BTreeMap<String, f64> {
        &self.success_indicators
    }

    #[inline]
    pub fn key_features(&self) -> &[String] {
        &self.key_features
    }
}

/// Category-level summary of a discovery run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    pub total_applicants: usize,
    pub num_paths: usize,
    /// Silhouette coefficient of the chosen partition
    pub quality: f64,
    /// True when no k met the quality threshold and the k=2 fallback was used
    #[serde(default)]
    pub degenerate: bool,
    /// Silhouette score of every k that produced a valid partition
    #[serde(default)]
    pub k_scores: BTreeMap<usize, f64>,
    /// Features ranked by inter-path variance, normalized to sum to 1
    #[serde(default)]
    pub feature_importance: Vec<(String, f64)>,
}

/// All success paths of one target category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProfile {
    name: String,
    schema: Arc<FeatureSchema>,
    summary: CategorySummary,
    feature_stats: Vec<RobustStats>,
    paths: Vec<SuccessPath>,
}

impl CategoryProfile {
    pub fn new(
        name: impl Into<String>,
        schema: Arc<FeatureSchema>,
        summary: CategorySummary,
        feature_stats: Vec<RobustStats>,
        paths: Vec<SuccessPath>,
    ) -> Result<Self> {
        let name = name.into();
        let ctx = |msg: String| Error::corrupt(format!("category '{}': {}", name, msg));

        if !(MIN_PATHS..MAX_PATHS_EXCLUSIVE).contains(&paths.len()) {
            return Err(ctx(format!(
                "{} paths, expected between {} and {}",
                paths.len(),
                MIN_PATHS,
                MAX_PATHS_EXCLUSIVE - 1
            )));
        }
        if summary.num_paths != paths.len() {
            return Err(ctx(format!(
                "summary lists {} paths, profile has {}",
                summary.num_paths,
                paths.len()
            )));
        }
        if feature_stats.len() != schema.len() {
            return Err(ctx(format!(
                "{} category statistics for {} features",
                feature_stats.len(),
                schema.len()
            )));
        }
        if feature_stats.iter().any(|s| !s.is_finite()) {
            return Err(ctx("category statistics are not finite".to_string()));
        }
        for path in &paths {
            if path.center.len() != schema.len() {
                return Err(ctx(format!("path {} does not match the schema", path.id)));
            }
        }
        let coverage: f64 = paths.iter().map(|p| p.coverage).sum();
        if (coverage - 1.0).abs() > COVERAGE_TOLERANCE {
            return Err(ctx(format!("path coverage sums to {:.4}", coverage)));
        }

        Ok(Self {
            name,
            schema,
            summary,
            feature_stats,
            paths,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    #[inline]
    pub fn summary(&self) -> &CategorySummary {
        &self.summary
    }

    #[inline]
    pub fn feature_stats(&self) -> &[RobustStats] {
        &self.feature_stats
    }

    #[inline]
    pub fn paths(&self) -> &[SuccessPath] {
        &self.paths
    }

    pub fn path(&self, id: usize) -> Option<&SuccessPath> {
        self.paths.iter().find(|p| p.id == id)
    }

    pub fn total_coverage(&self) -> f64 {
        self.paths.iter().map(|p| p.coverage).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<FeatureSchema> {
        Arc::new(FeatureSchema::new(["a", "b"]).unwrap())
    }

    fn parts(coverage: f64, center: Vec<f64>) -> PathParts {
        PathParts {
            label: "test".to_string(),
            size: 10,
            coverage,
            representativeness: 0.8,
            center,
            per_feature_stats: vec![FeatureStats::from_values(&[1.0, 2.0]); 2],
            success_indicators: BTreeMap::new(),
            key_features: vec!["a".to_string()],
        }
    }

    fn summary(num_paths: usize) -> CategorySummary {
        CategorySummary {
            total_applicants: 20,
            num_paths,
            quality: 0.6,
            degenerate: false,
            k_scores: BTreeMap::new(),
            feature_importance: Vec::new(),
        }
    }

    fn category_stats() -> Vec<RobustStats> {
        vec![RobustStats::from_values(&[1.0, 2.0, 3.0]); 2]
    }

    #[test]
    fn test_path_validation() {
        let s = schema();
        assert!(SuccessPath::new(0, &s, parts(0.5, vec![1.0, 2.0])).is_ok());
        assert!(SuccessPath::new(0, &s, parts(0.5, vec![1.0])).is_err());
        assert!(SuccessPath::new(0, &s, parts(0.0, vec![1.0, 2.0])).is_err());
        assert!(SuccessPath::new(0, &s, parts(0.5, vec![f64::NAN, 2.0])).is_err());

        let mut empty = parts(0.5, vec![1.0, 2.0]);
        empty.size = 0;
        assert!(matches!(
            SuccessPath::new(0, &s, empty),
            Err(Error::ProfileCorrupt(_))
        ));
    }

    #[test]
    fn test_category_coverage_invariant() {
        let s = schema();
        let p0 = SuccessPath::new(0, &s, parts(0.5, vec![1.0, 2.0])).unwrap();
        let p1 = SuccessPath::new(1, &s, parts(0.5, vec![3.0, 4.0])).unwrap();
        let profile =
            CategoryProfile::new("x", s.clone(), summary(2), category_stats(), vec![p0.clone(), p1])
                .unwrap();
        assert!((profile.total_coverage() - 1.0).abs() < 1e-12);
        assert_eq!(profile.path(1).map(|p| p.key()), Some("path_1".to_string()));

        let p1_short = SuccessPath::new(1, &s, parts(0.3, vec![3.0, 4.0])).unwrap();
        assert!(CategoryProfile::new("x", s, summary(2), category_stats(), vec![p0, p1_short])
            .is_err());
    }

    #[test]
    fn test_category_path_count_bounds() {
        let s = schema();
        let p0 = SuccessPath::new(0, &s, parts(1.0, vec![1.0, 2.0])).unwrap();
        assert!(CategoryProfile::new("x", s, summary(1), category_stats(), vec![p0]).is_err());
    }
}
