//! Feature weight table
//!
//! Declares which features matter for the distribution similarity and how
//! much. A small set of core features carries most of the weight; the rest
//! are minor. Weights are always normalized to sum to 1.0.

use pathmatch_core::{names, Error, FeatureSchema, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Built-in weights: `(feature, weight)`
pub const DEFAULT_WEIGHTS: &[(&str, f64)] = &[
    // Core features
    (names::SOURCE_UNIVERSITY_TIER, 0.20),
    (names::GPA_PERCENTILE, 0.18),
    (names::MAJOR_MATCHING, 0.15),
    (names::LANGUAGE_SCORE, 0.12),
    (names::WORK_EXPERIENCE_YEARS, 0.10),
    (names::WORK_RELEVANCE, 0.08),
    // Minor features
    (names::TARGET_UNIVERSITY_TIER, 0.05),
    (names::UNIVERSITY_MATCHING, 0.04),
    (names::COMPETITION_INDEX, 0.03),
    (names::ACADEMIC_STRENGTH, 0.03),
    (names::COMPREHENSIVE_STRENGTH, 0.02),
];

/// Normalized feature-name → weight table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct FeatureWeights {
    weights: BTreeMap<String, f64>,
}

impl FeatureWeights {
    /// Validate and normalize a weight table.
    ///
    /// - the table must not be empty
    /// - weights must be finite and non-negative
    /// - the total must be positive
    pub fn new(weights: BTreeMap<String, f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::InvalidConfig("weight table cannot be empty".to_string()));
        }
        for (name, w) in &weights {
            if !w.is_finite() || *w < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "feature '{}' has invalid weight {}",
                    name, w
                )));
            }
        }

        let total: f64 = weights.values().sum();
        if total <= 0.0 {
            return Err(Error::InvalidConfig("total weight cannot be zero".to_string()));
        }

        let weights = weights.into_iter().map(|(k, w)| (k, w / total)).collect();
        Ok(Self { weights })
    }

    /// Create a new table with overrides applied on top of this one.
    ///
    /// Overrides replace existing weights or add new features; the result is
    /// re-normalized to sum to 1.0.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, f64>) -> Result<Self> {
        let mut merged = self.weights.clone();
        for (name, w) in overrides {
            merged.insert(name.clone(), *w);
        }
        Self::new(merged)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.weights.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, w)| (k.as_str(), *w))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Positive weights of the features present in `schema`, as `(index, weight)`
    /// in schema order. Features the schema lacks are left out.
    pub fn resolve(&self, schema: &FeatureSchema) -> Vec<(usize, f64)> {
        let mut resolved: Vec<(usize, f64)> = self
            .weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .filter_map(|(name, w)| schema.index_of(name).map(|i| (i, *w)))
            .collect();
        resolved.sort_by_key(|(i, _)| *i);
        resolved
    }
}

impl Default for FeatureWeights {
    fn default() -> Self {
        let total: f64 = DEFAULT_WEIGHTS.iter().map(|(_, w)| w).sum();
        Self {
            weights: DEFAULT_WEIGHTS
                .iter()
                .map(|(name, w)| (name.to_string(), w / total))
                .collect(),
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for FeatureWeights {
    type Error = Error;

    fn try_from(weights: BTreeMap<String, f64>) -> Result<Self> {
        FeatureWeights::new(weights)
    }
}

impl From<FeatureWeights> for BTreeMap<String, f64> {
    fn from(weights: FeatureWeights) -> Self {
        weights.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sums_to_one() {
        let weights = FeatureWeights::default();
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(weights.len(), 11);
        assert!((weights.get(names::SOURCE_UNIVERSITY_TIER).unwrap() - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_normalization() {
        let weights = FeatureWeights::new(BTreeMap::from([
            ("a".to_string(), 2.0),
            ("b".to_string(), 2.0),
        ]))
        .unwrap();
        assert_eq!(weights.get("a"), Some(0.5));
    }

    #[test]
    fn test_invalid_tables() {
        assert!(FeatureWeights::new(BTreeMap::new()).is_err());
        assert!(FeatureWeights::new(BTreeMap::from([("a".to_string(), -1.0)])).is_err());
        assert!(FeatureWeights::new(BTreeMap::from([("a".to_string(), 0.0)])).is_err());
        assert!(FeatureWeights::new(BTreeMap::from([("a".to_string(), f64::NAN)])).is_err());
    }

    #[test]
    fn test_overrides_renormalize() {
        let base = FeatureWeights::default();
        let modified = base
            .with_overrides(&BTreeMap::from([(names::COMPETITION_INDEX.to_string(), 0.5)]))
            .unwrap();
        assert!(
            modified.get(names::COMPETITION_INDEX).unwrap()
                > base.get(names::COMPETITION_INDEX).unwrap()
        );
        let total: f64 = modified.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_skips_absent_features() {
        let schema = FeatureSchema::new([names::GPA_PERCENTILE, "custom", names::LANGUAGE_SCORE])
            .unwrap();
        let resolved = FeatureWeights::default().resolve(&schema);
        assert_eq!(resolved.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let weights = FeatureWeights::default();
        let json = serde_json::to_string(&weights).unwrap();
        let parsed: FeatureWeights = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), weights.len());
        assert!(serde_json::from_str::<FeatureWeights>(r#"{"a": -1.0}"#).is_err());
    }
}
