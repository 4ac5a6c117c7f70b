//! Matching configuration
//!
//! Every blending weight and calibration constant is a tunable setting; the
//! defaults reproduce the production calibration.

use crate::weights::FeatureWeights;
use pathmatch_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which matcher scores requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatcherVariant {
    /// Cosine path assignment, zero-filled queries, linear z-curve
    Base,
    /// Clipped queries, robust-mean fill, blended signals, tiered z-curve
    #[default]
    Robust,
}

impl MatcherVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherVariant::Base => "base",
            MatcherVariant::Robust => "robust",
        }
    }
}

/// Score thresholds of the match levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LevelThresholds {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub very_low: u32,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            high: 85,
            medium: 70,
            low: 55,
            very_low: 40,
        }
    }
}

/// Matching configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchingConfig {
    pub variant: MatcherVariant,

    /// Overrides merged into the built-in weight table
    pub feature_weights: BTreeMap<String, f64>,

    /// Robust variant: share of the cosine-to-center signal
    pub cosine_weight: f64,
    /// Robust variant: share of the distribution similarity signal
    pub distribution_weight: f64,

    /// Base variant: share of the weighted similarity in the score
    pub base_similarity_weight: f64,
    /// Base variant: share of the path-assignment confidence in the score
    pub base_confidence_weight: f64,

    pub confidence_pivot: f64,
    pub confidence_scale: f64,
    pub coverage_pivot: f64,
    pub coverage_scale: f64,

    /// Robust variant: lower bound of the reported confidence
    pub min_confidence: f64,

    pub score_floor: u32,
    pub score_ceiling: u32,

    pub levels: LevelThresholds,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            variant: MatcherVariant::Robust,
            feature_weights: BTreeMap::new(),
            cosine_weight: 0.4,
            distribution_weight: 0.6,
            base_similarity_weight: 0.7,
            base_confidence_weight: 0.3,
            confidence_pivot: 0.5,
            confidence_scale: 20.0,
            coverage_pivot: 0.2,
            coverage_scale: 10.0,
            min_confidence: 0.15,
            score_floor: 10,
            score_ceiling: 100,
            levels: LevelThresholds::default(),
        }
    }
}

impl MatchingConfig {
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("cosine_weight", self.cosine_weight),
            ("distribution_weight", self.distribution_weight),
            ("base_similarity_weight", self.base_similarity_weight),
            ("base_confidence_weight", self.base_confidence_weight),
            ("confidence_pivot", self.confidence_pivot),
            ("confidence_scale", self.confidence_scale),
            ("coverage_pivot", self.coverage_pivot),
            ("coverage_scale", self.coverage_scale),
            ("min_confidence", self.min_confidence),
        ];
        for (name, v) in finite {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a finite non-negative number",
                    name
                )));
            }
        }
        if (self.cosine_weight + self.distribution_weight - 1.0).abs() > 1e-6 {
            return Err(Error::InvalidConfig(
                "cosine_weight + distribution_weight must equal 1".to_string(),
            ));
        }
        if (self.base_similarity_weight + self.base_confidence_weight - 1.0).abs() > 1e-6 {
            return Err(Error::InvalidConfig(
                "base_similarity_weight + base_confidence_weight must equal 1".to_string(),
            ));
        }
        if self.min_confidence > 1.0 {
            return Err(Error::InvalidConfig("min_confidence must be <= 1".to_string()));
        }
        if self.score_floor == 0 || self.score_floor > self.score_ceiling || self.score_ceiling > 100
        {
            return Err(Error::InvalidConfig(
                "score bounds must satisfy 0 < floor <= ceiling <= 100".to_string(),
            ));
        }
        let l = &self.levels;
        if !(l.high > l.medium && l.medium > l.low && l.low > l.very_low) {
            return Err(Error::InvalidConfig(
                "level thresholds must be strictly decreasing".to_string(),
            ));
        }
        Ok(())
    }

    /// Built-in weights with this config's overrides applied
    pub fn weights(&self) -> Result<FeatureWeights> {
        FeatureWeights::default().with_overrides(&self.feature_weights)
    }

    /// Clamp and round a raw score into the configured bounds
    pub fn clamp_score(&self, raw: f64) -> u32 {
        let floor = self.score_floor as f64;
        let ceiling = self.score_ceiling as f64;
        if raw.is_nan() {
            return self.score_floor;
        }
        raw.round().clamp(floor, ceiling) as u32
    }
}
