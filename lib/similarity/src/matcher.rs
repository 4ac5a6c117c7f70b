//! Two-stage matchers
//!
//! Stage 1 assigns the query to a success path, stage 2 compares the query
//! with that path's per-feature distributions using the weight table, and
//! the two signals are calibrated into a bounded score.

use crate::config::{MatcherVariant, MatchingConfig};
use crate::distance::{distribution_similarity, robust_distribution_similarity};
use crate::explain::{recommendation, MatchLevel, MatchResult, ScoreBreakdown};
use crate::prepared::PreparedCategory;
use pathmatch_core::vector::{cosine_similarity, norm};
use pathmatch_core::{QueryVector, Result};
use tracing::trace;

/// Confidence reported by the base matcher when no path has positive cosine
const BASE_CONFIDENCE_FLOOR: f64 = 0.1;

/// Cosine signal used when the query or a center sits on the category mean
const DEGENERATE_COSINE: f64 = 0.1;

/// Lower bound of the robust distribution similarity
const MIN_DISTRIBUTION_SIMILARITY: f64 = 0.1;

/// Scores one query against one prepared category
pub trait Matcher: Send + Sync + std::fmt::Debug {
    fn variant(&self) -> MatcherVariant;

    /// Match `query` against `category`.
    ///
    /// # Errors
    ///
    /// `SchemaMismatch` when the query does not use the category's schema.
    fn match_category(&self, category: &PreparedCategory, query: &QueryVector)
        -> Result<MatchResult>;
}

/// Build the matcher selected by `config.variant`
pub fn matcher_for(config: &MatchingConfig) -> Box<dyn Matcher> {
    match config.variant {
        MatcherVariant::Base => Box::new(BaseMatcher::new(config.clone())),
        MatcherVariant::Robust => Box::new(RobustMatcher::new(config.clone())),
    }
}

/// Zero-filled queries, cosine path assignment and a linear z-curve
#[derive(Debug, Clone)]
pub struct BaseMatcher {
    config: MatchingConfig,
}

impl BaseMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Weighted similarity of the present query values to one path's
    /// distributions; `None` when no weighted feature has a value.
    pub fn weighted_similarity(
        &self,
        category: &PreparedCategory,
        path: usize,
        values: &[Option<f64>],
    ) -> Option<f64> {
        let stats = category.profile().paths()[path].per_feature_stats();
        let mut total_weight = 0.0;
        let mut sum = 0.0;
        for &(j, w) in category.weights() {
            if let Some(v) = values.get(j).copied().flatten() {
                sum += w * distribution_similarity(v, stats[j].mean, stats[j].std);
                total_weight += w;
            }
        }
        (total_weight > 0.0).then(|| sum / total_weight)
    }
}

impl Matcher for BaseMatcher {
    fn variant(&self) -> MatcherVariant {
        MatcherVariant::Base
    }

    fn match_category(
        &self,
        category: &PreparedCategory,
        query: &QueryVector,
    ) -> Result<MatchResult> {
        category.check_query(query)?;
        let paths = category.profile().paths();
        let dense = query.filled(&vec![0.0; query.len()]);

        let (path, best_cosine) = paths
            .iter()
            .map(|p| cosine_similarity(&dense, p.center()).max(0.0))
            .enumerate()
            .fold((0, f64::MIN), |best, (i, c)| if c > best.1 { (i, c) } else { best });
        let confidence = if best_cosine > 0.0 {
            best_cosine
        } else {
            BASE_CONFIDENCE_FLOOR
        };

        let Some(weighted) = self.weighted_similarity(category, path, query.values()) else {
            return Ok(conservative_result(&self.config, self.variant(), category, path));
        };

        let raw = (self.config.base_similarity_weight * weighted
            + self.config.base_confidence_weight * confidence)
            * 100.0;
        let score = self.config.clamp_score(raw);

        trace!(
            category = category.name(),
            path,
            confidence,
            weighted,
            score,
            "base match"
        );
        Ok(build_result(
            &self.config,
            self.variant(),
            category,
            path,
            score,
            confidence,
            weighted,
            None,
        ))
    }
}

/// Outlier-resistant matcher with blended signals and a score breakdown
#[derive(Debug, Clone)]
pub struct RobustMatcher {
    config: MatchingConfig,
}

/// Signals computed for one candidate path
#[derive(Debug, Clone, Copy)]
struct PathSignals {
    cosine: f64,
    distribution: f64,
    combined: f64,
    confidence: f64,
}

impl RobustMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Query values clipped to the category clip range, missing values
    /// filled with the category robust mean
    pub fn normalize_query(&self, category: &PreparedCategory, query: &QueryVector) -> Vec<f64> {
        query
            .values()
            .iter()
            .zip(category.fill_values().iter())
            .enumerate()
            .map(|(j, (v, fill))| match v {
                Some(x) => category.clip(j, *x),
                None => *fill,
            })
            .collect()
    }

    /// Weighted tiered similarity of dense values to one path's clipped
    /// distributions, within [0.1, 1]
    pub fn distribution_similarity(
        &self,
        category: &PreparedCategory,
        path: usize,
        dense: &[f64],
    ) -> f64 {
        let stats = category.profile().paths()[path].per_feature_stats();
        let mut total_weight = 0.0;
        let mut sum = 0.0;
        for &(j, w) in category.weights() {
            let spread = category.robust_spread(path, j);
            sum += w * robust_distribution_similarity(dense[j], stats[j].clipped_mean, spread);
            total_weight += w;
        }
        if total_weight <= 0.0 {
            return MIN_DISTRIBUTION_SIMILARITY;
        }
        (sum / total_weight).clamp(MIN_DISTRIBUTION_SIMILARITY, 1.0)
    }

    /// Cosine to a path center in robust-standardized space, mapped to [0, 1]
    fn cosine_signal(&self, category: &PreparedCategory, path: usize, standardized: &[f64]) -> f64 {
        let center = category.standardized_center(path);
        if norm(standardized) < 1e-9 || norm(center) < 1e-9 {
            return DEGENERATE_COSINE;
        }
        (cosine_similarity(standardized, center) + 1.0) / 2.0
    }

    fn path_signals(
        &self,
        category: &PreparedCategory,
        path: usize,
        dense: &[f64],
        standardized: &[f64],
    ) -> PathSignals {
        let info = &category.profile().paths()[path];
        let cosine = self.cosine_signal(category, path, standardized);
        let distribution = self.distribution_similarity(category, path, dense);
        let combined =
            self.config.cosine_weight * cosine + self.config.distribution_weight * distribution;
        let confidence = combined
            * (0.7 + 0.3 * info.representativeness())
            * (info.coverage() * 10.0).min(1.0);
        PathSignals {
            cosine,
            distribution,
            combined,
            confidence,
        }
    }
}

impl Matcher for RobustMatcher {
    fn variant(&self) -> MatcherVariant {
        MatcherVariant::Robust
    }

    fn match_category(
        &self,
        category: &PreparedCategory,
        query: &QueryVector,
    ) -> Result<MatchResult> {
        category.check_query(query)?;
        let dense = self.normalize_query(category, query);
        let standardized = category.standardize(&dense);

        let mut best: Option<(usize, PathSignals)> = None;
        for path in 0..category.profile().paths().len() {
            let signals = self.path_signals(category, path, &dense, &standardized);
            if best.map_or(true, |(_, b)| signals.confidence > b.confidence) {
                best = Some((path, signals));
            }
        }
        let Some((path, signals)) = best else {
            return Ok(conservative_result(&self.config, self.variant(), category, 0));
        };

        if !category.has_weighted_values(query) {
            return Ok(conservative_result(&self.config, self.variant(), category, path));
        }

        let confidence = signals.confidence.clamp(self.config.min_confidence, 1.0);
        let coverage = category.profile().paths()[path].coverage();
        let breakdown = ScoreBreakdown {
            base_score: signals.combined * 100.0,
            confidence_adjustment: (confidence - self.config.confidence_pivot)
                * self.config.confidence_scale,
            coverage_adjustment: (coverage - self.config.coverage_pivot)
                * self.config.coverage_scale,
            cosine_similarity: signals.cosine,
            distribution_similarity: signals.distribution,
        };
        let score = self.config.clamp_score(
            breakdown.base_score + breakdown.confidence_adjustment + breakdown.coverage_adjustment,
        );

        trace!(
            category = category.name(),
            path,
            cosine = signals.cosine,
            distribution = signals.distribution,
            confidence,
            score,
            "robust match"
        );
        Ok(build_result(
            &self.config,
            self.variant(),
            category,
            path,
            score,
            confidence,
            signals.combined,
            Some(breakdown),
        ))
    }
}

#[allow(clippy::too_many_arguments)]
fn build_result(
    config: &MatchingConfig,
    variant: MatcherVariant,
    category: &PreparedCategory,
    path: usize,
    score: u32,
    confidence: f64,
    similarity: f64,
    score_breakdown: Option<ScoreBreakdown>,
) -> MatchResult {
    let info = &category.profile().paths()[path];
    let level = MatchLevel::from_score(score, &config.levels);
    MatchResult {
        category: category.name().to_string(),
        score,
        matched_path: info.label().to_string(),
        path_id: info.id(),
        confidence: confidence.clamp(0.0, 1.0),
        similarity: similarity.clamp(0.0, 1.0),
        level,
        recommendation: recommendation(score, level, info.label()),
        path_coverage: info.coverage(),
        path_representativeness: info.representativeness(),
        success_indicators: info.success_indicators().clone(),
        variant,
        score_breakdown,
    }
}

/// Minimum-confidence result for a query with no weighted feature present
fn conservative_result(
    config: &MatchingConfig,
    variant: MatcherVariant,
    category: &PreparedCategory,
    path: usize,
) -> MatchResult {
    build_result(
        config,
        variant,
        category,
        path,
        config.score_floor,
        config.min_confidence,
        0.0,
        None,
    )
}
