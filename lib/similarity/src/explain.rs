//! Match explanations
//!
//! Types that make a score explainable: the assigned path, the level band,
//! a templated recommendation and, for the robust matcher, the components
//! the final score was assembled from.

use crate::config::{LevelThresholds, MatcherVariant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categorical band of a score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    High,
    Medium,
    Low,
    VeryLow,
    NoMatch,
}

impl MatchLevel {
    pub fn from_score(score: u32, thresholds: &LevelThresholds) -> Self {
        if score >= thresholds.high {
            MatchLevel::High
        } else if score >= thresholds.medium {
            MatchLevel::Medium
        } else if score >= thresholds.low {
            MatchLevel::Low
        } else if score >= thresholds.very_low {
            MatchLevel::VeryLow
        } else {
            MatchLevel::NoMatch
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLevel::High => "high",
            MatchLevel::Medium => "medium",
            MatchLevel::Low => "low",
            MatchLevel::VeryLow => "very_low",
            MatchLevel::NoMatch => "no_match",
        }
    }

    pub fn all() -> [MatchLevel; 5] {
        [
            MatchLevel::High,
            MatchLevel::Medium,
            MatchLevel::Low,
            MatchLevel::VeryLow,
            MatchLevel::NoMatch,
        ]
    }
}

impl std::fmt::Display for MatchLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Templated explanation for a score
pub fn recommendation(score: u32, level: MatchLevel, path_label: &str) -> String {
    match level {
        MatchLevel::High => format!(
            "Your background closely matches the '{}' path (score {}). Applying is strongly recommended.",
            path_label, score
        ),
        MatchLevel::Medium => format!(
            "Your background fits the '{}' path reasonably well (score {}). Consider applying and strengthening the weaker areas.",
            path_label, score
        ),
        MatchLevel::Low => format!(
            "Your background partly matches the '{}' path (score {}). Targeted improvements are needed before applying.",
            path_label, score
        ),
        MatchLevel::VeryLow => format!(
            "Your background differs noticeably from the '{}' path (score {}). Treat this as a reach option.",
            path_label, score
        ),
        MatchLevel::NoMatch => format!(
            "Your background does not match any successful path for this category (closest: '{}', score {}).",
            path_label, score
        ),
    }
}

/// Components of a robust score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    /// Blended similarity × 100
    pub base_score: f64,
    pub confidence_adjustment: f64,
    pub coverage_adjustment: f64,
    /// Cosine-to-center signal of the matched path, in [0, 1]
    pub cosine_similarity: f64,
    /// Weighted distribution similarity of the matched path, in [0, 1]
    pub distribution_similarity: f64,
}

/// Result of matching one query against one category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub category: String,
    /// Calibrated score within the configured floor and ceiling
    pub score: u32,
    /// Label of the assigned path
    pub matched_path: String,
    pub path_id: usize,
    pub confidence: f64,
    /// Raw similarity before calibration
    pub similarity: f64,
    pub level: MatchLevel,
    pub recommendation: String,
    pub path_coverage: f64,
    pub path_representativeness: f64,
    pub success_indicators: BTreeMap<String, f64>,
    pub variant: MatcherVariant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_breakdown: Option<ScoreBreakdown>,
}

/// Aggregate statistics over a set of results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RankingStats {
    /// Results evaluated
    pub evaluated: usize,
    /// Categories that failed
    pub failed: usize,
    pub average_score: f64,
    pub max_score: u32,
    pub min_score: u32,
    pub high_match_count: usize,
    pub high_match_rate: f64,
    /// Result count per level
    pub distribution: BTreeMap<MatchLevel, usize>,
}

impl RankingStats {
    pub fn from_results(results: &[MatchResult], failed: usize) -> Self {
        let mut distribution: BTreeMap<MatchLevel, usize> =
            MatchLevel::all().into_iter().map(|l| (l, 0)).collect();
        for r in results {
            *distribution.entry(r.level).or_default() += 1;
        }

        let evaluated = results.len();
        let high_match_count = distribution.get(&MatchLevel::High).copied().unwrap_or(0);
        let (average_score, high_match_rate) = if evaluated > 0 {
            let total: u64 = results.iter().map(|r| r.score as u64).sum();
            (
                total as f64 / evaluated as f64,
                high_match_count as f64 / evaluated as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            evaluated,
            failed,
            average_score,
            max_score: results.iter().map(|r| r.score).max().unwrap_or(0),
            min_score: results.iter().map(|r| r.score).min().unwrap_or(0),
            high_match_count,
            high_match_rate,
            distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u32) -> MatchResult {
        let level = MatchLevel::from_score(score, &LevelThresholds::default());
        MatchResult {
            category: "x".to_string(),
            score,
            matched_path: "p".to_string(),
            path_id: 0,
            confidence: 0.5,
            similarity: 0.5,
            level,
            recommendation: recommendation(score, level, "p"),
            path_coverage: 0.5,
            path_representativeness: 0.5,
            success_indicators: BTreeMap::new(),
            variant: MatcherVariant::Robust,
            score_breakdown: None,
        }
    }

    #[test]
    fn test_level_bands() {
        let t = LevelThresholds::default();
        assert_eq!(MatchLevel::from_score(100, &t), MatchLevel::High);
        assert_eq!(MatchLevel::from_score(85, &t), MatchLevel::High);
        assert_eq!(MatchLevel::from_score(84, &t), MatchLevel::Medium);
        assert_eq!(MatchLevel::from_score(55, &t), MatchLevel::Low);
        assert_eq!(MatchLevel::from_score(40, &t), MatchLevel::VeryLow);
        assert_eq!(MatchLevel::from_score(10, &t), MatchLevel::NoMatch);
    }

    #[test]
    fn test_recommendation_mentions_path() {
        let text = recommendation(90, MatchLevel::High, "top-tier institution / high GPA");
        assert!(text.contains("top-tier institution / high GPA"));
        assert!(text.contains("90"));
    }

    #[test]
    fn test_ranking_stats() {
        let stats = RankingStats::from_results(&[result(90), result(72), result(30)], 2);
        assert_eq!(stats.evaluated, 3);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.high_match_count, 1);
        assert!((stats.average_score - 64.0).abs() < 1e-9);
        assert_eq!(stats.max_score, 90);
        assert_eq!(stats.min_score, 30);
        assert_eq!(stats.distribution[&MatchLevel::NoMatch], 1);
        assert_eq!(stats.distribution[&MatchLevel::Low], 0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = RankingStats::from_results(&[], 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.distribution.len(), 5);
    }

    #[test]
    fn test_result_serializes_without_breakdown() {
        let json = serde_json::to_value(result(90)).unwrap();
        assert_eq!(json["level"], "high");
        assert!(json.get("score_breakdown").is_none());
    }
}
