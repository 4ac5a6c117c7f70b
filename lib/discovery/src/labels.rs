//! Human-readable path labels and success indicators.
//!
//! Both are derived from a path's per-feature means using fixed rule tables
//! keyed by well-known feature names. Features absent from the schema are
//! skipped.

use pathmatch_core::names;
use pathmatch_core::{FeatureSchema, FeatureStats};
use std::collections::{BTreeMap, BTreeSet};

/// Maximum number of tags joined into one label
pub const MAX_LABEL_TAGS: usize = 3;

/// Separator between label tags
pub const LABEL_SEPARATOR: &str = " / ";

/// A tag rule: the first threshold the feature mean reaches selects the tag.
struct TagRule {
    feature: &'static str,
    tiers: &'static [(f64, &'static str)],
}

/// Tag rules in priority order
const TAG_RULES: &[TagRule] = &[
    TagRule {
        feature: names::SOURCE_UNIVERSITY_TIER,
        tiers: &[
            (85.0, "top-tier institution"),
            (75.0, "key institution"),
            (65.0, "first-class discipline"),
            (0.0, "general institution"),
        ],
    },
    TagRule {
        feature: names::GPA_PERCENTILE,
        tiers: &[(85.0, "high GPA"), (70.0, "mid GPA"), (0.0, "average GPA")],
    },
    TagRule {
        feature: names::MAJOR_MATCHING,
        tiers: &[
            (0.8, "strong major fit"),
            (0.6, "moderate major fit"),
            (0.3, "weak major fit"),
            (0.0, "cross-major"),
        ],
    },
    TagRule {
        feature: names::LANGUAGE_SCORE,
        tiers: &[
            (80.0, "excellent language"),
            (65.0, "good language"),
            (0.0, "basic language"),
        ],
    },
    TagRule {
        feature: names::WORK_EXPERIENCE_YEARS,
        tiers: &[(2.0, "experienced"), (0.0, "new graduate")],
    },
];

/// Indicator rules: `(indicator name, feature, divisor)`; value = min(mean / divisor, 1)
const INDICATOR_RULES: &[(&str, &str, f64)] = &[
    ("high_university_background", names::SOURCE_UNIVERSITY_TIER, 100.0),
    ("strong_academic_performance", names::GPA_PERCENTILE, 100.0),
    ("relevant_major_background", names::MAJOR_MATCHING, 1.0),
    ("language_proficiency", names::LANGUAGE_SCORE, 100.0),
    ("professional_experience", names::WORK_EXPERIENCE_YEARS, 5.0),
];

/// Build a path label from its per-feature statistics.
///
/// At most [`MAX_LABEL_TAGS`] tags in priority order, joined with
/// [`LABEL_SEPARATOR`]; `pattern N` when no rule applies.
pub fn path_label(schema: &FeatureSchema, stats: &[FeatureStats], path_id: usize) -> String {
    let tags: Vec<&str> = TAG_RULES
        .iter()
        .filter_map(|rule| {
            let s = stats.get(schema.index_of(rule.feature)?)?;
            if s.count == 0 {
                return None;
            }
            rule.tiers
                .iter()
                .find(|(threshold, _)| s.mean >= *threshold)
                .map(|(_, tag)| *tag)
        })
        .take(MAX_LABEL_TAGS)
        .collect();

    if tags.is_empty() {
        format!("pattern {}", path_id)
    } else {
        tags.join(LABEL_SEPARATOR)
    }
}

/// Make labels unique within one category.
///
/// The first occurrence keeps its label; later repeats get ` #2`, ` #3`, ...
/// in path order.
pub fn disambiguate_labels(labels: &mut [String]) {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut repeats: BTreeMap<String, usize> = BTreeMap::new();
    for label in labels.iter_mut() {
        if seen.insert(label.clone()) {
            continue;
        }
        let n = repeats.entry(label.clone()).or_insert(1);
        loop {
            *n += 1;
            let candidate = format!("{} #{}", label, n);
            if seen.insert(candidate.clone()) {
                *label = candidate;
                break;
            }
        }
    }
}

/// Bounded [0, 1] sub-scores summarizing a path
pub fn success_indicators(schema: &FeatureSchema, stats: &[FeatureStats]) -> BTreeMap<String, f64> {
    INDICATOR_RULES
        .iter()
        .filter_map(|(name, feature, divisor)| {
            let s = stats.get(schema.index_of(feature)?)?;
            Some((name.to_string(), (s.mean / divisor).clamp(0.0, 1.0)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with_means(means: &[f64]) -> Vec<FeatureStats> {
        means
            .iter()
            .map(|&m| FeatureStats::from_values(&[m, m]))
            .collect()
    }

    #[test]
    fn test_label_takes_first_three_tags() {
        let schema = FeatureSchema::standard();
        let mut means = vec![0.0; schema.len()];
        means[0] = 90.0; // source tier
        means[1] = 72.0; // gpa
        means[2] = 0.5; // major matching
        means[3] = 85.0; // language
        let label = path_label(&schema, &stats_with_means(&means), 0);
        assert_eq!(label, "top-tier institution / mid GPA / weak major fit");
    }

    #[test]
    fn test_label_fallback() {
        let schema = FeatureSchema::new(["x", "y"]).unwrap();
        let label = path_label(&schema, &stats_with_means(&[1.0, 2.0]), 3);
        assert_eq!(label, "pattern 3");
    }

    #[test]
    fn test_negative_means_produce_no_tag() {
        let schema = FeatureSchema::new([names::GPA_PERCENTILE]).unwrap();
        let label = path_label(&schema, &stats_with_means(&[-1.0]), 1);
        assert_eq!(label, "pattern 1");
    }

    #[test]
    fn test_repeated_labels_get_suffixes() {
        let mut labels: Vec<String> = ["high GPA", "mid GPA", "high GPA", "high GPA #2", "high GPA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        disambiguate_labels(&mut labels);
        assert_eq!(
            labels,
            vec!["high GPA", "mid GPA", "high GPA #2", "high GPA #2 #2", "high GPA #3"]
        );
        let unique: BTreeSet<&String> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len());
    }

    #[test]
    fn test_distinct_labels_untouched() {
        let mut labels = vec!["pattern 0".to_string(), "pattern 1".to_string()];
        disambiguate_labels(&mut labels);
        assert_eq!(labels, vec!["pattern 0", "pattern 1"]);
    }

    #[test]
    fn test_indicators_bounded() {
        let schema = FeatureSchema::standard();
        let mut means = vec![0.0; schema.len()];
        means[0] = 120.0;
        means[4] = 2.5;
        let indicators = success_indicators(&schema, &stats_with_means(&means));
        assert_eq!(indicators["high_university_background"], 1.0);
        assert!((indicators["professional_experience"] - 0.5).abs() < 1e-12);
        assert_eq!(indicators.len(), 5);
        assert!(indicators.values().all(|v| (0.0..=1.0).contains(v)));
    }
}
