//! Deterministic synthetic profiles for unit tests

use pathmatch_core::profile::PathParts;
use pathmatch_core::vector::mean_vector;
use pathmatch_core::{
    CategoryProfile, CategorySummary, FeatureSchema, FeatureStats, RobustStats, SuccessPath,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const STRONG: [f64; 11] = [88.0, 86.0, 0.85, 82.0, 1.0, 0.7, 80.0, 0.8, 0.5, 85.0, 84.0];
pub const MODERATE: [f64; 11] = [65.0, 68.0, 0.45, 66.0, 3.5, 0.4, 70.0, 0.6, 0.6, 66.0, 67.0];
const SPREAD: [f64; 11] = [3.0, 3.0, 0.05, 3.0, 0.5, 0.05, 3.0, 0.05, 0.05, 3.0, 3.0];

/// Rows scattered around `base` with a fixed pattern
pub fn rows_around(base: &[f64], spread: &[f64], n: usize, salt: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            base.iter()
                .zip(spread.iter())
                .enumerate()
                .map(|(j, (b, s))| {
                    let step = ((i * 7 + j * 3 + salt) % 11) as f64 - 5.0;
                    b + step * s / 5.0
                })
                .collect()
        })
        .collect()
}

fn stats_of(rows: &[Vec<f64>], dim: usize) -> Vec<FeatureStats> {
    (0..dim)
        .map(|j| FeatureStats::from_values(&rows.iter().map(|r| r[j]).collect::<Vec<_>>()))
        .collect()
}

/// Build a profile from explicit member groups
pub fn profile_from_groups(
    name: &str,
    schema: Arc<FeatureSchema>,
    groups: &[Vec<Vec<f64>>],
) -> CategoryProfile {
    let dim = schema.len();
    let total: usize = groups.iter().map(Vec::len).sum();
    let paths = groups
        .iter()
        .enumerate()
        .map(|(id, rows)| {
            let parts = PathParts {
                label: format!("path {}", id),
                size: rows.len(),
                coverage: rows.len() as f64 / total as f64,
                representativeness: 0.75,
                center: mean_vector(rows).unwrap(),
                per_feature_stats: stats_of(rows, dim),
                success_indicators: BTreeMap::from([("strength".to_string(), 0.5)]),
                key_features: Vec::new(),
            };
            SuccessPath::new(id, &schema, parts).unwrap()
        })
        .collect::<Vec<_>>();

    let all: Vec<Vec<f64>> = groups.iter().flatten().cloned().collect();
    let feature_stats = (0..dim)
        .map(|j| RobustStats::from_values(&all.iter().map(|r| r[j]).collect::<Vec<_>>()))
        .collect();

    let summary = CategorySummary {
        total_applicants: total,
        num_paths: paths.len(),
        quality: 0.6,
        degenerate: false,
        k_scores: BTreeMap::new(),
        feature_importance: Vec::new(),
    };
    CategoryProfile::new(name, schema, summary, feature_stats, paths).unwrap()
}

/// Two-path category over the standard schema: 60 strong, 40 moderate applicants
pub fn standard_category(name: &str, schema: Arc<FeatureSchema>) -> CategoryProfile {
    let groups = vec![
        rows_around(&STRONG, &SPREAD, 60, 0),
        rows_around(&MODERATE, &SPREAD, 40, 5),
    ];
    profile_from_groups(name, schema, &groups)
}

/// Category whose first path has identical members on every feature
pub fn zero_variance_category(schema: Arc<FeatureSchema>) -> CategoryProfile {
    let groups = vec![
        vec![STRONG.to_vec(); 30],
        rows_around(&MODERATE, &SPREAD, 30, 1),
    ];
    profile_from_groups("constant", schema, &groups)
}

/// Uneven two-path category: 90 moderate applicants and a 10-member strong minority
pub fn minority_category(schema: Arc<FeatureSchema>) -> CategoryProfile {
    let groups = vec![
        rows_around(&MODERATE, &SPREAD, 90, 2),
        rows_around(&STRONG, &SPREAD, 10, 4),
    ];
    profile_from_groups("uneven", schema, &groups)
}
