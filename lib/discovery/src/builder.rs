//! Turn a [`Discovery`] into a persisted-ready [`CategoryProfile`].

use crate::config::DiscoveryConfig;
use crate::engine::Discovery;
use crate::labels::{disambiguate_labels, path_label, success_indicators};
use ordered_float::OrderedFloat;
use pathmatch_core::profile::PathParts;
use pathmatch_core::vector::cosine_similarity;
use pathmatch_core::{
    CategoryProfile, CategorySummary, Error, FeatureSchema, FeatureStats, Result, RobustStats,
    SuccessPath,
};
use std::sync::Arc;
use tracing::debug;

/// Builds category profiles from discovery results
#[derive(Debug, Clone)]
pub struct PathProfileBuilder {
    max_key_features: usize,
    max_importance_features: usize,
}

impl PathProfileBuilder {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            max_key_features: config.max_key_features,
            max_importance_features: config.max_importance_features,
        }
    }

    /// Build the profile of one category.
    ///
    /// `rows` must be the same rows, in the same order, that produced `discovery`.
    ///
    /// # Errors
    ///
    /// `EmptyPath` when a discovered group has no members.
    pub fn build<R: AsRef<[f64]>>(
        &self,
        schema: &Arc<FeatureSchema>,
        rows: &[R],
        discovery: &Discovery,
    ) -> Result<CategoryProfile> {
        let total = discovery.total_applicants;
        schema.check_len(
            discovery.scaler.dim(),
            &format!("discovery for '{}'", discovery.category),
        )?;
        if rows.len() != total {
            return Err(Error::schema_mismatch(format!(
                "'{}' was discovered over {} rows, got {}",
                discovery.category,
                total,
                rows.len()
            )));
        }

        let mut parts_list: Vec<PathParts> = Vec::with_capacity(discovery.k());
        for (id, group) in discovery.groups.iter().enumerate() {
            if group.members.is_empty() {
                return Err(Error::EmptyPath {
                    category: discovery.category.clone(),
                    path: id,
                });
            }

            let member_rows: Vec<&[f64]> =
                group.members.iter().map(|&i| rows[i].as_ref()).collect();
            let per_feature_stats = column_stats(&member_rows, schema.len(), FeatureStats::from_values);

            let representativeness = {
                let sum: f64 = member_rows
                    .iter()
                    .map(|row| {
                        let z = discovery.scaler.transform(row);
                        cosine_similarity(&z, &group.standardized_center)
                    })
                    .sum();
                (sum / member_rows.len() as f64).clamp(0.0, 1.0)
            };

            let parts = PathParts {
                label: path_label(schema, &per_feature_stats, id),
                size: group.size(),
                coverage: group.size() as f64 / total as f64,
                representativeness,
                center: group.center.clone(),
                success_indicators: success_indicators(schema, &per_feature_stats),
                key_features: self.key_features(schema, &per_feature_stats),
                per_feature_stats,
            };
            parts_list.push(parts);
        }

        let mut labels: Vec<String> = parts_list.iter().map(|p| p.label.clone()).collect();
        disambiguate_labels(&mut labels);

        let mut paths = Vec::with_capacity(parts_list.len());
        for (id, (mut parts, label)) in parts_list.into_iter().zip(labels).enumerate() {
            parts.label = label;
            debug!(
                category = %discovery.category,
                path = id,
                label = %parts.label,
                size = parts.size,
                representativeness = parts.representativeness,
                "built path"
            );
            paths.push(SuccessPath::new(id, schema, parts)?);
        }

        let feature_stats = column_stats(rows, schema.len(), RobustStats::from_values);

        let summary = CategorySummary {
            total_applicants: total,
            num_paths: paths.len(),
            quality: discovery.quality,
            degenerate: discovery.degenerate,
            k_scores: discovery.k_scores.clone(),
            feature_importance: discovery
                .feature_importance
                .iter()
                .take(self.max_importance_features)
                .filter_map(|&(j, v)| schema.name(j).map(|n| (n.to_string(), v)))
                .collect(),
        };

        CategoryProfile::new(
            discovery.category.clone(),
            schema.clone(),
            summary,
            feature_stats,
            paths,
        )
    }

    /// Features with the highest coefficient of variation among the members
    fn key_features(&self, schema: &FeatureSchema, stats: &[FeatureStats]) -> Vec<String> {
        let mut ranked: Vec<(usize, f64)> = stats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.mean.abs() > 0.0)
            .map(|(j, s)| (j, s.std / s.mean.abs()))
            .filter(|(_, cv)| cv.is_finite())
            .collect();
        ranked.sort_by_key(|&(j, cv)| (std::cmp::Reverse(OrderedFloat(cv)), j));
        ranked
            .into_iter()
            .take(self.max_key_features)
            .filter_map(|(j, _)| schema.name(j).map(str::to_string))
            .collect()
    }
}

fn column_stats<R: AsRef<[f64]>, T>(rows: &[R], dim: usize, summarize: fn(&[f64]) -> T) -> Vec<T> {
    let mut column = Vec::with_capacity(rows.len());
    (0..dim)
        .map(|j| {
            column.clear();
            column.extend(rows.iter().map(|r| r.as_ref()[j]));
            summarize(&column)
        })
        .collect()
}
