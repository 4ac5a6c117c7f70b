//! Path discovery: choose k and partition one category's applicants.

use crate::config::DiscoveryConfig;
use crate::kmeans::{KMeans, KMeansFit};
use crate::scaler::StandardScaler;
use crate::silhouette::silhouette_score;
use ordered_float::OrderedFloat;
use pathmatch_core::stats::population_variance;
use pathmatch_core::vector::mean_vector;
use pathmatch_core::{Error, FeatureSchema, Result};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// One discovered group of applicants
#[derive(Debug, Clone)]
pub struct DiscoveredGroup {
    /// Row indices into the category's input rows
    pub members: Vec<usize>,
    /// Group center in original feature units
    pub center: Vec<f64>,
    /// Group center in standardized units
    pub standardized_center: Vec<f64>,
}

impl DiscoveredGroup {
    #[inline]
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Partition of one category chosen by [`PathDiscoveryEngine::discover`]
#[derive(Debug, Clone)]
pub struct Discovery {
    pub category: String,
    pub total_applicants: usize,
    pub groups: Vec<DiscoveredGroup>,
    /// Silhouette of the chosen partition
    pub quality: f64,
    /// No candidate met the quality threshold; k=2 was used
    pub degenerate: bool,
    /// Silhouette of every candidate k that produced a valid partition
    pub k_scores: BTreeMap<usize, f64>,
    /// `(feature index, share)` sorted by descending share; shares sum to 1
    pub feature_importance: Vec<(usize, f64)>,
    /// Scaler fitted on the category, reused for standardized diagnostics
    pub scaler: StandardScaler,
}

impl Discovery {
    #[inline]
    pub fn k(&self) -> usize {
        self.groups.len()
    }
}

/// Chooses k and partitions a category into cohesive, mutually distinct groups
#[derive(Debug, Clone)]
pub struct PathDiscoveryEngine {
    config: DiscoveryConfig,
}

impl PathDiscoveryEngine {
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Discover the success paths of one category.
    ///
    /// # Errors
    ///
    /// - `InsufficientHistory` below `min_applicants`
    /// - `SchemaMismatch` when a row does not match the schema
    /// - `DiscoveryDegenerate` when even the k=2 fallback cannot produce two
    ///   non-empty groups (e.g. all applicants identical)
    pub fn discover<R: AsRef<[f64]>>(
        &self,
        category: &str,
        schema: &FeatureSchema,
        rows: &[R],
    ) -> Result<Discovery> {
        let n = rows.len();
        if n < self.config.min_applicants {
            return Err(Error::InsufficientHistory {
                category: category.to_string(),
                count: n,
                required: self.config.min_applicants,
            });
        }
        for (i, row) in rows.iter().enumerate() {
            schema.check_len(row.as_ref().len(), &format!("{} row {}", category, i))?;
        }

        let scaler = StandardScaler::fit(rows);
        let data = scaler.transform_all(rows);

        let mut k_scores = BTreeMap::new();
        let mut fits: BTreeMap<usize, KMeansFit> = BTreeMap::new();
        let mut best: Option<(usize, f64)> = None;

        for k in self.config.k_candidates() {
            if k > n {
                break;
            }
            let kmeans = KMeans::new(
                k,
                self.config.n_init,
                self.config.max_iterations,
                self.config.tolerance,
                self.config.seed,
            );
            let Some(fit) = kmeans.fit(&data) else {
                debug!(category, k, "all initializations degenerate, skipping k");
                continue;
            };
            let Some(score) = silhouette_score(
                &data,
                &fit.assignments,
                k,
                self.config.silhouette_sample_size,
                self.config.seed,
            ) else {
                continue;
            };

            debug!(category, k, silhouette = score, inertia = fit.inertia, "candidate partition");
            k_scores.insert(k, score);
            if score > self.config.min_silhouette && best.map_or(true, |(_, s)| score > s) {
                best = Some((k, score));
            }
            fits.insert(k, fit);
        }

        let fallback_k = self.config.k_min;
        let (k, quality, degenerate) = match best {
            Some((k, score)) => (k, score, false),
            None => {
                let score = k_scores.get(&fallback_k).copied().ok_or_else(|| {
                    Error::DiscoveryDegenerate {
                        category: category.to_string(),
                        reason: format!("no valid partition with k={}", fallback_k),
                    }
                })?;
                warn!(
                    category,
                    silhouette = score,
                    threshold = self.config.min_silhouette,
                    "no k met the quality threshold, falling back to k={}",
                    fallback_k
                );
                (fallback_k, score, true)
            }
        };

        let fit = fits.remove(&k).ok_or_else(|| Error::DiscoveryDegenerate {
            category: category.to_string(),
            reason: format!("partition for k={} missing", k),
        })?;

        let groups: Vec<DiscoveredGroup> = fit
            .members()
            .into_iter()
            .map(|members| {
                let standardized: Vec<&[f64]> =
                    members.iter().map(|&i| data[i].as_slice()).collect();
                let standardized_center =
                    mean_vector(&standardized).unwrap_or_else(|| vec![0.0; schema.len()]);
                DiscoveredGroup {
                    center: scaler.inverse_transform(&standardized_center),
                    standardized_center,
                    members,
                }
            })
            .collect();

        let feature_importance = feature_importance(&groups, schema.len());

        debug!(
            category,
            k,
            quality,
            sizes = ?groups.iter().map(DiscoveredGroup::size).collect::<Vec<_>>(),
            "discovery complete"
        );

        Ok(Discovery {
            category: category.to_string(),
            total_applicants: n,
            groups,
            quality,
            degenerate,
            k_scores,
            feature_importance,
            scaler,
        })
    }
}

/// Variance of group means per standardized feature, normalized to sum to 1
fn feature_importance(groups: &[DiscoveredGroup], dim: usize) -> Vec<(usize, f64)> {
    let mut means = Vec::with_capacity(groups.len());
    let mut raw: Vec<(usize, f64)> = (0..dim)
        .map(|j| {
            means.clear();
            means.extend(groups.iter().map(|g| g.standardized_center[j]));
            (j, population_variance(&means))
        })
        .collect();

    let total: f64 = raw.iter().map(|(_, v)| v).sum();
    if total > 0.0 {
        for (_, v) in raw.iter_mut() {
            *v /= total;
        }
    }
    raw.sort_by_key(|&(j, v)| (std::cmp::Reverse(OrderedFloat(v)), j));
    raw
}
