//! Versioned profile document
//!
//! The on-disk form of a set of category profiles. Serialization is plain
//! JSON; loading validates everything the matchers rely on and fails the
//! whole document on the first problem.

use chrono::{DateTime, Utc};
use pathmatch_core::profile::PathParts;
use pathmatch_core::{
    CategoryProfile, CategorySummary, Error, FeatureSchema, FeatureStats, Result, RobustStats,
    SuccessPath,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Only supported document version
pub const DOCUMENT_VERSION: u32 = 1;

const PATH_KEY_PREFIX: &str = "path_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileDocument {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub categories: BTreeMap<String, CategoryDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDocument {
    pub feature_names: Vec<String>,
    pub summary: CategorySummary,
    pub feature_stats: BTreeMap<String, RobustStats>,
    pub paths: BTreeMap<String, PathDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathDocument {
    pub label: String,
    pub sample_size: usize,
    pub coverage: f64,
    pub representativeness: f64,
    pub center: Vec<f64>,
    pub per_feature_stats: BTreeMap<String, FeatureStats>,
    #[serde(default)]
    pub success_indicators: BTreeMap<String, f64>,
    #[serde(default)]
    pub key_features: Vec<String>,
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

impl ProfileDocument {
    /// Snapshot `profiles` into a document stamped with the current time
    pub fn from_profiles<'a, I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = &'a CategoryProfile>,
    {
        let categories = profiles
            .into_iter()
            .map(|p| (p.name().to_string(), CategoryDocument::from_profile(p)))
            .collect();
        Self {
            version: DOCUMENT_VERSION,
            generated_at: Utc::now(),
            categories,
        }
    }

    /// Parse and validate a document.
    ///
    /// Any malformed content, including non-finite numbers (which JSON can
    /// only carry as `null`), is reported as `ProfileCorrupt`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let header: VersionHeader = serde_json::from_slice(bytes)
            .map_err(|e| Error::corrupt(format!("unreadable document: {}", e)))?;
        if header.version != DOCUMENT_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported document version {}, expected {}",
                header.version, DOCUMENT_VERSION
            )));
        }
        serde_json::from_slice(bytes).map_err(|e| Error::corrupt(e.to_string()))
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Convert into validated profiles.
    ///
    /// Categories with identical feature lists share one schema instance.
    pub fn into_profiles(self) -> Result<Vec<CategoryProfile>> {
        if self.version != DOCUMENT_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported document version {}",
                self.version
            )));
        }

        let mut schemas: Vec<Arc<FeatureSchema>> = Vec::new();
        self.categories
            .into_iter()
            .map(|(name, doc)| {
                let schema = match schemas.iter().find(|s| s.names() == doc.feature_names.as_slice())
                {
                    Some(s) => s.clone(),
                    None => {
                        let s = Arc::new(
                            FeatureSchema::new(doc.feature_names.clone())
                                .map_err(|e| Error::corrupt(format!("category '{}': {}", name, e)))?,
                        );
                        schemas.push(s.clone());
                        s
                    }
                };
                doc.into_profile(&name, schema)
            })
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl CategoryDocument {
    pub fn from_profile(profile: &CategoryProfile) -> Self {
        let names = profile.schema().names();
        let by_name = |stats: &[FeatureStats]| -> BTreeMap<String, FeatureStats> {
            names.iter().cloned().zip(stats.iter().copied()).collect()
        };

        let paths = profile
            .paths()
            .iter()
            .map(|p| {
                (
                    p.key(),
                    PathDocument {
                        label: p.label().to_string(),
                        sample_size: p.size(),
                        coverage: p.coverage(),
                        representativeness: p.representativeness(),
                        center: p.center().to_vec(),
                        per_feature_stats: by_name(p.per_feature_stats()),
                        success_indicators: p.success_indicators().clone(),
                        key_features: p.key_features().to_vec(),
                    },
                )
            })
            .collect();

        Self {
            feature_names: names.to_vec(),
            summary: profile.summary().clone(),
            feature_stats: names
                .iter()
                .cloned()
                .zip(profile.feature_stats().iter().copied())
                .collect(),
            paths,
        }
    }

    fn into_profile(self, name: &str, schema: Arc<FeatureSchema>) -> Result<CategoryProfile> {
        let ctx = |msg: String| Error::corrupt(format!("category '{}': {}", name, msg));

        let feature_stats = ordered(&schema, self.feature_stats, "feature_stats").map_err(ctx)?;

        let mut keyed = self
            .paths
            .into_iter()
            .map(|(key, doc)| Ok((parse_path_key(&key).map_err(ctx)?, key, doc)))
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by_key(|(id, _, _)| *id);
        for (expected, (id, key, _)) in keyed.iter().enumerate() {
            if *id != expected {
                return Err(ctx(format!("path ids are not contiguous at '{}'", key)));
            }
        }

        let paths = keyed
            .into_iter()
            .map(|(id, key, doc)| {
                let per_feature_stats = ordered(&schema, doc.per_feature_stats, &key).map_err(ctx)?;
                let parts = PathParts {
                    label: doc.label,
                    size: doc.sample_size,
                    coverage: doc.coverage,
                    representativeness: doc.representativeness,
                    center: doc.center,
                    per_feature_stats,
                    success_indicators: doc.success_indicators,
                    key_features: doc.key_features,
                };
                SuccessPath::new(id, &schema, parts).map_err(|e| match e {
                    Error::ProfileCorrupt(msg) => ctx(msg),
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        CategoryProfile::new(name, schema, self.summary, feature_stats, paths)
    }
}

/// Reorder a name-keyed statistics map into schema order
fn ordered<T: Copy>(
    schema: &FeatureSchema,
    mut by_name: BTreeMap<String, T>,
    what: &str,
) -> std::result::Result<Vec<T>, String> {
    let values = schema
        .names()
        .iter()
        .map(|n| {
            by_name
                .remove(n)
                .ok_or_else(|| format!("{} is missing statistics for '{}'", what, n))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if let Some(extra) = by_name.keys().next() {
        return Err(format!("{} has statistics for unknown feature '{}'", what, extra));
    }
    Ok(values)
}

fn parse_path_key(key: &str) -> std::result::Result<usize, String> {
    key.strip_prefix(PATH_KEY_PREFIX)
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| format!("invalid path key '{}'", key))
}
