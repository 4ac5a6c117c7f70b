//! Feature schema and query vectors
//!
//! Every applicant record, path center and query shares one ordered list of
//! named numeric features. The schema is validated once at construction and
//! resolves names to positions through a hash map, so scoring code only ever
//! works with plain indices.

use crate::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Well-known feature names produced by the upstream feature converter.
///
/// Labelling, success indicators and the default weight table refer to these.
/// A schema is free to omit any of them; rules for absent features are skipped.
pub mod names {
    pub const SOURCE_UNIVERSITY_TIER: &str = "source_university_tier_score";
    pub const GPA_PERCENTILE: &str = "gpa_percentile";
    pub const MAJOR_MATCHING: &str = "major_matching_score";
    pub const LANGUAGE_SCORE: &str = "language_score_normalized";
    pub const WORK_EXPERIENCE_YEARS: &str = "work_experience_years";
    pub const WORK_RELEVANCE: &str = "work_relevance_score";
    pub const TARGET_UNIVERSITY_TIER: &str = "target_university_tier_score";
    pub const UNIVERSITY_MATCHING: &str = "university_matching_score";
    pub const COMPETITION_INDEX: &str = "competition_index";
    pub const ACADEMIC_STRENGTH: &str = "academic_strength_score";
    pub const COMPREHENSIVE_STRENGTH: &str = "applicant_comprehensive_strength";

    /// The eleven features carried by the standard applicant schema, in order.
    pub const STANDARD: [&str; 11] = [
        SOURCE_UNIVERSITY_TIER,
        GPA_PERCENTILE,
        MAJOR_MATCHING,
        LANGUAGE_SCORE,
        WORK_EXPERIENCE_YEARS,
        WORK_RELEVANCE,
        TARGET_UNIVERSITY_TIER,
        UNIVERSITY_MATCHING,
        COMPETITION_INDEX,
        ACADEMIC_STRENGTH,
        COMPREHENSIVE_STRENGTH,
    ];
}

/// Ordered set of feature names shared by all vectors in the system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    names: Vec<String>,
    index: AHashMap<String, usize>,
}

impl FeatureSchema {
    /// Create a schema from an ordered list of names.
    ///
    /// Names must be non-empty and unique.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(Error::InvalidConfig("feature schema cannot be empty".to_string()));
        }

        let mut index = AHashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("feature {} has an empty name", i)));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(Error::InvalidConfig(format!("duplicate feature name '{}'", name)));
            }
        }

        Ok(Self { names, index })
    }

    /// The standard eleven-feature applicant schema
    pub fn standard() -> Self {
        // STANDARD is non-empty and duplicate-free, so construction cannot fail
        let names: Vec<String> = names::STANDARD.iter().map(|s| s.to_string()).collect();
        let index = names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        Self { names, index }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Fail unless a vector of `actual` length fits this schema
    pub fn check_len(&self, actual: usize, what: &str) -> Result<()> {
        if actual != self.len() {
            return Err(Error::schema_mismatch(format!(
                "{} has {} features, schema expects {}",
                what,
                actual,
                self.len()
            )));
        }
        Ok(())
    }

    /// Fail unless `other` lists the same features in the same order
    pub fn ensure_same(&self, other: &FeatureSchema) -> Result<()> {
        if self.len() != other.len() {
            return Err(Error::schema_mismatch(format!(
                "expected {} features, got {}",
                self.len(),
                other.len()
            )));
        }
        if let Some((i, (a, b))) = self
            .names
            .iter()
            .zip(other.names.iter())
            .enumerate()
            .find(|(_, (a, b))| a != b)
        {
            return Err(Error::schema_mismatch(format!(
                "feature {} is '{}', expected '{}'",
                i, b, a
            )));
        }
        Ok(())
    }
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for FeatureSchema {}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        FeatureSchema::new(names)
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.names
    }
}

/// A per-request applicant vector aligned to a [`FeatureSchema`]
///
/// Individual features may be missing; the matcher decides how to fill them.
/// Non-finite inputs are treated as missing.
#[derive(Debug, Clone)]
pub struct QueryVector {
    schema: Arc<FeatureSchema>,
    values: Vec<Option<f64>>,
}

impl QueryVector {
    pub fn new(schema: Arc<FeatureSchema>, values: Vec<Option<f64>>) -> Result<Self> {
        schema.check_len(values.len(), "query")?;
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Ok(Self { schema, values })
    }

    /// A query with every feature present
    pub fn complete(schema: Arc<FeatureSchema>, values: Vec<f64>) -> Result<Self> {
        Self::new(schema, values.into_iter().map(Some).collect())
    }

    /// Build a query from `(name, value)` pairs; unnamed features are missing.
    ///
    /// Names outside the schema are rejected rather than dropped.
    pub fn from_named<S, I>(schema: Arc<FeatureSchema>, pairs: I) -> Result<Self>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, f64)>,
    {
        let mut values = vec![None; schema.len()];
        for (name, value) in pairs {
            let name = name.as_ref();
            let idx = schema.index_of(name).ok_or_else(|| {
                Error::schema_mismatch(format!("unknown feature '{}'", name))
            })?;
            values[idx] = Some(value).filter(|x| x.is_finite());
        }
        Ok(Self { schema, values })
    }

    #[inline]
    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    #[inline]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Copy of this query with one feature marked missing
    pub fn without(&self, name: &str) -> Result<Self> {
        let idx = self
            .schema
            .index_of(name)
            .ok_or_else(|| Error::schema_mismatch(format!("unknown feature '{}'", name)))?;
        let mut values = self.values.clone();
        values[idx] = None;
        Ok(Self {
            schema: self.schema.clone(),
            values,
        })
    }

    /// Dense values with missing features taken from `defaults`
    pub fn filled(&self, defaults: &[f64]) -> Vec<f64> {
        self.values
            .iter()
            .zip(defaults.iter())
            .map(|(v, d)| v.unwrap_or(*d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lookup() {
        let schema = FeatureSchema::new(["a", "b", "c"]).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.index_of("b"), Some(1));
        assert_eq!(schema.index_of("z"), None);
        assert_eq!(schema.name(2), Some("c"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        assert!(matches!(
            FeatureSchema::new(["a", "b", "a"]),
            Err(Error::InvalidConfig(_))
        ));
        assert!(FeatureSchema::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_standard_schema_indexes_all_names() {
        let schema = FeatureSchema::standard();
        assert_eq!(schema.len(), names::STANDARD.len());
        for (i, name) in names::STANDARD.iter().enumerate() {
            assert_eq!(schema.index_of(name), Some(i));
        }
    }

    #[test]
    fn test_order_mismatch_detected() {
        let a = FeatureSchema::new(["x", "y"]).unwrap();
        let b = FeatureSchema::new(["y", "x"]).unwrap();
        let c = FeatureSchema::new(["x"]).unwrap();
        assert!(a.ensure_same(&a.clone()).is_ok());
        assert!(matches!(a.ensure_same(&b), Err(Error::SchemaMismatch(_))));
        assert!(matches!(a.ensure_same(&c), Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_query_length_validated() {
        let schema = Arc::new(FeatureSchema::new(["a", "b"]).unwrap());
        assert!(QueryVector::complete(schema.clone(), vec![1.0, 2.0]).is_ok());
        assert!(matches!(
            QueryVector::complete(schema, vec![1.0]),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_query_from_named() {
        let schema = Arc::new(FeatureSchema::new(["a", "b", "c"]).unwrap());
        let q = QueryVector::from_named(schema.clone(), [("c", 3.0), ("a", 1.0)]).unwrap();
        assert_eq!(q.get(0), Some(1.0));
        assert_eq!(q.get(1), None);
        assert_eq!(q.missing_count(), 1);
        assert_eq!(q.filled(&[9.0, 8.0, 7.0]), vec![1.0, 8.0, 3.0]);

        assert!(QueryVector::from_named(schema, [("nope", 1.0)]).is_err());
    }

    #[test]
    fn test_non_finite_treated_as_missing() {
        let schema = Arc::new(FeatureSchema::new(["a", "b"]).unwrap());
        let q = QueryVector::complete(schema, vec![f64::NAN, 1.0]).unwrap();
        assert_eq!(q.get(0), None);
    }

    #[test]
    fn test_schema_serde_as_list() {
        let schema = FeatureSchema::new(["a", "b"]).unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
        let parsed: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schema);
        assert!(serde_json::from_str::<FeatureSchema>(r#"["a","a"]"#).is_err());
    }
}
