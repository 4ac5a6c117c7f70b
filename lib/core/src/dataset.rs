use crate::{Error, FeatureSchema, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// One historical applicant with a successful outcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicantRecord {
    pub id: String,
    pub category: String,
    pub features: Vec<f64>,
}

impl ApplicantRecord {
    pub fn new(id: impl Into<String>, category: impl Into<String>, features: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            features,
        }
    }
}

/// On-disk layout of a historical dataset
#[derive(Debug, Serialize, Deserialize)]
struct DatasetDocument {
    feature_names: Vec<String>,
    records: Vec<ApplicantRecord>,
}

/// Validated, read-only historical applicant set
///
/// Every record has exactly one finite value per schema feature.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Arc<FeatureSchema>,
    records: Vec<ApplicantRecord>,
}

impl Dataset {
    pub fn new(schema: Arc<FeatureSchema>, records: Vec<ApplicantRecord>) -> Result<Self> {
        for record in &records {
            schema.check_len(record.features.len(), &format!("record '{}'", record.id))?;
            if let Some(i) = record.features.iter().position(|v| !v.is_finite()) {
                return Err(Error::schema_mismatch(format!(
                    "record '{}' has a non-finite value for '{}'",
                    record.id,
                    schema.name(i).unwrap_or("?")
                )));
            }
        }
        Ok(Self { schema, records })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let doc: DatasetDocument = serde_json::from_reader(reader)?;
        let schema = Arc::new(FeatureSchema::new(doc.feature_names)?);
        Self::new(schema, doc.records)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn to_writer<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let doc = DatasetDocument {
            feature_names: self.schema.names().to_vec(),
            records: self.records.clone(),
        };
        serde_json::to_writer(writer, &doc)?;
        Ok(())
    }

    #[inline]
    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    #[inline]
    pub fn records(&self) -> &[ApplicantRecord] {
        &self.records
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature rows grouped by category, in category-name order
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&[f64]>> {
        let mut groups: BTreeMap<&str, Vec<&[f64]>> = BTreeMap::new();
        for record in &self.records {
            groups
                .entry(record.category.as_str())
                .or_default()
                .push(record.features.as_slice());
        }
        groups
    }

    /// Applicant count per category
    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.category.as_str()).or_default() += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<FeatureSchema> {
        Arc::new(FeatureSchema::new(["a", "b"]).unwrap())
    }

    #[test]
    fn test_dataset_validates_length() {
        let records = vec![ApplicantRecord::new("1", "x", vec![1.0])];
        assert!(matches!(
            Dataset::new(schema(), records),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_dataset_rejects_non_finite() {
        let records = vec![ApplicantRecord::new("1", "x", vec![1.0, f64::INFINITY])];
        assert!(Dataset::new(schema(), records).is_err());
    }

    #[test]
    fn test_grouping() {
        let records = vec![
            ApplicantRecord::new("1", "beta", vec![1.0, 2.0]),
            ApplicantRecord::new("2", "alpha", vec![3.0, 4.0]),
            ApplicantRecord::new("3", "beta", vec![5.0, 6.0]),
        ];
        let dataset = Dataset::new(schema(), records).unwrap();
        let groups = dataset.by_category();
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["alpha", "beta"]);
        assert_eq!(groups["beta"].len(), 2);
        assert_eq!(dataset.category_counts()["alpha"], 1);
    }

    #[test]
    fn test_document_roundtrip_through_file() {
        let records = vec![ApplicantRecord::new("1", "x", vec![1.0, 2.0])];
        let dataset = Dataset::new(schema(), records).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        dataset
            .to_writer(std::fs::File::create(&path).unwrap())
            .unwrap();

        let loaded = Dataset::from_path(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.schema().names(), dataset.schema().names());
        assert_eq!(loaded.records()[0], dataset.records()[0]);
    }
}
