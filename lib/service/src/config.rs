//! Service configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default.

use pathmatch_core::{Error, Result};
use pathmatch_discovery::DiscoveryConfig;
use pathmatch_similarity::MatchingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Historical dataset used for discovery
    pub data_path: Option<PathBuf>,

    /// Live profile document
    pub profiles_path: PathBuf,

    /// Where replaced profile documents are archived; `None` disables archiving
    pub archive_dir: Option<PathBuf>,

    /// Number of archived generations to keep
    pub keep_archives: usize,

    /// Rebuild from the dataset on open even if profiles exist
    pub force_rebuild: bool,

    pub discovery: DiscoveryConfig,
    pub matching: MatchingConfig,

    /// Upper bound on suggestions returned for an unknown category
    pub max_suggestions: usize,

    /// Results listed as recommendations in a ranking
    pub top_recommendations: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            profiles_path: PathBuf::from("./data/profiles.json"),
            archive_dir: Some(PathBuf::from("./data/archive")),
            keep_archives: 10,
            force_rebuild: false,
            discovery: DiscoveryConfig::default(),
            matching: MatchingConfig::default(),
            max_suggestions: 10,
            top_recommendations: 10,
        }
    }
}

impl ServiceConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.discovery.validate()?;
        self.matching.validate()?;
        if self.max_suggestions == 0 {
            return Err(Error::InvalidConfig("max_suggestions must be > 0".to_string()));
        }
        if self.top_recommendations == 0 {
            return Err(Error::InvalidConfig(
                "top_recommendations must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
