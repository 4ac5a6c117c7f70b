//! Matching service
//!
//! Wires discovery, profile persistence and the matching engine together
//! and exposes the request/response contract: `match`, `rank`, `describe`
//! and `status`. After initialization all request-time state is an
//! immutable snapshot; `rebuild` is the only writer and is serialized.

use crate::config::ServiceConfig;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use pathmatch_core::{
    CategoryProfile, CategorySummary, Dataset, Error, FeatureSchema, QueryVector, Result,
};
use pathmatch_discovery::{CancellationFlag, CategoryFailure, DiscoveryPipeline, SkippedCategory};
use pathmatch_similarity::{
    EngineState, MatchResult, MatcherVariant, MatchingEngine, ProfileSnapshot, RankingStats,
};
use pathmatch_storage::{ProfileStore, SnapshotDescription};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A category that could not be scored during ranking
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankingFailure {
    pub category: String,
    pub kind: String,
    pub message: String,
}

/// Ranked results for one query over many categories
#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    /// All successful results, best first
    pub results: Vec<MatchResult>,
    pub failures: Vec<RankingFailure>,
    /// The first `top_recommendations` results
    pub recommendations: Vec<MatchResult>,
    pub statistics: RankingStats,
}

/// Per-path metadata for introspection
#[derive(Debug, Clone, Serialize)]
pub struct PathDescription {
    pub id: usize,
    pub key: String,
    pub label: String,
    pub sample_size: usize,
    pub coverage: f64,
    pub representativeness: f64,
    pub success_indicators: BTreeMap<String, f64>,
    pub key_features: Vec<String>,
    /// Center in original units, by feature name
    pub center: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDescription {
    pub category: String,
    pub feature_names: Vec<String>,
    pub summary: CategorySummary,
    pub paths: Vec<PathDescription>,
}

/// Aggregate view of the loaded profiles
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub state: EngineState,
    pub variant: MatcherVariant,
    pub categories: usize,
    pub total_paths: usize,
    pub total_applicants: usize,
    pub average_representativeness: f64,
    pub average_paths_per_category: f64,
    pub loaded_at: Option<DateTime<Utc>>,
    pub generation: u64,
    pub profiles_path: PathBuf,
}

/// Outcome of a rebuild
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    pub built: Vec<String>,
    pub total_paths: usize,
    pub skipped: Vec<SkippedCategory>,
    pub failures: Vec<CategoryFailure>,
    /// False when nothing was built and the previous profiles stay live
    pub applied: bool,
    pub archived: Option<SnapshotDescription>,
    pub elapsed_ms: u64,
}

pub struct MatchingService {
    config: ServiceConfig,
    pipeline: DiscoveryPipeline,
    engine: MatchingEngine,
    store: ProfileStore,
    rebuild_lock: Mutex<()>,
    last_rebuild: RwLock<Option<RebuildReport>>,
}

impl MatchingService {
    /// Create an `unloaded` service
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        let pipeline = DiscoveryPipeline::new(config.discovery.clone())?;
        let engine = MatchingEngine::new(config.matching.clone(), config.max_suggestions)?;
        let store = ProfileStore::new(&config.profiles_path, config.archive_dir.as_deref())?
            .with_retention(config.keep_archives);
        Ok(Self {
            config,
            pipeline,
            engine,
            store,
            rebuild_lock: Mutex::new(()),
            last_rebuild: RwLock::new(None),
        })
    }

    /// Create a service and bring it to `ready`.
    ///
    /// Persisted profiles are loaded directly unless `force_rebuild` is set;
    /// otherwise the configured dataset is discovered and built. A corrupt
    /// document fails the whole open.
    pub fn open(config: ServiceConfig) -> Result<Self> {
        let service = Self::new(config)?;

        if !service.config.force_rebuild && service.store.exists() {
            service.load_persisted()?;
        } else if service.config.data_path.is_some() {
            let report = service.rebuild_from_data(&CancellationFlag::new())?;
            if !report.applied {
                warn!("no category could be built, service stays unloaded");
            }
        } else if service.config.force_rebuild {
            return Err(Error::InvalidConfig(
                "force_rebuild requires data_path".to_string(),
            ));
        } else {
            warn!(
                path = %service.config.profiles_path.display(),
                "no profile document and no dataset configured, service stays unloaded"
            );
        }
        Ok(service)
    }

    #[inline]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[inline]
    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    #[inline]
    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Load the persisted document into the engine
    pub fn load_persisted(&self) -> Result<usize> {
        let _guard = self.rebuild_lock.lock();
        let loaded = self.store.load()?;
        let count = loaded.profiles.len();
        self.engine.load(loaded.profiles)?;
        Ok(count)
    }

    /// Rebuild from the configured dataset
    pub fn rebuild_from_data(&self, cancel: &CancellationFlag) -> Result<RebuildReport> {
        let path = self
            .config
            .data_path
            .as_ref()
            .ok_or_else(|| Error::InvalidConfig("data_path is not configured".to_string()))?;
        let dataset = Dataset::from_path(path)?;
        info!(path = %path.display(), records = dataset.len(), "dataset loaded");
        self.rebuild(&dataset, cancel)
    }

    /// Discover and build every category of `dataset`, persist the result
    /// and swap it in.
    ///
    /// Rebuilds are serialized. Concurrent requests keep reading the previous
    /// snapshot until the swap. A cancelled run changes nothing.
    pub fn rebuild(&self, dataset: &Dataset, cancel: &CancellationFlag) -> Result<RebuildReport> {
        let _guard = self.rebuild_lock.lock();
        let start = Instant::now();

        let batch = self.pipeline.run(dataset, cancel);
        if batch.cancelled {
            warn!(
                built = batch.profiles.len(),
                not_started = batch.not_started.len(),
                "rebuild cancelled, keeping current profiles"
            );
            return Err(Error::Cancelled);
        }

        let total_paths = batch.total_paths();
        let built: Vec<String> = batch.profiles.keys().cloned().collect();
        let profiles: Vec<CategoryProfile> = batch.profiles.into_values().collect();

        let (applied, archived) = if profiles.is_empty() {
            (false, None)
        } else {
            let outcome = self.store.save(&profiles)?;
            self.engine.load(profiles)?;
            (true, outcome.archived)
        };

        let report = RebuildReport {
            built,
            total_paths,
            skipped: batch.skipped,
            failures: batch.failures,
            applied,
            archived,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            built = report.built.len(),
            paths = report.total_paths,
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            applied = report.applied,
            elapsed_ms = report.elapsed_ms,
            "rebuild finished"
        );
        *self.last_rebuild.write() = Some(report.clone());
        Ok(report)
    }

    /// Report of the most recent rebuild in this process
    pub fn last_rebuild(&self) -> Option<RebuildReport> {
        self.last_rebuild.read().clone()
    }

    /// Score `query` against one category
    pub fn match_query(&self, category: &str, query: &QueryVector) -> Result<MatchResult> {
        self.engine.match_query(category, query)
    }

    /// Score `query` against `categories` (all loaded categories when `None`)
    /// and order the results by score.
    ///
    /// Categories that fail are recorded in the report and never abort the
    /// ranking; only an unloaded engine is a top-level error.
    pub fn rank(&self, query: &QueryVector, categories: Option<&[String]>) -> Result<RankingReport> {
        let snapshot = self.engine.snapshot()?;
        let targets: Vec<String> = match categories {
            Some(list) => list.to_vec(),
            None => snapshot.names().map(str::to_string).collect(),
        };

        let mut results = Vec::with_capacity(targets.len());
        let mut failures = Vec::new();
        for category in &targets {
            match self.engine.match_in(&snapshot, category, query) {
                Ok(result) => results.push(result),
                Err(e) => {
                    debug!(category = %category, error = %e, "category skipped in ranking");
                    failures.push(RankingFailure {
                        category: category.clone(),
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        results.sort_by(compare_results);
        let statistics = RankingStats::from_results(&results, failures.len());
        let recommendations = results
            .iter()
            .take(self.config.top_recommendations)
            .cloned()
            .collect();

        info!(
            requested = targets.len(),
            evaluated = statistics.evaluated,
            failed = statistics.failed,
            "ranking complete"
        );
        Ok(RankingReport {
            results,
            failures,
            recommendations,
            statistics,
        })
    }

    /// Summary and per-path metadata of one category
    pub fn describe(&self, category: &str) -> Result<CategoryDescription> {
        let snapshot = self.engine.snapshot()?;
        let prepared = snapshot
            .get(category)
            .ok_or_else(|| self.engine.not_found(&snapshot, category))?;
        Ok(describe_profile(prepared.profile()))
    }

    pub fn status(&self) -> SystemStatus {
        let snapshot = self.engine.snapshot().ok();
        let mut status = SystemStatus {
            state: self.engine.state(),
            variant: self.config.matching.variant,
            categories: 0,
            total_paths: 0,
            total_applicants: 0,
            average_representativeness: 0.0,
            average_paths_per_category: 0.0,
            loaded_at: None,
            generation: 0,
            profiles_path: self.config.profiles_path.clone(),
        };
        let Some(snapshot) = snapshot else {
            return status;
        };

        let mut representativeness = 0.0;
        for category in snapshot.categories() {
            let profile = category.profile();
            status.total_paths += profile.paths().len();
            status.total_applicants += profile.summary().total_applicants;
            representativeness += profile
                .paths()
                .iter()
                .map(|p| p.representativeness())
                .sum::<f64>();
        }
        status.state = EngineState::Ready;
        status.categories = snapshot.len();
        status.loaded_at = Some(snapshot.loaded_at());
        status.generation = snapshot.generation();
        if status.total_paths > 0 {
            status.average_representativeness = representativeness / status.total_paths as f64;
        }
        if status.categories > 0 {
            status.average_paths_per_category =
                status.total_paths as f64 / status.categories as f64;
        }
        status
    }

    /// Loaded category names, sorted
    pub fn categories(&self) -> Vec<String> {
        self.engine.categories()
    }

    /// Feature schema of a loaded category, for building queries
    pub fn schema(&self, category: &str) -> Result<Arc<FeatureSchema>> {
        let snapshot = self.engine.snapshot()?;
        schema_of(&snapshot, category).ok_or_else(|| self.engine.not_found(&snapshot, category))
    }

    /// Schema shared by the first loaded category
    pub fn default_schema(&self) -> Result<Arc<FeatureSchema>> {
        let snapshot = self.engine.snapshot()?;
        let schema = snapshot.categories().next().map(|c| c.schema().clone());
        schema.ok_or(Error::NotReady)
    }
}

fn schema_of(snapshot: &ProfileSnapshot, category: &str) -> Option<Arc<FeatureSchema>> {
    snapshot.get(category).map(|c| c.schema().clone())
}

/// Descending score, then confidence, then category name
fn compare_results(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.category.cmp(&b.category))
}

fn describe_profile(profile: &CategoryProfile) -> CategoryDescription {
    let names = profile.schema().names();
    let paths = profile
        .paths()
        .iter()
        .map(|p| PathDescription {
            id: p.id(),
            key: p.key(),
            label: p.label().to_string(),
            sample_size: p.size(),
            coverage: p.coverage(),
            representativeness: p.representativeness(),
            success_indicators: p.success_indicators().clone(),
            key_features: p.key_features().to_vec(),
            center: names.iter().cloned().zip(p.center().iter().copied()).collect(),
        })
        .collect();
    CategoryDescription {
        category: profile.name().to_string(),
        feature_names: names.to_vec(),
        summary: profile.summary().clone(),
        paths,
    }
}
