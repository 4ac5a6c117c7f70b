//! Batch discovery over every category of a dataset.
//!
//! Categories are independent, so they are processed in parallel with each
//! worker writing only its own result slot. Cancellation is checked at
//! category boundaries.

use crate::builder::PathProfileBuilder;
use crate::config::DiscoveryConfig;
use crate::engine::PathDiscoveryEngine;
use pathmatch_core::{CategoryProfile, Dataset, Error, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared flag for best-effort cancellation of a batch run
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Category left out because it is below the clustering threshold
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedCategory {
    pub category: String,
    pub count: usize,
    pub required: usize,
}

/// Category whose discovery or building failed
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryFailure {
    pub category: String,
    pub kind: String,
    pub message: String,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub profiles: BTreeMap<String, CategoryProfile>,
    pub skipped: Vec<SkippedCategory>,
    pub failures: Vec<CategoryFailure>,
    /// Categories never started because the run was cancelled
    pub not_started: Vec<String>,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn total_paths(&self) -> usize {
        self.profiles.values().map(|p| p.paths().len()).sum()
    }
}

enum Outcome {
    Built(CategoryProfile),
    Skipped(SkippedCategory),
    Failed(CategoryFailure),
    NotStarted,
}

/// Discovery followed by profile building for every category
#[derive(Debug, Clone)]
pub struct DiscoveryPipeline {
    engine: PathDiscoveryEngine,
    builder: PathProfileBuilder,
}

impl DiscoveryPipeline {
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        let builder = PathProfileBuilder::new(&config);
        let engine = PathDiscoveryEngine::new(config)?;
        Ok(Self { engine, builder })
    }

    #[inline]
    pub fn engine(&self) -> &PathDiscoveryEngine {
        &self.engine
    }

    /// Discover and build a single category.
    pub fn build_category<R: AsRef<[f64]>>(
        &self,
        dataset: &Dataset,
        category: &str,
        rows: &[R],
    ) -> Result<CategoryProfile> {
        let discovery = self.engine.discover(category, dataset.schema(), rows)?;
        self.builder.build(dataset.schema(), rows, &discovery)
    }

    /// Process every category of `dataset`. Per-category failures are
    /// recorded in the report, never propagated.
    pub fn run(&self, dataset: &Dataset, cancel: &CancellationFlag) -> BatchReport {
        let start = Instant::now();
        let groups: Vec<(&str, Vec<&[f64]>)> = dataset.by_category().into_iter().collect();
        info!(
            categories = groups.len(),
            applicants = dataset.len(),
            "starting path discovery"
        );

        let outcomes: Vec<(String, Outcome)> = groups
            .par_iter()
            .map(|(category, rows)| {
                let category = category.to_string();
                if cancel.is_cancelled() {
                    return (category, Outcome::NotStarted);
                }
                let outcome = match self.build_category(dataset, &category, rows) {
                    Ok(profile) => Outcome::Built(profile),
                    Err(Error::InsufficientHistory {
                        category,
                        count,
                        required,
                    }) => Outcome::Skipped(SkippedCategory {
                        category,
                        count,
                        required,
                    }),
                    Err(e) => Outcome::Failed(CategoryFailure {
                        category: category.clone(),
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    }),
                };
                (category, outcome)
            })
            .collect();

        let mut report = BatchReport::default();
        for (category, outcome) in outcomes {
            match outcome {
                Outcome::Built(profile) => {
                    if profile.summary().degenerate {
                        warn!(
                            category = %category,
                            quality = profile.summary().quality,
                            "category uses the fallback partition"
                        );
                    }
                    report.profiles.insert(category, profile);
                }
                Outcome::Skipped(skipped) => {
                    warn!(
                        category = %skipped.category,
                        count = skipped.count,
                        required = skipped.required,
                        "insufficient history, skipping category"
                    );
                    report.skipped.push(skipped);
                }
                Outcome::Failed(failure) => {
                    warn!(
                        category = %failure.category,
                        kind = %failure.kind,
                        error = %failure.message,
                        "category failed"
                    );
                    report.failures.push(failure);
                }
                Outcome::NotStarted => report.not_started.push(category),
            }
        }
        report.cancelled = cancel.is_cancelled();

        info!(
            built = report.profiles.len(),
            paths = report.total_paths(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            cancelled = report.cancelled,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "path discovery finished"
        );
        report
    }
}
