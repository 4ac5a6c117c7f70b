//! Matching engine state machine
//!
//! The engine is either `unloaded` or `ready`. Loading prepares a complete
//! immutable snapshot off to the side and swaps it in with a single pointer
//! store, so requests see either the previous snapshot or the new one and
//! never a partially loaded state.

use crate::config::MatchingConfig;
use crate::distance::rank_suggestions;
use crate::explain::MatchResult;
use crate::matcher::{matcher_for, Matcher};
use crate::prepared::PreparedCategory;
use crate::weights::FeatureWeights;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use pathmatch_core::{CategoryProfile, Error, QueryVector, Result};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Observable engine state
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Unloaded,
    Ready,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Unloaded => "unloaded",
            EngineState::Ready => "ready",
        }
    }
}

/// Immutable set of prepared categories
#[derive(Debug)]
pub struct ProfileSnapshot {
    categories: BTreeMap<String, PreparedCategory>,
    loaded_at: DateTime<Utc>,
    generation: u64,
}

impl ProfileSnapshot {
    pub fn get(&self, category: &str) -> Option<&PreparedCategory> {
        self.categories.get(category)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn categories(&self) -> impl Iterator<Item = &PreparedCategory> {
        self.categories.values()
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

    #[inline]
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Monotonic load counter, starting at 1
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Serves match requests against the current profile snapshot
#[derive(Debug)]
pub struct MatchingEngine {
    config: MatchingConfig,
    weights: FeatureWeights,
    matcher: Box<dyn Matcher>,
    snapshot: RwLock<Option<Arc<ProfileSnapshot>>>,
    generation: AtomicU64,
    max_suggestions: usize,
}

impl MatchingEngine {
    pub fn new(config: MatchingConfig, max_suggestions: usize) -> Result<Self> {
        config.validate()?;
        let weights = config.weights()?;
        let matcher = matcher_for(&config);
        Ok(Self {
            config,
            weights,
            matcher,
            snapshot: RwLock::new(None),
            generation: AtomicU64::new(0),
            max_suggestions,
        })
    }

    #[inline]
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    #[inline]
    pub fn weights(&self) -> &FeatureWeights {
        &self.weights
    }

    pub fn state(&self) -> EngineState {
        if self.snapshot.read().is_some() {
            EngineState::Ready
        } else {
            EngineState::Unloaded
        }
    }

    /// Prepare `profiles` and atomically replace the current snapshot.
    ///
    /// An empty profile set leaves the engine `unloaded`. Two profiles with
    /// the same category name fail with `ProfileCorrupt` and leave the current
    /// snapshot in place.
    pub fn load<I>(&self, profiles: I) -> Result<Option<Arc<ProfileSnapshot>>>
    where
        I: IntoIterator<Item = CategoryProfile>,
    {
        let mut categories: BTreeMap<String, PreparedCategory> = BTreeMap::new();
        for profile in profiles {
            let prepared = PreparedCategory::new(Arc::new(profile), &self.weights);
            match categories.entry(prepared.name().to_string()) {
                Entry::Occupied(e) => {
                    return Err(Error::corrupt(format!("category '{}' loaded twice", e.key())));
                }
                Entry::Vacant(e) => {
                    e.insert(prepared);
                }
            }
        }

        if categories.is_empty() {
            self.unload();
            return Ok(None);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(ProfileSnapshot {
            categories,
            loaded_at: Utc::now(),
            generation,
        });
        let paths: usize = snapshot.categories().map(|c| c.profile().paths().len()).sum();

        *self.snapshot.write() = Some(snapshot.clone());
        info!(
            categories = snapshot.len(),
            paths,
            generation,
            variant = self.matcher.variant().as_str(),
            "profile snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    /// Drop the current snapshot; readers holding it keep it alive.
    pub fn unload(&self) {
        if self.snapshot.write().take().is_some() {
            info!("profile snapshot unloaded");
        }
    }

    /// The current snapshot, or `NotReady` when unloaded
    pub fn snapshot(&self) -> Result<Arc<ProfileSnapshot>> {
        self.snapshot.read().clone().ok_or(Error::NotReady)
    }

    /// Match one query against one category.
    ///
    /// # Errors
    ///
    /// - `NotReady` when no profiles are loaded
    /// - `CategoryNotFound` with ranked suggestions for an unknown category
    /// - `SchemaMismatch` when the query does not fit the category's schema
    pub fn match_query(&self, category: &str, query: &QueryVector) -> Result<MatchResult> {
        let snapshot = self.snapshot()?;
        self.match_in(&snapshot, category, query)
    }

    /// Match against an explicit snapshot, so a batch of requests can share one
    pub fn match_in(
        &self,
        snapshot: &ProfileSnapshot,
        category: &str,
        query: &QueryVector,
    ) -> Result<MatchResult> {
        let prepared = snapshot
            .get(category)
            .ok_or_else(|| self.not_found(snapshot, category))?;
        let result = self.matcher.match_category(prepared, query)?;
        debug!(
            category,
            score = result.score,
            path = %result.matched_path,
            "matched"
        );
        Ok(result)
    }

    /// Loaded category names, sorted
    pub fn categories(&self) -> Vec<String> {
        self.snapshot
            .read()
            .as_ref()
            .map(|s| s.names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn not_found(&self, snapshot: &ProfileSnapshot, category: &str) -> Error {
        Error::CategoryNotFound {
            category: category.to_string(),
            suggestions: rank_suggestions(category, snapshot.names(), self.max_suggestions),
        }
    }
}
