//! # pathmatch
//!
//! Discovers the distinct "success paths" in each target category's
//! historical applicant population and scores new applicants against them.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! pathmatch --config pathmatch.json build
//! pathmatch --config pathmatch.json match "computer science" --query applicant.json
//! pathmatch --config pathmatch.json rank --query applicant.json
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use pathmatch::prelude::*;
//!
//! let config = ServiceConfig::from_file("pathmatch.json")?;
//! let service = MatchingService::open(config)?;
//!
//! let schema = service.schema("computer science")?;
//! let query = QueryVector::from_named(
//!     schema,
//!     [("gpa_percentile", 88.0), ("language_score_normalized", 7.5)],
//! )?;
//! let result = service.match_query("computer science", &query)?;
//! println!("{} ({}) via {}", result.score, result.level, result.matched_path);
//! # Ok::<(), pathmatch::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! - `pathmatch-core` - schema, query vectors, statistics, profile types, errors
//! - `pathmatch-discovery` - standardization, k-means++, silhouette, profile building
//! - `pathmatch-similarity` - feature weights, base and robust matchers, engine
//! - `pathmatch-storage` - versioned profile document and archived generations
//! - `pathmatch-service` - orchestration and the match/rank/describe/status contract

// Re-export core types
pub use pathmatch_core::{
    names, ApplicantRecord, CategoryProfile, CategorySummary, Dataset, Error, FeatureSchema,
    FeatureStats, QueryVector, Result, RobustStats, SuccessPath,
};

// Re-export discovery
pub use pathmatch_discovery::{
    BatchReport, CancellationFlag, DiscoveryConfig, DiscoveryPipeline, PathDiscoveryEngine,
    PathProfileBuilder,
};

// Re-export matching
pub use pathmatch_similarity::{
    EngineState, FeatureWeights, MatchLevel, MatchResult, MatcherVariant, MatchingConfig,
    MatchingEngine, RankingStats, ScoreBreakdown,
};

// Re-export storage
pub use pathmatch_storage::{ProfileDocument, ProfileStore, SnapshotManager};

// Re-export service
pub use pathmatch_service::{
    CategoryDescription, MatchingService, RankingReport, RebuildReport, ServiceConfig,
    SystemStatus,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CancellationFlag, CategoryProfile, Dataset, Error, FeatureSchema, MatchLevel,
        MatchResult, MatchingService, QueryVector, Result, ServiceConfig,
    };
}
