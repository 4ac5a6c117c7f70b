//! # Pathmatch Similarity
//!
//! Scores an applicant against the success paths of a category.
//!
//! ## Features
//!
//! - **Two matchers**: a base cosine-plus-linear matcher and a robust matcher
//!   with fence clipping, robust fill and tiered distribution similarity
//! - **Feature weights**: a default table with per-deployment overrides
//! - **Explainability**: matched path, level band, recommendation and a
//!   score breakdown
//! - **Snapshot loading**: profiles are prepared off to the side and swapped
//!   in atomically
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────┐    ┌──────────────┐
//! │   Profiles   │───>│ PreparedCategory │───>│   Snapshot   │
//! └──────────────┘    └──────────────────┘    └──────────────┘
//!                                                    │
//!   QueryVector ──────────>┌───────────────┐<────────┘
//!                          │    Matcher    │
//!                          │ base / robust │
//!                          └───────────────┘
//!                                  │
//!                          ┌───────────────┐
//!                          │  MatchResult  │
//!                          └───────────────┘
//! ```

pub mod config;
pub mod distance;
pub mod engine;
pub mod explain;
pub mod matcher;
pub mod prepared;
pub mod weights;

#[cfg(test)]
mod fixtures;

pub use config::{LevelThresholds, MatcherVariant, MatchingConfig};
pub use distance::{rank_suggestions, trigram_similarity, ZCurve};
pub use engine::{EngineState, MatchingEngine, ProfileSnapshot};
pub use explain::{recommendation, MatchLevel, MatchResult, RankingStats, ScoreBreakdown};
pub use matcher::{matcher_for, BaseMatcher, Matcher, RobustMatcher};
pub use prepared::PreparedCategory;
pub use weights::{FeatureWeights, DEFAULT_WEIGHTS};
