//! # pathmatch Discovery
//!
//! Offline success-path discovery for pathmatch.
//!
//! Each category's historical applicants are standardized, partitioned with
//! seeded k-means++ for every candidate k, and the k with the best silhouette
//! above a quality threshold is kept. The builder then turns the partition
//! into immutable [`pathmatch_core::CategoryProfile`]s.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Dataset   │────>│  Discovery  │────>│   Builder   │
//! │ (by category)│    │ (k, groups) │     │  (profiles) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        │            ┌─────────────┐            │
//!        └───────────>│  Pipeline   │<───────────┘
//!                     │ (rayon, cancel)│
//!                     └─────────────┘
//! ```

pub mod config;
pub mod scaler;
pub mod kmeans;
pub mod silhouette;
pub mod engine;
pub mod labels;
pub mod builder;
pub mod pipeline;

pub use config::DiscoveryConfig;
pub use engine::{DiscoveredGroup, Discovery, PathDiscoveryEngine};
pub use builder::PathProfileBuilder;
pub use pipeline::{BatchReport, CancellationFlag, CategoryFailure, DiscoveryPipeline, SkippedCategory};
