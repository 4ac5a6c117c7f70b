//! # pathmatch Core
//!
//! Core library for the pathmatch success-path engine.
//!
//! This crate provides the fundamental data structures shared by discovery,
//! matching and storage:
//!
//! - [`FeatureSchema`] - Ordered, validated feature names with O(1) lookup
//! - [`QueryVector`] - A per-request applicant vector with optional features
//! - [`FeatureStats`] / [`RobustStats`] - Descriptive and outlier-robust statistics
//! - [`Dataset`] - Historical applicant records grouped by category
//! - [`SuccessPath`] / [`CategoryProfile`] - Immutable products of discovery
//!
//! ## Example
//!
//! ```rust
//! use pathmatch_core::{FeatureSchema, QueryVector};
//! use std::sync::Arc;
//!
//! let schema = Arc::new(FeatureSchema::new(["gpa_percentile", "language_score_normalized"]).unwrap());
//! let query = QueryVector::from_named(schema, [("gpa_percentile", 82.0)]).unwrap();
//! assert_eq!(query.missing_count(), 1);
//! ```

pub mod error;
pub mod schema;
pub mod vector;
pub mod stats;
pub mod dataset;
pub mod profile;

pub use error::{Error, Result};
pub use schema::{names, FeatureSchema, QueryVector};
pub use stats::{FeatureStats, RobustStats};
pub use dataset::{ApplicantRecord, Dataset};
pub use profile::{CategoryProfile, CategorySummary, PathParts, SuccessPath};
