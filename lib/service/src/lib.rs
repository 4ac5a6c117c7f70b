//! # Pathmatch Service
//!
//! Orchestrates the pipeline end to end:
//!
//! ```text
//! Dataset ──> DiscoveryPipeline ──> ProfileStore ──> MatchingEngine
//!                                   (persist,        (atomic snapshot)
//!                                    archive)              │
//!                        match / rank / describe / status <┘
//! ```
//!
//! [`MatchingService::open`] loads persisted profiles when they exist and
//! only runs discovery when no document is present or a rebuild is forced.

pub mod config;
pub mod service;

pub use config::ServiceConfig;
pub use service::{
    CategoryDescription, MatchingService, PathDescription, RankingFailure, RankingReport,
    RebuildReport, SystemStatus,
};
