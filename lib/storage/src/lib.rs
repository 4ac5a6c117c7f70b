//! Profile persistence for pathmatch
//!
//! A single versioned JSON document holds every category profile. Saves
//! replace it atomically and archive the previous generation as a
//! gzip-compressed, checksummed snapshot.

pub mod manager;
pub mod persistence;
pub mod snapshot;

pub use manager::{LoadedProfiles, ProfileStore, SaveOutcome};
pub use persistence::{CategoryDocument, PathDocument, ProfileDocument, DOCUMENT_VERSION};
pub use snapshot::{SnapshotDescription, SnapshotManager};
