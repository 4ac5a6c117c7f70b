use crate::persistence::ProfileDocument;
use crate::snapshot::{SnapshotDescription, SnapshotManager};
use anyhow::Context;
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use pathmatch_core::{CategoryProfile, Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Profiles read back from the store
#[derive(Debug)]
pub struct LoadedProfiles {
    pub generated_at: DateTime<Utc>,
    pub profiles: Vec<CategoryProfile>,
}

/// What a save did
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub path: PathBuf,
    pub categories: usize,
    /// Archive of the document this save replaced
    pub archived: Option<SnapshotDescription>,
}

/// Owns the live profile document and its archived generations
pub struct ProfileStore {
    path: PathBuf,
    snapshots: Option<SnapshotManager>,
    keep_archives: Option<usize>,
}

impl ProfileStore {
    /// A store for the document at `path`, archiving replaced generations
    /// under `archive_dir` when one is given
    pub fn new<P: AsRef<Path>>(path: P, archive_dir: Option<&Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshots = archive_dir
            .map(SnapshotManager::new)
            .transpose()
            .map_err(storage_error)?;
        Ok(Self {
            path,
            snapshots,
            keep_archives: None,
        })
    }

    /// Limit the number of archived generations kept
    pub fn with_retention(mut self, keep: usize) -> Self {
        self.keep_archives = Some(keep);
        self
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    #[inline]
    pub fn snapshots(&self) -> Option<&SnapshotManager> {
        self.snapshots.as_ref()
    }

    /// Read and validate the live document
    pub fn load(&self) -> Result<LoadedProfiles> {
        let bytes = std::fs::read(&self.path)?;
        let document = ProfileDocument::from_slice(&bytes)?;
        let generated_at = document.generated_at;
        let profiles = document.into_profiles()?;
        info!(
            path = %self.path.display(),
            categories = profiles.len(),
            %generated_at,
            "profile document loaded"
        );
        Ok(LoadedProfiles {
            generated_at,
            profiles,
        })
    }

    /// Replace the live document with `profiles`.
    ///
    /// The previous document, if any, is archived first. The new document is
    /// written to a temporary file and renamed into place, so readers see
    /// either the old or the new generation.
    pub fn save(&self, profiles: &[CategoryProfile]) -> Result<SaveOutcome> {
        let document = ProfileDocument::from_profiles(profiles);
        let bytes = document.to_vec()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let archived = match (&self.snapshots, self.exists()) {
            (Some(snapshots), true) => {
                let desc = snapshots
                    .create_snapshot(&self.path)
                    .map_err(storage_error)?;
                if let Some(keep) = self.keep_archives {
                    if let Err(e) = snapshots.prune(keep) {
                        warn!(error = %e, "failed to prune archived profile documents");
                    }
                }
                Some(desc)
            }
            _ => None,
        };

        AtomicFile::new(&self.path, AllowOverwrite)
            .write(|f| f.write_all(&bytes))
            .with_context(|| format!("writing {}", self.path.display()))
            .map_err(storage_error)?;

        info!(
            path = %self.path.display(),
            categories = document.len(),
            bytes = bytes.len(),
            archived = archived.as_ref().map(|a| a.name.as_str()).unwrap_or("-"),
            "profile document saved"
        );
        Ok(SaveOutcome {
            path: self.path.clone(),
            categories: document.len(),
            archived,
        })
    }
}

fn storage_error(e: anyhow::Error) -> Error {
    match e.downcast::<std::io::Error>() {
        Ok(io) => Error::Io(io),
        Err(other) => Error::Io(std::io::Error::other(format!("{:#}", other))),
    }
}
