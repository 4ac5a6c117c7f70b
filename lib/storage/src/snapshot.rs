// Archived generations of the profile document
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SNAPSHOT_EXTENSION: &str = "snapshot";
const CHECKSUM_EXTENSION: &str = "sha256";
const SNAPSHOT_PREFIX: &str = "profiles";

/// Snapshot description for status and CLI output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotDescription {
    pub name: String,
    pub creation_time: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Gzip-compressed, checksummed copies of replaced profile documents
pub struct SnapshotManager {
    snapshot_dir: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_dir: P) -> Result<Self> {
        let snapshot_dir = snapshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&snapshot_dir)
            .with_context(|| format!("creating archive directory {}", snapshot_dir.display()))?;
        Ok(Self { snapshot_dir })
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.snapshot_dir
    }

    /// Generate a unique snapshot filename for `now`
    fn generate_snapshot_name(&self, now: DateTime<Utc>) -> String {
        let stem = format!("{}-{}", SNAPSHOT_PREFIX, now.format("%Y-%m-%d-%H-%M-%S-%3f"));
        let mut name = format!("{}.{}", stem, SNAPSHOT_EXTENSION);
        let mut n = 1;
        while self.snapshot_dir.join(&name).exists() {
            name = format!("{}-{}.{}", stem, n, SNAPSHOT_EXTENSION);
            n += 1;
        }
        name
    }

    /// Archive the document at `source`
    pub fn create_snapshot(&self, source: &Path) -> Result<SnapshotDescription> {
        let data = fs::read(source)
            .with_context(|| format!("reading {} for archiving", source.display()))?;
        let now = Utc::now();
        let snapshot_name = self.generate_snapshot_name(now);
        let snapshot_path = self.snapshot_dir.join(&snapshot_name);

        let file = File::create(&snapshot_path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(&data)?;
        encoder.finish()?.flush()?;

        let checksum = checksum_file(&snapshot_path)?;
        fs::write(checksum_path(&snapshot_path), &checksum)?;

        let size = fs::metadata(&snapshot_path)?.len();
        info!(snapshot = %snapshot_name, size, "archived previous profile document");

        Ok(SnapshotDescription {
            name: snapshot_name,
            creation_time: Some(now.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            size,
            checksum: Some(checksum),
        })
    }

    /// List archived snapshots, newest first
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotDescription>> {
        if !self.snapshot_dir.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.snapshot_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let metadata = fs::metadata(&path)?;
            let creation_time = metadata
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).format("%Y-%m-%dT%H:%M:%SZ").to_string());
            let checksum = fs::read_to_string(checksum_path(&path))
                .ok()
                .map(|s| s.trim().to_string());

            snapshots.push(SnapshotDescription {
                name: name.to_string(),
                creation_time,
                size: metadata.len(),
                checksum,
            });
        }

        // Names embed the timestamp
        snapshots.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(snapshots)
    }

    /// Decompress a snapshot, verifying its recorded checksum
    pub fn load_snapshot(&self, snapshot_name: &str) -> Result<Vec<u8>> {
        let snapshot_path = self.snapshot_dir.join(snapshot_name);
        if !snapshot_path.exists() {
            return Err(anyhow!("Snapshot '{}' not found", snapshot_name));
        }

        if let Ok(expected) = fs::read_to_string(checksum_path(&snapshot_path)) {
            let actual = checksum_file(&snapshot_path)?;
            if actual != expected.trim() {
                return Err(anyhow!(
                    "Checksum mismatch for '{}': expected {}, got {}",
                    snapshot_name,
                    expected.trim(),
                    actual
                ));
            }
        }

        let file = File::open(&snapshot_path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut data = Vec::new();
        decoder
            .read_to_end(&mut data)
            .with_context(|| format!("decompressing {}", snapshot_name))?;
        debug!(snapshot = snapshot_name, bytes = data.len(), "snapshot loaded");
        Ok(data)
    }

    /// Delete a snapshot and its checksum
    pub fn delete_snapshot(&self, snapshot_name: &str) -> Result<bool> {
        let snapshot_path = self.snapshot_dir.join(snapshot_name);
        if !snapshot_path.exists() {
            return Ok(false);
        }
        fs::remove_file(&snapshot_path)?;
        let sidecar = checksum_path(&snapshot_path);
        if sidecar.exists() {
            fs::remove_file(sidecar)?;
        }
        Ok(true)
    }

    /// Keep the newest `keep` snapshots, deleting the rest
    pub fn prune(&self, keep: usize) -> Result<usize> {
        let snapshots = self.list_snapshots()?;
        let mut removed = 0;
        for s in snapshots.iter().skip(keep) {
            if self.delete_snapshot(&s.name)? {
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, keep, "pruned archived profile documents");
        }
        Ok(removed)
    }
}

fn checksum_path(snapshot_path: &Path) -> PathBuf {
    snapshot_path.with_extension(format!("{}.{}", SNAPSHOT_EXTENSION, CHECKSUM_EXTENSION))
}

fn checksum_file(path: &Path) -> Result<String> {
    let data = fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_load_snapshot() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("profiles.json");
        fs::write(&source, br#"{"version":1}"#).unwrap();

        let manager = SnapshotManager::new(dir.path().join("archive")).unwrap();
        let desc = manager.create_snapshot(&source).unwrap();
        assert!(desc.name.starts_with("profiles-"));
        assert_eq!(desc.checksum.as_ref().map(String::len), Some(64));

        let listed = manager.list_snapshots().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].checksum, desc.checksum);

        let data = manager.load_snapshot(&desc.name).unwrap();
        assert_eq!(data, br#"{"version":1}"#);
    }

    #[test]
    fn test_names_are_unique_and_ordered() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("profiles.json");
        fs::write(&source, b"{}").unwrap();
        let manager = SnapshotManager::new(dir.path().join("archive")).unwrap();

        let first = manager.create_snapshot(&source).unwrap();
        let second = manager.create_snapshot(&source).unwrap();
        assert_ne!(first.name, second.name);
        assert_eq!(manager.list_snapshots().unwrap().len(), 2);
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("profiles.json");
        fs::write(&source, b"{}").unwrap();
        let manager = SnapshotManager::new(dir.path()).unwrap();
        let desc = manager.create_snapshot(&source).unwrap();

        fs::write(dir.path().join(&desc.name), b"tampered").unwrap();
        assert!(manager.load_snapshot(&desc.name).is_err());
    }

    #[test]
    fn test_delete_and_prune() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("profiles.json");
        fs::write(&source, b"{}").unwrap();
        let manager = SnapshotManager::new(dir.path().join("archive")).unwrap();
        for _ in 0..3 {
            manager.create_snapshot(&source).unwrap();
        }

        assert_eq!(manager.prune(1).unwrap(), 2);
        let remaining = manager.list_snapshots().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(manager.delete_snapshot(&remaining[0].name).unwrap());
        assert!(!manager.delete_snapshot(&remaining[0].name).unwrap());
        assert!(manager.list_snapshots().unwrap().is_empty());
    }
}
