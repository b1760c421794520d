//! Artifact staging
//!
//! Temporary on-disk staging for composited share artifacts. Every artifact
//! gets a unique generated filename inside the configured base directory, so
//! concurrent shares never overwrite each other and no process-wide path
//! exists. Files are fully written and synced before their handle is
//! returned.
//!
//! Staged files are transient: the external messenger reads them once. The
//! store carries a TTL and an explicit `cleanup()` that removes expired
//! artifacts, plus a best-effort sweep of stale leftovers from previous runs
//! on store creation.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Default maximum artifact size (50MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Default TTL for staged artifacts (1 hour)
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("artifact too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("IO error: {0}")]
    Io(String),
}

/// Metadata for a staged artifact
#[derive(Debug, Clone)]
pub struct ArtifactMetadata {
    /// Path to the staged file
    pub path: PathBuf,

    /// MIME type, if known
    pub mime_type: Option<String>,

    /// File size in bytes
    pub size: u64,

    /// When the artifact was staged
    pub created_at: DateTime<Utc>,
}

impl ArtifactMetadata {
    /// Check whether this artifact has outlived the TTL
    pub fn is_expired(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.created_at);
        age.num_milliseconds() >= ttl.as_millis() as i64
    }
}

/// Configuration for the artifact store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base directory for staged files
    pub base_dir: PathBuf,

    /// Maximum artifact size in bytes
    pub max_file_size: u64,

    /// Time-to-live for staged artifacts
    pub ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_dir: std::env::temp_dir().join("ferry-artifacts"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }
}

impl StoreConfig {
    /// Set a custom base directory
    pub fn with_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.base_dir = base_dir;
        self
    }

    /// Set a custom max artifact size
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Set a custom TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Thread-safe staging store for share artifacts.
pub struct ArtifactStore {
    config: StoreConfig,
    /// Artifacts staged by this store, keyed by file id
    entries: RwLock<HashMap<String, ArtifactMetadata>>,
}

impl ArtifactStore {
    /// Create a store, creating the base directory if needed and sweeping
    /// stale leftovers from earlier runs.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.base_dir)
            .map_err(|e| StoreError::Io(format!("failed to create base directory: {e}")))?;

        let store = Self {
            config,
            entries: RwLock::new(HashMap::new()),
        };
        store.sweep_stale_files();
        Ok(store)
    }

    /// Stage bytes as a new uniquely-named artifact.
    ///
    /// The file is fully written and synced before the metadata is returned;
    /// no partial artifact is ever observable through the returned handle.
    pub fn stage(
        &self,
        bytes: &[u8],
        mime_type: Option<String>,
    ) -> Result<ArtifactMetadata, StoreError> {
        let size = bytes.len() as u64;
        if size > self.config.max_file_size {
            return Err(StoreError::FileTooLarge {
                size,
                max: self.config.max_file_size,
            });
        }

        let file_id = Uuid::new_v4().to_string();
        let filename = format!("{}{}", file_id, mime_extension(mime_type.as_deref()));
        let path = self.config.base_dir.join(filename);

        let mut file = fs::File::create(&path)
            .map_err(|e| StoreError::Io(format!("failed to create artifact: {e}")))?;
        file.write_all(bytes)
            .map_err(|e| StoreError::Io(format!("failed to write artifact: {e}")))?;
        file.flush()
            .map_err(|e| StoreError::Io(format!("failed to flush artifact: {e}")))?;
        file.sync_all()
            .map_err(|e| StoreError::Io(format!("failed to sync artifact: {e}")))?;

        let metadata = ArtifactMetadata {
            path: path.clone(),
            mime_type,
            size,
            created_at: Utc::now(),
        };
        self.entries.write().insert(file_id.clone(), metadata.clone());

        tracing::debug!(
            target: "media",
            file_id = %file_id,
            path = %path.display(),
            size = size,
            "staged artifact"
        );

        Ok(metadata)
    }

    /// Remove a staged artifact by path. Returns whether anything was removed.
    pub fn remove(&self, path: &Path) -> Result<bool, StoreError> {
        let file_id = {
            let entries = self.entries.read();
            entries
                .iter()
                .find(|(_, meta)| meta.path == path)
                .map(|(id, _)| id.clone())
        };

        let Some(id) = file_id else {
            return Ok(false);
        };

        self.entries.write().remove(&id);
        if path.exists() {
            fs::remove_file(path)
                .map_err(|e| StoreError::Io(format!("failed to remove artifact: {e}")))?;
        }
        tracing::debug!(target: "media", path = %path.display(), "removed artifact");
        Ok(true)
    }

    /// Remove expired artifacts. Returns the number removed.
    pub fn cleanup(&self) -> Result<usize, StoreError> {
        let ttl = self.config.ttl;
        let expired: Vec<(String, PathBuf)> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|(_, meta)| meta.is_expired(ttl))
                .map(|(id, meta)| (id.clone(), meta.path.clone()))
                .collect()
        };

        let count = expired.len();
        for (id, path) in expired {
            self.entries.write().remove(&id);
            if path.exists() {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!(
                        target: "media",
                        path = %path.display(),
                        error = %e,
                        "failed to remove expired artifact"
                    );
                }
            }
        }

        if count > 0 {
            tracing::info!(target: "media", count = count, "cleaned up expired artifacts");
        }
        Ok(count)
    }

    /// Number of artifacts staged by this store
    pub fn file_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Total size of artifacts staged by this store
    pub fn total_size(&self) -> u64 {
        self.entries.read().values().map(|m| m.size).sum()
    }

    /// All artifacts staged by this store
    pub fn list(&self) -> Vec<ArtifactMetadata> {
        self.entries.read().values().cloned().collect()
    }

    /// Store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Best-effort removal of files left behind by previous runs whose
    /// modification time is older than the TTL. Untracked fresh files are
    /// left alone.
    fn sweep_stale_files(&self) {
        let Ok(dir) = fs::read_dir(&self.config.base_dir) else {
            return;
        };
        for entry in dir.flatten() {
            let path = entry.path();
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let stale = meta
                .modified()
                .ok()
                .and_then(|mtime| mtime.elapsed().ok())
                .map(|age| age >= self.config.ttl)
                .unwrap_or(false);
            if stale {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!(
                        target: "media",
                        path = %path.display(),
                        error = %e,
                        "failed to sweep stale artifact"
                    );
                }
            }
        }
    }
}

/// Map a MIME type to the staged file's extension.
fn mime_extension(mime_type: Option<&str>) -> &'static str {
    let Some(mime) = mime_type else {
        return ".bin";
    };
    let subtype = mime
        .split('/')
        .nth(1)
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim();

    match subtype {
        "jpeg" | "jpg" | "*" if mime.starts_with("image") => ".jpg",
        "png" => ".png",
        "gif" => ".gif",
        "webp" => ".webp",
        "mp4" => ".mp4",
        "webm" if mime.starts_with("video") => ".webm",
        "quicktime" => ".mov",
        "mpeg" if mime.starts_with("audio") => ".mp3",
        "ogg" if mime.starts_with("audio") => ".ogg",
        "wav" | "x-wav" => ".wav",
        _ => ".bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store(ttl: Duration) -> (ArtifactStore, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let config = StoreConfig::default()
            .with_base_dir(temp_dir.path().to_path_buf())
            .with_ttl(ttl);
        let store = ArtifactStore::new(config).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_stage_writes_and_tracks() {
        let (store, _dir) = test_store(Duration::from_secs(3600));

        let metadata = store
            .stage(b"jpeg bytes", Some("image/jpeg".to_string()))
            .unwrap();

        assert_eq!(metadata.size, 10);
        assert!(metadata.path.exists());
        assert_eq!(metadata.path.extension().unwrap(), "jpg");
        assert_eq!(fs::read(&metadata.path).unwrap(), b"jpeg bytes");
        assert_eq!(store.file_count(), 1);
    }

    #[test]
    fn test_stage_generates_unique_paths() {
        let (store, _dir) = test_store(Duration::from_secs(3600));

        let first = store.stage(b"one", Some("image/jpeg".into())).unwrap();
        let second = store.stage(b"two", Some("image/jpeg".into())).unwrap();

        assert_ne!(first.path, second.path);
        assert_eq!(fs::read(&first.path).unwrap(), b"one");
        assert_eq!(fs::read(&second.path).unwrap(), b"two");
    }

    #[test]
    fn test_stage_rejects_oversized() {
        let temp_dir = tempdir().unwrap();
        let config = StoreConfig::default()
            .with_base_dir(temp_dir.path().to_path_buf())
            .with_max_file_size(10);
        let store = ArtifactStore::new(config).unwrap();

        let result = store.stage(&[0u8; 100], None);
        assert!(matches!(
            result,
            Err(StoreError::FileTooLarge { size: 100, max: 10 })
        ));
    }

    #[test]
    fn test_remove() {
        let (store, _dir) = test_store(Duration::from_secs(3600));
        let metadata = store.stage(b"data", None).unwrap();

        assert!(store.remove(&metadata.path).unwrap());
        assert!(!metadata.path.exists());
        assert_eq!(store.file_count(), 0);

        assert!(!store.remove(&metadata.path).unwrap());
    }

    #[test]
    fn test_cleanup_removes_expired() {
        let (store, _dir) = test_store(Duration::ZERO);
        let metadata = store.stage(b"data", None).unwrap();

        let removed = store.cleanup().unwrap();
        assert_eq!(removed, 1);
        assert!(!metadata.path.exists());
        assert_eq!(store.file_count(), 0);
    }

    #[test]
    fn test_cleanup_keeps_fresh() {
        let (store, _dir) = test_store(Duration::from_secs(3600));
        let metadata = store.stage(b"data", None).unwrap();

        let removed = store.cleanup().unwrap();
        assert_eq!(removed, 0);
        assert!(metadata.path.exists());
        assert_eq!(store.file_count(), 1);
    }

    #[test]
    fn test_sweep_removes_stale_leftovers() {
        let temp_dir = tempdir().unwrap();
        let leftover = temp_dir.path().join("old.jpg");
        fs::write(&leftover, b"leftover").unwrap();

        let config = StoreConfig::default()
            .with_base_dir(temp_dir.path().to_path_buf())
            .with_ttl(Duration::ZERO);
        let _store = ArtifactStore::new(config).unwrap();

        assert!(!leftover.exists());
    }

    #[test]
    fn test_sweep_keeps_fresh_leftovers() {
        let temp_dir = tempdir().unwrap();
        let leftover = temp_dir.path().join("recent.jpg");
        fs::write(&leftover, b"leftover").unwrap();

        let config = StoreConfig::default()
            .with_base_dir(temp_dir.path().to_path_buf())
            .with_ttl(Duration::from_secs(3600));
        let _store = ArtifactStore::new(config).unwrap();

        assert!(leftover.exists());
    }

    #[test]
    fn test_total_size_and_list() {
        let (store, _dir) = test_store(Duration::from_secs(3600));
        store.stage(b"12345", None).unwrap();
        store.stage(b"67890", None).unwrap();

        assert_eq!(store.total_size(), 10);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn test_metadata_is_expired() {
        let metadata = ArtifactMetadata {
            path: PathBuf::from("/tmp/a.jpg"),
            mime_type: None,
            size: 1,
            created_at: Utc::now() - chrono::Duration::seconds(120),
        };
        assert!(metadata.is_expired(Duration::from_secs(60)));
        assert!(!metadata.is_expired(Duration::from_secs(300)));
    }

    #[test]
    fn test_mime_extension() {
        assert_eq!(mime_extension(Some("image/jpeg")), ".jpg");
        assert_eq!(mime_extension(Some("image/*")), ".jpg");
        assert_eq!(mime_extension(Some("image/png")), ".png");
        assert_eq!(mime_extension(Some("image/gif")), ".gif");
        assert_eq!(mime_extension(Some("video/mp4")), ".mp4");
        assert_eq!(mime_extension(Some("audio/mpeg")), ".mp3");
        assert_eq!(mime_extension(Some("image/jpeg; charset=utf-8")), ".jpg");
        assert_eq!(mime_extension(Some("application/unknown")), ".bin");
        assert_eq!(mime_extension(None), ".bin");
    }

    #[test]
    fn test_store_config_builder() {
        let config = StoreConfig::default()
            .with_base_dir(PathBuf::from("/custom/path"))
            .with_max_file_size(123)
            .with_ttl(Duration::from_secs(7));

        assert_eq!(config.base_dir, PathBuf::from("/custom/path"));
        assert_eq!(config.max_file_size, 123);
        assert_eq!(config.ttl, Duration::from_secs(7));
    }
}
