//! Disk-backed cache source.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use metrics::counter;
use serde_json::Value;
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use super::builder::ResourceBuilder;
use super::registry::CacheEntry;
use super::CacheError;

enum Freshness {
    Fresh,
    Stale(&'static str),
}

/// Reads and writes one artifact per resource under a configured cache
/// directory, rebuilding through the resource's builder when the artifact
/// is missing or has crossed its `max_lifetime` window.
///
/// Concurrent processes may race on the same artifact; the write path is
/// atomic (temp file + rename), so the worst case is a redundant rebuild,
/// never a torn artifact.
pub struct DiskCacheSource {
    directory: PathBuf,
}

impl DiskCacheSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn artifact_path(&self, artifact_key: &str) -> PathBuf {
        self.directory.join(format!("cache.{artifact_key}.json"))
    }

    /// Return the resource's value, reading the artifact when it is within
    /// its lifetime window and rebuilding otherwise.
    pub async fn get(
        &self,
        entry: &CacheEntry,
        builder: &dyn ResourceBuilder,
    ) -> Result<Value, CacheError> {
        let path = self.artifact_path(&entry.artifact_key);
        match self.freshness(&path, entry.max_lifetime).await {
            Freshness::Fresh => {
                counter!("ikarus_cache_hit_total").increment(1);
                self.read_artifact(&path).await
            }
            Freshness::Stale(reason) => {
                debug!(
                    resource = %entry.resource_name,
                    artifact = %path.display(),
                    reason,
                    min_lifetime = entry.min_lifetime,
                    max_lifetime = entry.max_lifetime,
                    "rebuilding cache resource"
                );
                self.rebuild(entry, builder, &path).await
            }
        }
    }

    /// Delete the resource's artifact so the next `get` rebuilds it.
    /// Best-effort: a missing artifact is not an error.
    pub async fn invalidate(&self, artifact_key: &str) {
        let path = self.artifact_path(artifact_key);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    artifact = %path.display(),
                    error = %err,
                    "failed to delete cache artifact"
                );
            }
        }
    }

    /// Remove every artifact in the cache directory.
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(CacheError::persist(&self.directory, err.to_string())),
        };
        while let Some(dir_entry) = entries
            .next_entry()
            .await
            .map_err(|err| CacheError::persist(&self.directory, err.to_string()))?
        {
            let name = dir_entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("cache.") && name.ends_with(".json") {
                if let Err(err) = tokio::fs::remove_file(dir_entry.path()).await {
                    warn!(
                        artifact = %dir_entry.path().display(),
                        error = %err,
                        "failed to delete cache artifact"
                    );
                } else {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn freshness(&self, path: &Path, max_lifetime: u64) -> Freshness {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Freshness::Stale("missing");
            }
            Err(_) => return Freshness::Stale("unreadable"),
        };
        if max_lifetime == 0 {
            return Freshness::Fresh;
        }
        let Ok(modified) = metadata.modified() else {
            return Freshness::Stale("no_mtime");
        };
        // A window too large to represent can never end.
        let Some(deadline) = modified.checked_add(Duration::from_secs(max_lifetime)) else {
            return Freshness::Fresh;
        };
        if deadline < SystemTime::now() {
            Freshness::Stale("expired")
        } else {
            Freshness::Fresh
        }
    }

    async fn rebuild(
        &self,
        entry: &CacheEntry,
        builder: &dyn ResourceBuilder,
        path: &Path,
    ) -> Result<Value, CacheError> {
        // Drop the stale artifact first; an undeletable file is overwritten
        // by the rename below, so the failure is logged and ignored.
        if let Err(err) = tokio::fs::remove_file(path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    artifact = %path.display(),
                    error = %err,
                    "failed to delete stale cache artifact"
                );
            }
        }

        let value = builder.build(&entry.resource_name, &entry.params).await?;
        self.write_artifact(entry, path, &value).await?;
        counter!("ikarus_cache_rebuild_total").increment(1);
        Ok(value)
    }

    async fn read_artifact(&self, path: &Path) -> Result<Value, CacheError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                counter!("ikarus_cache_corrupt_total").increment(1);
                return Err(CacheError::corrupt(path, err.to_string()));
            }
        };
        // Header bytes up to and including the first line break are discarded.
        let Some(break_at) = bytes.iter().position(|byte| *byte == b'\n') else {
            counter!("ikarus_cache_corrupt_total").increment(1);
            return Err(CacheError::corrupt(path, "missing header line"));
        };
        serde_json::from_slice(&bytes[break_at + 1..]).map_err(|err| {
            counter!("ikarus_cache_corrupt_total").increment(1);
            CacheError::corrupt(path, err.to_string())
        })
    }

    async fn write_artifact(
        &self,
        entry: &CacheEntry,
        path: &Path,
        value: &Value,
    ) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|err| CacheError::persist(&self.directory, err.to_string()))?;

        let generated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|err| CacheError::persist(path, err.to_string()))?;
        let header = format!(
            "// ikarus cache: {} (generated at {generated_at})\n",
            entry.resource_name
        );
        let payload = serde_json::to_vec(value).map_err(|err| CacheError::Serialize {
            resource: entry.resource_name.to_string(),
            source: err,
        })?;

        let mut temp = NamedTempFile::new_in(&self.directory)
            .map_err(|err| CacheError::persist(path, err.to_string()))?;
        temp.write_all(header.as_bytes())
            .map_err(|err| CacheError::persist(path, err.to_string()))?;
        temp.write_all(&payload)
            .map_err(|err| CacheError::persist(path, err.to_string()))?;
        temp.persist(path)
            .map_err(|err| CacheError::persist(path, err.to_string()))?;
        Ok(())
    }
}
