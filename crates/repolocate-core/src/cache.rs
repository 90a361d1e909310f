//! Persistent cache of resolved checkout paths.
//!
//! The cache is a hint, never a source of truth: every lookup re-checks that
//! the cached directory still exists and still has a remote matching the
//! identifier, and evicts the entry otherwise.
//!
//! Each operation loads the file fresh, modifies the map, and rewrites the
//! whole file atomically (tmp + rename). A process-wide lock serializes these
//! cycles so concurrent resolves in one process cannot drop each other's
//! writes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifier::RepoId;
use crate::remotes::RemoteReader;

/// Cached location of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub last_used: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_used: Utc::now(),
        }
    }
}

pub type CacheMap = BTreeMap<RepoId, CacheEntry>;

static CACHE_LOCK: Mutex<()> = Mutex::new(());

fn cache_lock() -> MutexGuard<'static, ()> {
    CACHE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owner of all read-modify-write cycles on the cache file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_path: PathBuf,
}

impl CacheStore {
    pub fn new(cache_path: PathBuf) -> Self {
        Self { cache_path }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Read the persisted map.
    ///
    /// A missing or unparsable file reads as an empty cache.
    pub fn load(&self) -> CacheMap {
        match self.read_map() {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(
                    path = %self.cache_path.display(),
                    error = %err,
                    "ignoring unreadable repository cache"
                );
                CacheMap::new()
            }
        }
    }

    /// Look up a cached path, validating it against the filesystem.
    ///
    /// Stale entries (directory gone, or no remote normalizing to `id`) are
    /// removed and persisted before returning `None`. Valid entries get a
    /// fresh `last_used` timestamp.
    pub fn lookup(&self, id: &RepoId, remotes: &dyn RemoteReader) -> Option<PathBuf> {
        let _guard = cache_lock();
        let mut map = self.load();
        let entry = map.get_mut(id)?;

        let exists = entry.path.is_dir();
        if exists && remotes.has_remote(&entry.path, id) {
            entry.last_used = Utc::now();
            let path = entry.path.clone();
            tracing::debug!(id = %id, path = %path.display(), "cache hit");
            self.persist_or_warn(&map);
            return Some(path);
        }

        let reason = if exists {
            "remote mismatch"
        } else {
            "path missing"
        };
        tracing::info!(
            id = %id,
            path = %entry.path.display(),
            reason,
            "evicting stale cache entry"
        );
        map.remove(id);
        self.persist_or_warn(&map);
        None
    }

    /// Insert or overwrite the entry for `id`.
    pub fn store(&self, id: &RepoId, path: &Path) -> anyhow::Result<()> {
        let _guard = cache_lock();
        let mut map = self.load();
        map.insert(id.clone(), CacheEntry::new(path.to_path_buf()));
        self.persist(&map)
    }

    /// Remove the entry for `id`. Returns whether one was present.
    pub fn evict(&self, id: &RepoId) -> anyhow::Result<bool> {
        let _guard = cache_lock();
        let mut map = self.load();
        if map.remove(id).is_none() {
            return Ok(false);
        }
        self.persist(&map)?;
        Ok(true)
    }

    /// All entries, ordered by identifier.
    pub fn entries(&self) -> Vec<(RepoId, CacheEntry)> {
        let _guard = cache_lock();
        self.load().into_iter().collect()
    }

    /// Drop every entry.
    pub fn clear(&self) -> anyhow::Result<()> {
        let _guard = cache_lock();
        self.persist(&CacheMap::new())
    }

    fn read_map(&self) -> anyhow::Result<CacheMap> {
        if !self.cache_path.exists() {
            return Ok(CacheMap::new());
        }
        let bytes = fs::read(&self.cache_path)
            .with_context(|| format!("Failed to read cache: {}", self.cache_path.display()))?;
        let map = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse cache: {}", self.cache_path.display()))?;
        Ok(map)
    }

    fn persist_or_warn(&self, map: &CacheMap) {
        if let Err(err) = self.persist(map) {
            tracing::warn!(error = %err, "failed to persist repository cache");
        }
    }

    /// Rewrite the whole cache file atomically (tmp + rename).
    fn persist(&self, map: &CacheMap) -> anyhow::Result<()> {
        let dir = self
            .cache_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;

        let file_name = self
            .cache_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cache.json".to_string());
        let tmp_path = dir.join(format!(".{}.{}.tmp", file_name, std::process::id()));

        let bytes = serde_json::to_vec_pretty(map).context("Failed to serialize cache")?;
        fs::write(&tmp_path, bytes)
            .with_context(|| format!("Failed to write tmp cache: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.cache_path).with_context(|| {
            format!(
                "Failed to move tmp cache into place: {}",
                self.cache_path.display()
            )
        })?;
        Ok(())
    }
}
