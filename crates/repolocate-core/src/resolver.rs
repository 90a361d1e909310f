//! Resolve repository references to local checkouts.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cache::CacheStore;
use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::identifier::{RepoId, normalize};
use crate::paths;
use crate::remotes::{GitCliRemotes, RemoteReader};
use crate::scanner::Scanner;

/// Where a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Cache,
    Scan,
}

/// A successfully located checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub id: RepoId,
    pub path: PathBuf,
    pub source: ResolutionSource,
}

/// Normalize, consult the cache, and fall back to scanning the search roots.
pub struct Resolver {
    cache: CacheStore,
    config: ResolverConfig,
    home_dir: Option<PathBuf>,
    remotes: Box<dyn RemoteReader>,
}

impl Resolver {
    pub fn new(
        cache: CacheStore,
        config: ResolverConfig,
        home_dir: Option<PathBuf>,
        remotes: Box<dyn RemoteReader>,
    ) -> Self {
        Self {
            cache,
            config,
            home_dir,
            remotes,
        }
    }

    /// Build a resolver from config and cache files.
    ///
    /// `None` selects the default location for either file. Remotes are read
    /// with `git remote -v`, bounded by the configured timeout.
    pub fn from_paths(
        config_path: Option<&Path>,
        cache_path: Option<PathBuf>,
    ) -> Result<Self, ResolveError> {
        let config = match config_path
            .map(Path::to_path_buf)
            .or_else(paths::default_config_path)
        {
            Some(path) => ResolverConfig::load(&path)?,
            None => ResolverConfig::default(),
        };
        let cache_path = match cache_path {
            Some(path) => path,
            None => paths::default_cache_path()?,
        };
        let remotes = GitCliRemotes::new(config.remote_timeout());

        Ok(Self::new(
            CacheStore::new(cache_path),
            config,
            dirs::home_dir(),
            Box::new(remotes),
        ))
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `raw` to a checkout path.
    ///
    /// Not finding the repository is `Ok(None)`; errors are reserved for an
    /// unusable search configuration.
    pub fn resolve(&self, raw: &str) -> Result<Option<PathBuf>, ResolveError> {
        Ok(self.locate(raw)?.map(|resolution| resolution.path))
    }

    /// Like [`Resolver::resolve`], also reporting the identifier and whether
    /// the path came from the cache or a scan.
    pub fn locate(&self, raw: &str) -> Result<Option<Resolution>, ResolveError> {
        tracing::debug!(raw, "resolving repository");
        let Some(id) = normalize(raw) else {
            tracing::info!(raw, "rejected repository reference");
            return Ok(None);
        };

        if let Some(path) = self.cache.lookup(&id, self.remotes.as_ref()) {
            tracing::info!(id = %id, path = %path.display(), "resolved from cache");
            return Ok(Some(Resolution {
                id,
                path,
                source: ResolutionSource::Cache,
            }));
        }
        tracing::debug!(id = %id, "cache miss");

        let search = self.config.search_config(self.home_dir.as_deref())?;
        tracing::info!(
            id = %id,
            roots = ?search.roots,
            max_depth = search.max_depth,
            "scanning for repository"
        );

        let scanner = Scanner::new(self.remotes.as_ref());
        let Some(path) = scanner.scan(&id, &search.roots, search.max_depth) else {
            tracing::info!(id = %id, "repository not found");
            return Ok(None);
        };

        tracing::info!(id = %id, path = %path.display(), "found repository");
        if let Err(err) = self.cache.store(&id, &path) {
            tracing::warn!(id = %id, error = %err, "failed to cache resolved path");
        }
        Ok(Some(Resolution {
            id,
            path,
            source: ResolutionSource::Scan,
        }))
    }
}
