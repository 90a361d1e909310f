//! Resolver configuration loaded from `config.toml`.
//!
//! ```toml
//! search_paths = ["~/code", "~/work"]
//! max_depth = 4
//! remote_timeout_secs = 3
//! ```
//!
//! Every key is optional; a missing file means all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::remotes::DEFAULT_REMOTE_TIMEOUT;

pub const DEFAULT_SEARCH_PATH: &str = "~/code";
pub const DEFAULT_MAX_DEPTH: usize = 4;
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = DEFAULT_REMOTE_TIMEOUT.as_secs();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Ordered search roots; `~` expands to the home directory.
    pub search_paths: Vec<String>,
    /// Maximum number of directory levels descended below a search root.
    pub max_depth: usize,
    /// Bound on each remote query, in seconds.
    pub remote_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![DEFAULT_SEARCH_PATH.to_string()],
            max_depth: DEFAULT_MAX_DEPTH,
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
        }
    }
}

/// Expanded search roots and depth handed to the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub roots: Vec<PathBuf>,
    pub max_depth: usize,
}

impl ResolverConfig {
    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ResolveError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ResolveError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content).map_err(|source| ResolveError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    /// Expand the configured search paths against `home`.
    ///
    /// Entries that are blank or need a home directory that is unknown are
    /// dropped. When nothing usable remains the default root is used, and if
    /// that cannot be expanded either the configuration is unusable.
    pub fn search_config(&self, home: Option<&Path>) -> Result<SearchConfig, ResolveError> {
        let mut roots: Vec<PathBuf> = self
            .search_paths
            .iter()
            .filter_map(|raw| expand_home(raw, home))
            .collect();

        if roots.is_empty() {
            tracing::warn!(
                configured = ?self.search_paths,
                "no usable search paths, falling back to {}",
                DEFAULT_SEARCH_PATH
            );
            let fallback =
                expand_home(DEFAULT_SEARCH_PATH, home).ok_or(ResolveError::NoSearchRoots)?;
            roots.push(fallback);
        }

        Ok(SearchConfig {
            roots,
            max_depth: self.max_depth,
        })
    }
}

/// Expand a leading `~` or `~/` to `home`.
///
/// Returns `None` for blank input or when `home` is needed but unknown.
pub fn expand_home(raw: &str, home: Option<&Path>) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw == "~" {
        return home.map(Path::to_path_buf);
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        return home.map(|home| home.join(rest));
    }
    Some(PathBuf::from(raw))
}
