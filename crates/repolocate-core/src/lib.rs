//! Repolocate Core Library
//!
//! Resolves repository references (SSH, HTTPS, bare `host/owner/repo`) to a
//! local checkout, backed by a self-validating path cache and a bounded
//! filesystem scan.

pub mod cache;
pub mod config;
pub mod error;
pub mod identifier;
pub mod paths;
pub mod remotes;
pub mod resolver;
pub mod scanner;

/// Re-exports of commonly used types
pub mod prelude {
    pub use crate::cache::{CacheEntry, CacheMap, CacheStore};
    pub use crate::config::{ResolverConfig, SearchConfig};
    pub use crate::error::ResolveError;
    pub use crate::identifier::{RepoId, normalize, repo_name};
    pub use crate::remotes::{GitCliRemotes, LibGitRemotes, RemoteReader};
    pub use crate::resolver::{Resolution, ResolutionSource, Resolver};
    pub use crate::scanner::{SKIP_DIRS, Scanner};
}
