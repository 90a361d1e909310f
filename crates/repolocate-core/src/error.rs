//! Errors surfaced to callers of the resolver.
//!
//! Almost every failure inside the resolver degrades to "not found"; only
//! conditions the user has to fix end up here.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// None of the configured search paths could be expanded and the default
    /// root needs a home directory that is not available.
    #[error("no usable search roots: configured paths could not be expanded and no home directory is available")]
    NoSearchRoots,

    #[error("cannot determine a state directory for the repository cache")]
    NoStateDir,

    #[error("failed to read config file {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
