//! Default on-disk locations.

use std::path::PathBuf;

use crate::error::ResolveError;

const APP_DIR: &str = "repolocate";

/// Default config file: `<config_dir>/repolocate/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Default cache file location.
///
/// - Unix: `$XDG_STATE_HOME/repolocate/cache.json` or
///   `~/.local/state/repolocate/cache.json`
/// - Windows: `%LOCALAPPDATA%\repolocate\cache.json`
pub fn default_cache_path() -> Result<PathBuf, ResolveError> {
    let base = if cfg!(unix) {
        dirs::state_dir().or_else(dirs::data_local_dir)
    } else {
        dirs::data_local_dir()
    };
    base.map(|dir| dir.join(APP_DIR).join("cache.json"))
        .ok_or(ResolveError::NoStateDir)
}
