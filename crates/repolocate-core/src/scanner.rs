//! Bounded filesystem scan for a checkout matching a [`RepoId`].
//!
//! Directories named in [`SKIP_DIRS`] are never entered, and neither are
//! symlinked directories: a checkout reachable only through a symlink is not
//! found, which keeps link cycles from trapping the walk. Add the link target
//! as a search root instead.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::identifier::{RepoId, repo_name};
use crate::remotes::RemoteReader;

/// Directory names that are never descended into.
pub const SKIP_DIRS: &[&str] = &[
    ".cache",
    ".git",
    ".gradle",
    ".idea",
    ".next",
    ".tox",
    ".venv",
    "Pods",
    "__pycache__",
    "bower_components",
    "build",
    "dist",
    "node_modules",
    "target",
    "vendor",
    "venv",
];

/// Walks search roots looking for a directory named after the repository
/// whose remotes include the identifier.
///
/// Children of a search root sit at depth 0. A directory listed while
/// scanning at `max_depth` is still checked for a name match but is not
/// descended into. Roots are searched in order and each root breadth first
/// with children sorted by name, so the first match in an earlier root, or at
/// a shallower level, wins.
pub struct Scanner<'a> {
    remotes: &'a dyn RemoteReader,
}

impl<'a> Scanner<'a> {
    pub fn new(remotes: &'a dyn RemoteReader) -> Self {
        Self { remotes }
    }

    pub fn scan(&self, id: &RepoId, roots: &[PathBuf], max_depth: usize) -> Option<PathBuf> {
        let name = repo_name(Some(id))?;

        roots
            .iter()
            .find_map(|root| self.scan_root(id, name, root, max_depth))
    }

    fn scan_root(
        &self,
        id: &RepoId,
        repo_name: &str,
        root: &Path,
        max_depth: usize,
    ) -> Option<PathBuf> {
        tracing::debug!(root = %root.display(), max_depth, "scanning search root");

        let mut queue = VecDeque::from([(root.to_path_buf(), 0usize)]);
        while let Some((dir, depth)) = queue.pop_front() {
            for (name, child) in child_dirs(&dir) {
                if SKIP_DIRS.contains(&name.as_str()) {
                    continue;
                }
                if name.to_lowercase() == repo_name
                    && has_git_marker(&child)
                    && self.remotes.has_remote(&child, id)
                {
                    return Some(std::path::absolute(&child).unwrap_or(child));
                }
                if depth < max_depth {
                    queue.push_back((child, depth + 1));
                }
            }
        }
        None
    }
}

/// Subdirectories of `dir`, sorted by name. Symlinks are not followed.
///
/// An unreadable directory yields no children.
fn child_dirs(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::trace!(dir = %dir.display(), error = %err, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut children: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|ty| ty.is_dir()))
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
        .collect();
    children.sort_by(|a, b| a.0.cmp(&b.0));
    children
}

/// `.git` as a directory (plain checkout) or file (worktree, submodule).
fn has_git_marker(dir: &Path) -> bool {
    dir.join(".git").symlink_metadata().is_ok()
}
