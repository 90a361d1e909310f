#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use git2::Repository;

use repolocate_core::remotes::{LibGitRemotes, RemoteReader};

/// Initialize a git repository at `path` with an `origin` remote.
pub fn init_repo(path: &Path, origin: &str) -> Repository {
    fs::create_dir_all(path).unwrap();
    let repo = Repository::init(path).unwrap();
    repo.remote("origin", origin).unwrap();
    repo
}

/// Point `origin` of the repository at `path` somewhere else.
pub fn set_origin(path: &Path, origin: &str) {
    let repo = Repository::open(path).unwrap();
    repo.remote_set_url("origin", origin).unwrap();
}

/// Remotes keyed by directory, without touching git at all.
#[derive(Default)]
pub struct StaticRemotes {
    remotes: HashMap<PathBuf, Vec<String>>,
}

impl StaticRemotes {
    pub fn with(mut self, dir: &Path, url: &str) -> Self {
        self.remotes
            .entry(dir.to_path_buf())
            .or_default()
            .push(url.to_string());
        self
    }
}

impl RemoteReader for StaticRemotes {
    fn read_remotes(&self, dir: &Path) -> Vec<String> {
        self.remotes.get(dir).cloned().unwrap_or_default()
    }
}

/// Real libgit2 remotes, counting how often they are read.
#[derive(Clone, Default)]
pub struct CountingRemotes {
    calls: Arc<AtomicUsize>,
}

impl CountingRemotes {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteReader for CountingRemotes {
    fn read_remotes(&self, dir: &Path) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        LibGitRemotes.read_remotes(dir)
    }
}

/// Create a directory containing a `.git` marker directory.
pub fn fake_checkout(path: &Path) {
    fs::create_dir_all(path.join(".git")).unwrap();
}
