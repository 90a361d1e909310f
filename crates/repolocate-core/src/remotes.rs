//! Reading the remotes recorded in a local checkout.
//!
//! Remote lookups never fail: a directory that is not a repository, a missing
//! `git` binary, or a query that runs past its timeout all read as "no
//! remotes". Callers can therefore treat an inaccessible directory and a
//! non-matching one the same way.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use git2::Repository;

use crate::identifier::{RepoId, normalize};

/// Default bound on a single `git remote -v` invocation.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(3);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

/// Source of remote URLs for a checkout.
pub trait RemoteReader: Send + Sync {
    /// Remote URLs of the repository at `dir`, deduplicated in first-seen order.
    ///
    /// Any failure yields an empty vector.
    fn read_remotes(&self, dir: &Path) -> Vec<String>;

    /// Whether any remote of `dir` normalizes to `id`.
    fn has_remote(&self, dir: &Path, id: &RepoId) -> bool {
        self.read_remotes(dir)
            .iter()
            .filter_map(|url| normalize(url))
            .any(|remote| &remote == id)
    }
}

/// Reads remotes by running `git remote -v` with a timeout.
#[derive(Debug, Clone)]
pub struct GitCliRemotes {
    timeout: Duration,
}

impl GitCliRemotes {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn query(&self, dir: &Path) -> anyhow::Result<String> {
        let mut cmd = git_command();
        cmd.args(["remote", "-v"])
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        // Keep git from answering with the remotes of an enclosing repository.
        if let Some(parent) = dir.parent() {
            cmd.env("GIT_CEILING_DIRECTORIES", parent);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to run git remote in {}", dir.display()))?;

        let Some(mut stdout) = child.stdout.take() else {
            reap(&mut child);
            anyhow::bail!("git remote stdout was not captured");
        };
        let reader = thread::spawn(move || {
            let mut buf = String::new();
            stdout.read_to_string(&mut buf).map(|_| buf)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if Instant::now() >= deadline {
                reap(&mut child);
                anyhow::bail!(
                    "git remote timed out after {:?} in {}",
                    self.timeout,
                    dir.display()
                );
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(err) => {
                    reap(&mut child);
                    return Err(err).context("Failed to poll git remote");
                }
            }
        };

        let output = reader
            .join()
            .map_err(|_| anyhow::anyhow!("git remote output reader panicked"))?
            .context("git remote output is not valid UTF-8")?;

        if !status.success() {
            anyhow::bail!("git remote exited with {} in {}", status, dir.display());
        }
        Ok(output)
    }
}

impl Default for GitCliRemotes {
    fn default() -> Self {
        Self::new(DEFAULT_REMOTE_TIMEOUT)
    }
}

impl RemoteReader for GitCliRemotes {
    fn read_remotes(&self, dir: &Path) -> Vec<String> {
        match self.query(dir) {
            Ok(output) => parse_remote_output(&output),
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "no remotes read");
                Vec::new()
            }
        }
    }
}

/// Reads remotes in-process through libgit2.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibGitRemotes;

impl LibGitRemotes {
    fn query(dir: &Path) -> anyhow::Result<Vec<String>> {
        let repo = Repository::open(dir)
            .with_context(|| format!("Not a git repository: {}", dir.display()))?;
        let names = repo.remotes()?;

        let mut urls = Vec::new();
        for name in names.iter().flatten() {
            let remote = repo.find_remote(name)?;
            for url in [remote.url(), remote.pushurl()].into_iter().flatten() {
                push_unique(&mut urls, url);
            }
        }
        Ok(urls)
    }
}

impl RemoteReader for LibGitRemotes {
    fn read_remotes(&self, dir: &Path) -> Vec<String> {
        Self::query(dir).unwrap_or_else(|err| {
            tracing::debug!(dir = %dir.display(), error = %err, "no remotes read");
            Vec::new()
        })
    }
}

/// Parse `git remote -v` output into unique URLs.
///
/// Each line is `<name> <url> (<fetch|push>)`; lines with fewer than two
/// fields are ignored.
pub fn parse_remote_output(output: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for line in output.lines() {
        if let Some(url) = line.split_whitespace().nth(1) {
            push_unique(&mut urls, url);
        }
    }
    urls
}

fn push_unique(urls: &mut Vec<String>, url: &str) {
    if !urls.iter().any(|existing| existing == url) {
        urls.push(url.to_string());
    }
}

/// Kill and wait on a child we are abandoning so it does not linger as a zombie.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn git_command() -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}
