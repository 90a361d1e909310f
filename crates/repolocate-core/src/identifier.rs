//! Canonical repository identifiers.
//!
//! Every supported way of writing a repository reference is reduced to a
//! single lowercase `host/owner/.../repo` string. Two references to the same
//! repository always produce the same [`RepoId`].

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized `host/owner/.../repo` identifier.
///
/// No scheme, no trailing `.git`, no trailing slashes, always lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoId(String);

impl RepoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment, used to filter directory names while scanning.
    pub fn repo_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RepoId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw repository reference.
///
/// Supports, in order of precedence:
/// - `user@ssh.<host>:v3/<rest>` (provider SSH shorthand) -> `<host>/<rest>`
/// - `user@host:path` (scp-like SSH) -> `<host>/<path>`
/// - `ssh://[user@]host[:port]/path`
/// - `http(s)://host/path` and bare `host/path`
///
/// Returns `None` for empty input or input that is empty once stripped.
pub fn normalize(raw: &str) -> Option<RepoId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let body = if let Some((host, rest)) = split_provider_ssh(raw) {
        format!("{}/{}", host, rest)
    } else if let Some((host, path)) = split_scp_like(raw) {
        format!("{}/{}", host, path.trim_start_matches('/'))
    } else if let Some(url) = strip_prefix_ignore_case(raw, "ssh://") {
        strip_ssh_authority(url)
    } else {
        strip_http_scheme(raw).to_string()
    };

    finish(&body)
}

/// Repository name of a canonical identifier, if there is one.
pub fn repo_name(id: Option<&RepoId>) -> Option<&str> {
    id.map(RepoId::repo_name)
}

fn finish(body: &str) -> Option<RepoId> {
    let lowered = body.to_lowercase();
    let mut trimmed = lowered.trim_start();
    // Strip until stable so `repo/ .git` and `repo.git.git` are fixed points.
    loop {
        let next = trimmed.trim_end_matches(|c: char| c == '/' || c.is_whitespace());
        let next = next.strip_suffix(".git").unwrap_or(next);
        if next.len() == trimmed.len() {
            break;
        }
        trimmed = next;
    }
    if trimmed.is_empty() {
        return None;
    }
    Some(RepoId(trimmed.to_string()))
}

/// Split `user@ssh.<host>:v3/<rest>` into `(host, rest)`.
fn split_provider_ssh(raw: &str) -> Option<(&str, &str)> {
    let (user, remainder) = raw.split_once('@')?;
    if !is_ssh_user(user) {
        return None;
    }
    let remainder = strip_prefix_ignore_case(remainder, "ssh.")?;
    let (host, path) = remainder.split_once(':')?;
    let rest = strip_prefix_ignore_case(path, "v3/")?;
    if host.is_empty() || host.contains('/') || rest.is_empty() {
        return None;
    }
    Some((host, rest))
}

/// Split `user@host:path` into `(host, path)`.
fn split_scp_like(raw: &str) -> Option<(&str, &str)> {
    let (user, remainder) = raw.split_once('@')?;
    if !is_ssh_user(user) {
        return None;
    }
    let (host, path) = remainder.split_once(':')?;
    if host.is_empty() || host.contains('/') || path.is_empty() {
        return None;
    }
    Some((host, path))
}

fn is_ssh_user(user: &str) -> bool {
    !user.is_empty() && !user.contains(['/', ':'])
}

/// Drop `user@` and `:port` from the authority of an `ssh://` URL.
fn strip_ssh_authority(url: &str) -> String {
    let (authority, path) = url.split_once('/').unwrap_or((url, ""));
    let host = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);
    let host = match host.split_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    };
    if path.is_empty() {
        host.to_string()
    } else {
        format!("{}/{}", host, path)
    }
}

fn strip_http_scheme(raw: &str) -> &str {
    strip_prefix_ignore_case(raw, "https://")
        .or_else(|| strip_prefix_ignore_case(raw, "http://"))
        .unwrap_or(raw)
}

/// ASCII case-insensitive `strip_prefix`.
fn strip_prefix_ignore_case<'a>(raw: &'a str, prefix: &str) -> Option<&'a str> {
    let head = raw.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&raw[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> Option<String> {
        normalize(raw).map(|id| id.to_string())
    }

    #[test]
    fn equivalent_syntaxes_share_one_identifier() {
        let expected = Some("github.com/datadog/web-ui".to_string());
        assert_eq!(norm("git@github.com:DataDog/web-ui.git"), expected);
        assert_eq!(norm("https://github.com/DataDog/web-ui.git"), expected);
        assert_eq!(norm("GITHUB.COM/DataDog/Web-UI"), expected);
        assert_eq!(norm("http://github.com/DataDog/web-ui/"), expected);
        assert_eq!(norm("ssh://git@github.com:22/DataDog/web-ui.git"), expected);
        assert_eq!(norm("  github.com/datadog/web-ui.git//  "), expected);
    }

    #[test]
    fn scheme_is_matched_case_insensitively() {
        let expected = Some("github.com/datadog/web-ui".to_string());
        assert_eq!(norm("HTTPS://GitHub.com/DataDog/web-ui.git"), expected);
        assert_eq!(norm("Http://github.com/DataDog/web-ui"), expected);
        assert_eq!(norm("SSH://git@github.com/DataDog/web-ui.git"), expected);
        assert_eq!(
            norm("git@SSH.dev.azure.com:V3/Org/Project/Repo"),
            Some("dev.azure.com/org/project/repo".to_string())
        );
    }

    #[test]
    fn whitespace_before_git_suffix_is_trimmed() {
        assert_eq!(
            norm("github.com/org/repo/ .git"),
            Some("github.com/org/repo".to_string())
        );
    }

    #[test]
    fn provider_shorthand_drops_ssh_prefix_and_version() {
        assert_eq!(
            norm("git@ssh.dev.azure.com:v3/Org/Project/Repo"),
            Some("dev.azure.com/org/project/repo".to_string())
        );
        assert_eq!(
            norm("https://dev.azure.com/Org/Project/Repo"),
            norm("git@ssh.dev.azure.com:v3/Org/Project/Repo")
        );
    }

    #[test]
    fn scp_like_without_v3_is_generic_ssh() {
        assert_eq!(
            norm("git@ssh.example.com:team/tool.git"),
            Some("ssh.example.com/team/tool".to_string())
        );
    }

    #[test]
    fn empty_input_has_no_identifier() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("https://"), None);
        assert_eq!(normalize(".git"), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "git@github.com:DataDog/web-ui.git",
            "https://gitlab.com/Group/Sub/Project.git/",
            "git@ssh.dev.azure.com:v3/Org/Project/Repo",
            "ssh://git@bitbucket.org/team/repo.git",
            "GITHUB.COM/DataDog/Web-UI",
            "HTTPS://GitHub.com/DataDog/web-ui.git",
            "SSH://git@GitHub.com:22/DataDog/web-ui.git",
            "github.com/org/repo/ .git",
            "github.com/org/repo.git.git/",
        ] {
            let once = normalize(raw).unwrap();
            let twice = normalize(once.as_str()).unwrap();
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }

    #[test]
    fn repo_name_is_last_segment() {
        let id = normalize("https://gitlab.com/group/sub/project").unwrap();
        assert_eq!(id.repo_name(), "project");
        assert_eq!(repo_name(Some(&id)), Some("project"));
        assert_eq!(repo_name(None), None);
    }

    #[test]
    fn https_with_credentials_is_not_mistaken_for_scp() {
        assert_eq!(
            norm("https://user@github.com/org/repo.git"),
            Some("user@github.com/org/repo".to_string())
        );
    }
}
