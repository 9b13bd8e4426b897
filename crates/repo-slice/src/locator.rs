use std::fmt;

use serde::Serialize;

use crate::error::FetchError;

const GITHUB_HOST: &str = "github.com";

/// Which hosting backend a repository lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    GitHub,
    GitLab,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub => write!(f, "github"),
            Self::GitLab => write!(f, "gitlab"),
        }
    }
}

/// A repository URL broken into its parts.
///
/// `raw_suffix` is everything after `/tree/` (GitHub) or `/-/tree/` (GitLab).
/// It still mixes the ref and the sub-path; see [`crate::resolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoReference {
    pub provider: ProviderKind,
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub raw_suffix: String,
}

/// Parse a repository URL.
///
/// Accepted shapes:
/// - `https://github.com/{owner}/{repo}[/tree/{suffix}]`
/// - `https://{host}/{owner}/{repo}[/-/tree/{suffix}]` (any GitLab instance)
pub fn parse(url: &str) -> Result<RepoReference, FetchError> {
    let url = url.strip_suffix('/').unwrap_or(url);

    let Some(rest) = url.strip_prefix("https://") else {
        return Err(invalid_url());
    };

    if let Some(reference) = match_shape(rest, ProviderKind::GitHub) {
        return Ok(reference);
    }

    match_shape(rest, ProviderKind::GitLab).ok_or_else(invalid_url)
}

fn match_shape(rest: &str, provider: ProviderKind) -> Option<RepoReference> {
    let (host, rest) = rest.split_once('/')?;
    if host.is_empty() {
        return None;
    }
    if provider == ProviderKind::GitHub && host != GITHUB_HOST {
        return None;
    }

    let (owner, rest) = rest.split_once('/')?;
    let (repo, trailing) = match rest.split_once('/') {
        Some((repo, trailing)) => (repo, Some(trailing)),
        None => (rest, None),
    };
    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    let marker = match provider {
        ProviderKind::GitHub => "tree/",
        ProviderKind::GitLab => "-/tree/",
    };

    let raw_suffix = match trailing {
        None => "",
        Some(trailing) => match trailing.strip_prefix(marker) {
            Some(suffix) if !suffix.is_empty() => suffix,
            _ => return None,
        },
    };

    Some(RepoReference {
        provider,
        host: host.to_owned(),
        owner: owner.to_owned(),
        repo: repo.to_owned(),
        raw_suffix: raw_suffix.to_owned(),
    })
}

fn invalid_url() -> FetchError {
    FetchError::InvalidUrl(
        "invalid repository URL; expected one of: \
         https://github.com/owner/repo, \
         https://github.com/owner/repo/tree/branch/path, \
         https://gitlab.example.com/owner/repo, \
         https://gitlab.example.com/owner/repo/-/tree/branch/path"
            .into(),
    )
}
