/// Errors that can occur while locating, browsing, or fetching a repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    InvalidUrl(String),

    #[error(
        "API rate limit exceeded. Try again later or provide a valid access token to increase your rate limit."
    )]
    RateLimited,

    #[error(
        "repository, branch, or path not found. Check that the URL, branch/tag, and path are correct and accessible."
    )]
    NotFound,

    #[error("failed to fetch repository data (HTTP {0})")]
    Transport(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("no files selected")]
    EmptySelection,
}

impl FetchError {
    /// Short advice for a person who hit this error.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidUrl(_) => Some("copy the URL from the repository page in your browser"),
            Self::RateLimited => Some("pass --token or set GITHUB_TOKEN / GITLAB_TOKEN"),
            Self::NotFound => Some(
                "private repositories need a token; also check the branch or tag and path exist",
            ),
            Self::EmptySelection => Some("select at least one file with --path"),
            _ => None,
        }
    }
}

/// Map a failed provider response onto a domain error.
///
/// `remaining_quota` is the raw value of the provider's remaining-requests
/// header when the response carried one.
pub fn classify(status: u16, remaining_quota: Option<&str>) -> FetchError {
    let quota_exhausted = remaining_quota
        .and_then(|value| value.trim().parse::<u64>().ok())
        .is_some_and(|remaining| remaining == 0);

    match status {
        403 if quota_exhausted => FetchError::RateLimited,
        404 => FetchError::NotFound,
        other => FetchError::Transport(other),
    }
}
