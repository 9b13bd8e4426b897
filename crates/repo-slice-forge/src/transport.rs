use repo_slice::{ContentSource, FetchError, ProviderKind, classify, provider_for_content_url};
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

pub(crate) const USER_AGENT: &str = "repo-slice";

pub(crate) const GITHUB_JSON: &str = "application/vnd.github+json";
pub(crate) const GITHUB_OBJECT: &str = "application/vnd.github.object+json";
pub(crate) const GITHUB_RAW: &str = "application/vnd.github.v3.raw";

/// GitHub reports remaining quota as `X-RateLimit-Remaining`, GitLab as
/// `RateLimit-Remaining`.
const QUOTA_HEADERS: [&str; 2] = ["x-ratelimit-remaining", "ratelimit-remaining"];

/// Build `{base}/{segments...}?{query}`. Each segment is percent-encoded on
/// its own, so a segment may contain `/`.
pub(crate) fn endpoint(
    base: &str,
    segments: &[&str],
    query: &[(&str, &str)],
) -> Result<Url, FetchError> {
    let mut url = Url::parse(base)
        .map_err(|e| FetchError::InvalidUrl(format!("invalid API base URL {base}: {e}")))?;

    url.path_segments_mut()
        .map_err(|()| FetchError::InvalidUrl(format!("API base URL {base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
}

/// Attach the credential in the scheme `provider` expects.
pub(crate) fn authorize(
    request: RequestBuilder,
    provider: ProviderKind,
    token: Option<&str>,
) -> RequestBuilder {
    match (provider, token) {
        (_, None) => request,
        (ProviderKind::GitHub, Some(token)) => {
            request.header("Authorization", format!("token {token}"))
        }
        (ProviderKind::GitLab, Some(token)) => {
            request.header("Authorization", format!("Bearer {token}"))
        }
    }
}

/// Send a request; non-success statuses become classified errors.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response, FetchError> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let remaining = remaining_quota(response.headers());
    let error = classify(status.as_u16(), remaining.as_deref());
    tracing::debug!(
        status = status.as_u16(),
        url = %response.url(),
        remaining = remaining.as_deref().unwrap_or("-"),
        "provider request failed"
    );
    Err(error)
}

/// Send a request and decode its JSON body.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<T, FetchError> {
    send(request)
        .await?
        .json()
        .await
        .map_err(|e| FetchError::Decode(e.to_string()))
}

fn remaining_quota(headers: &HeaderMap) -> Option<String> {
    QUOTA_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Downloads raw file content from GitHub or GitLab URLs.
///
/// The auth scheme is picked per URL, so one client serves both providers.
pub struct HttpContentClient {
    client: reqwest::Client,
}

impl HttpContentClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, url: &str, token: Option<&str>) -> RequestBuilder {
        let provider = provider_for_content_url(url);
        let mut request = self.client.get(url).header("User-Agent", USER_AGENT);

        if provider == ProviderKind::GitHub {
            request = request.header("Accept", GITHUB_RAW);
        }

        authorize(request, provider, token)
    }
}

impl Default for HttpContentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ContentSource for HttpContentClient {
    async fn fetch_raw(&self, url: &str, token: Option<&str>) -> Result<String, FetchError> {
        send(self.build_request(url, token))
            .await?
            .text()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}
