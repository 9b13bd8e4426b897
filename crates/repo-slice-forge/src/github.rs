use repo_slice::provider::prefix_subpath;
use repo_slice::{
    EntryKind, FetchError, Provider, ProviderKind, References, ResolvedLocation, TreeEntry,
};
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;

use crate::transport::{self, GITHUB_JSON, GITHUB_OBJECT, USER_AGENT};

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Configuration for one GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub token: Option<String>,
    /// Overrides `https://api.github.com`, e.g. for GitHub Enterprise or tests.
    pub api_base_url: Option<String>,
}

/// Lists refs and trees of a GitHub repository through the REST API.
///
/// Trees are fetched in two steps: the `(ref, subpath)` pair is resolved to
/// a tree SHA through the contents endpoint, then that tree is listed
/// recursively.
pub struct GitHubProvider {
    config: GitHubConfig,
    client: reqwest::Client,
}

impl GitHubProvider {
    pub fn new(config: GitHubConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_base(&self) -> &str {
        self.config
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
    }

    /// `{api}/repos/{owner}/{repo}/{tail...}`
    fn repo_url(&self, tail: &[&str], query: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut segments = vec!["repos", self.config.owner.as_str(), self.config.repo.as_str()];
        segments.extend_from_slice(tail);
        transport::endpoint(self.api_base(), &segments, query)
    }

    fn build_request(&self, url: Url, accept: &str) -> RequestBuilder {
        tracing::debug!(%url, "github request");
        let request = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", accept);
        transport::authorize(request, ProviderKind::GitHub, self.config.token.as_deref())
    }

    /// Names under `refs/{namespace}/`, e.g. `heads` or `tags`.
    async fn matching_refs(&self, namespace: &str) -> Result<Vec<String>, FetchError> {
        let url = self.repo_url(&["git", "matching-refs", namespace, ""], &[])?;
        let rows: Vec<RefRow> = transport::fetch_json(self.build_request(url, GITHUB_JSON)).await?;

        let prefix = format!("refs/{namespace}/");
        Ok(rows
            .into_iter()
            .filter_map(|row| row.git_ref.strip_prefix(&prefix).map(str::to_owned))
            .collect())
    }

    /// Resolve `(ref, subpath)` to the SHA of the tree it names.
    async fn resolve_handle(&self, location: &ResolvedLocation) -> Result<String, FetchError> {
        let mut tail = vec!["contents"];
        tail.extend(location.subpath.split('/').filter(|s| !s.is_empty()));
        if tail.len() == 1 {
            // keeps the trailing slash of `contents/` for the root
            tail.push("");
        }

        let query = ref_query(&location.git_ref);
        let url = self.repo_url(&tail, &query)?;
        let object: ContentObject =
            transport::fetch_json(self.build_request(url, GITHUB_OBJECT)).await?;

        // without a sha only the root can be addressed through the ref itself
        let handle = match object.sha {
            Some(sha) => sha,
            None if !location.subpath.is_empty() => {
                return Err(FetchError::Decode(format!(
                    "contents response for {} has no sha",
                    location.subpath
                )));
            }
            None if location.git_ref.is_empty() => "HEAD".to_owned(),
            None => location.git_ref.clone(),
        };
        tracing::debug!(%handle, subpath = %location.subpath, "resolved tree handle");
        Ok(handle)
    }
}

#[async_trait::async_trait]
impl Provider for GitHubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    async fn list_references(&self) -> Result<References, FetchError> {
        let (branches, tags) =
            futures::try_join!(self.matching_refs("heads"), self.matching_refs("tags"))?;
        tracing::debug!(
            branches = branches.len(),
            tags = tags.len(),
            "listed github references"
        );
        Ok(References { branches, tags })
    }

    async fn list_tree(&self, location: &ResolvedLocation) -> Result<Vec<TreeEntry>, FetchError> {
        let handle = self.resolve_handle(location).await?;

        let url = self.repo_url(&["git", "trees", handle.as_str()], &[("recursive", "1")])?;
        let response: TreeResponse =
            transport::fetch_json(self.build_request(url, GITHUB_JSON)).await?;

        if response.truncated {
            tracing::warn!(
                owner = %self.config.owner,
                repo = %self.config.repo,
                "tree response was truncated; results may be incomplete"
            );
        }

        response
            .tree
            .into_iter()
            .map(|row| -> Result<TreeEntry, FetchError> {
                let path = prefix_subpath(&location.subpath, &row.path);
                let content_url = match row.url {
                    Some(url) => url,
                    None => self.raw_content_url(&location.git_ref, &path)?,
                };
                Ok(TreeEntry {
                    path,
                    kind: EntryKind::parse(&row.entry_type),
                    content_url,
                    handle: row.sha,
                })
            })
            .collect()
    }

    fn raw_content_url(&self, git_ref: &str, path: &str) -> Result<String, FetchError> {
        let mut tail = vec!["contents"];
        tail.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = self.repo_url(&tail, &ref_query(git_ref))?;
        Ok(url.into())
    }
}

fn ref_query(git_ref: &str) -> Vec<(&str, &str)> {
    if git_ref.is_empty() {
        Vec::new()
    } else {
        vec![("ref", git_ref)]
    }
}

/// One row of `GET /repos/{owner}/{repo}/git/matching-refs/{prefix}`.
#[derive(Debug, Deserialize)]
struct RefRow {
    #[serde(rename = "ref")]
    git_ref: String,
}

/// Response from the contents API with the object media type.
/// `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Deserialize)]
struct ContentObject {
    sha: Option<String>,
}

/// Response from GitHub's Git Trees API.
/// `GET /repos/{owner}/{repo}/git/trees/{sha}?recursive=1`
#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeRow>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeRow {
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
    sha: Option<String>,
    url: Option<String>,
}
