use repo_slice::provider::root_relative;
use repo_slice::{
    EntryKind, FetchError, Provider, ProviderKind, References, ResolvedLocation, TreeEntry,
};
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;

use crate::transport::{self, USER_AGENT};

/// Rows per tree call. Only the first page is read.
const TREE_PAGE_SIZE: &str = "100";

/// Configuration for one project on a GitLab instance.
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// Instance host, e.g. `gitlab.com`.
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub token: Option<String>,
    /// Overrides `https://{host}`.
    pub api_base_url: Option<String>,
}

/// Lists refs and trees of a GitLab project through the v4 REST API.
pub struct GitLabProvider {
    config: GitLabConfig,
    client: reqwest::Client,
}

impl GitLabProvider {
    pub fn new(config: GitLabConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_base(&self) -> String {
        match &self.config.api_base_url {
            Some(base) => base.clone(),
            None => format!("https://{}", self.config.host),
        }
    }

    /// `{base}/api/v4/projects/{owner%2Frepo}/{tail...}`
    fn project_url(&self, tail: &[&str], query: &[(&str, &str)]) -> Result<Url, FetchError> {
        let project = format!("{}/{}", self.config.owner, self.config.repo);
        let mut segments = vec!["api", "v4", "projects", project.as_str()];
        segments.extend_from_slice(tail);
        transport::endpoint(&self.api_base(), &segments, query)
    }

    fn build_request(&self, url: Url) -> RequestBuilder {
        tracing::debug!(%url, "gitlab request");
        let request = self.client.get(url).header("User-Agent", USER_AGENT);
        transport::authorize(request, ProviderKind::GitLab, self.config.token.as_deref())
    }

    /// Names from `repository/branches` or `repository/tags`.
    async fn ref_names(&self, collection: &str) -> Result<Vec<String>, FetchError> {
        let url = self.project_url(&["repository", collection], &[])?;
        let rows: Vec<NamedRef> = transport::fetch_json(self.build_request(url)).await?;
        Ok(rows.into_iter().map(|row| row.name).collect())
    }
}

#[async_trait::async_trait]
impl Provider for GitLabProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    async fn list_references(&self) -> Result<References, FetchError> {
        let (branches, tags) =
            futures::try_join!(self.ref_names("branches"), self.ref_names("tags"))?;
        tracing::debug!(
            branches = branches.len(),
            tags = tags.len(),
            "listed gitlab references"
        );
        Ok(References { branches, tags })
    }

    async fn list_tree(&self, location: &ResolvedLocation) -> Result<Vec<TreeEntry>, FetchError> {
        let mut query = Vec::with_capacity(4);
        if !location.git_ref.is_empty() {
            query.push(("ref", location.git_ref.as_str()));
        }
        if !location.subpath.is_empty() {
            query.push(("path", location.subpath.as_str()));
        }
        query.push(("recursive", "true"));
        query.push(("per_page", TREE_PAGE_SIZE));

        let url = self.project_url(&["repository", "tree"], &query)?;
        let rows: Vec<TreeRow> = transport::fetch_json(self.build_request(url)).await?;

        rows.into_iter()
            .map(|row| -> Result<TreeEntry, FetchError> {
                let path = root_relative(&location.subpath, &row.path);
                let content_url = self.raw_content_url(&location.git_ref, &path)?;
                Ok(TreeEntry {
                    path,
                    kind: EntryKind::parse(&row.entry_type),
                    content_url,
                    handle: row.id,
                })
            })
            .collect()
    }

    fn raw_content_url(&self, git_ref: &str, path: &str) -> Result<String, FetchError> {
        let mut query = Vec::with_capacity(1);
        if !git_ref.is_empty() {
            query.push(("ref", git_ref));
        }
        let url = self.project_url(&["repository", "files", path, "raw"], &query)?;
        Ok(url.into())
    }
}

/// A row of `repository/branches` or `repository/tags`.
#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

/// A row of `repository/tree`.
#[derive(Debug, Deserialize)]
struct TreeRow {
    id: Option<String>,
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
}
