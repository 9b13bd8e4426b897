use repo_slice::{Provider, ProviderKind, RepoReference};

use crate::github::{GitHubConfig, GitHubProvider};
use crate::gitlab::{GitLabConfig, GitLabProvider};

/// Settings shared by every provider built from a URL.
#[derive(Debug, Clone, Default)]
pub struct ForgeOptions {
    pub token: Option<String>,
    /// Replaces `https://api.github.com`.
    pub github_api_base: Option<String>,
    /// Replaces `https://{host}` for GitLab instances.
    pub gitlab_api_base: Option<String>,
}

/// Build the provider that serves `reference`.
pub fn provider_for(reference: &RepoReference, options: &ForgeOptions) -> Box<dyn Provider> {
    match reference.provider {
        ProviderKind::GitHub => Box::new(GitHubProvider::new(GitHubConfig {
            owner: reference.owner.clone(),
            repo: reference.repo.clone(),
            token: options.token.clone(),
            api_base_url: options.github_api_base.clone(),
        })),
        ProviderKind::GitLab => Box::new(GitLabProvider::new(GitLabConfig {
            host: reference.host.clone(),
            owner: reference.owner.clone(),
            repo: reference.repo.clone(),
            token: options.token.clone(),
            api_base_url: options.gitlab_api_base.clone(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_backend_from_url() {
        let options = ForgeOptions::default();

        let github = repo_slice::parse_url("https://github.com/acme/widgets").unwrap();
        assert_eq!(provider_for(&github, &options).kind(), ProviderKind::GitHub);

        let gitlab = repo_slice::parse_url("https://gitlab.com/acme/widgets/-/tree/main").unwrap();
        assert_eq!(provider_for(&gitlab, &options).kind(), ProviderKind::GitLab);
    }

    #[test]
    fn gitlab_raw_urls_use_the_url_host() {
        let reference =
            repo_slice::parse_url("https://git.example.org/team/tool/-/tree/main").unwrap();
        let provider = provider_for(&reference, &ForgeOptions::default());
        let url = provider.raw_content_url("main", "a.txt").unwrap();
        assert!(url.starts_with("https://git.example.org/api/v4/projects/team%2Ftool/"));
    }
}
