use std::sync::Arc;

use crate::entry::{References, ResolvedLocation, TreeEntry};
use crate::error::FetchError;
use crate::locator::ProviderKind;
use crate::resolver;

/// A hosting backend that can list refs and trees for one repository.
///
/// Each implementation is bound to a single repository (owner, name, host)
/// and to the access token it was built with.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// All branch and tag names of the repository.
    async fn list_references(&self) -> Result<References, FetchError>;

    /// Split a URL suffix into ref and sub-path.
    /// Default implementation lists references and picks the longest match.
    async fn resolve_location(&self, raw_suffix: &str) -> Result<ResolvedLocation, FetchError> {
        if raw_suffix.is_empty() {
            return Ok(ResolvedLocation::default());
        }
        let references = self.list_references().await?;
        Ok(resolver::resolve(
            raw_suffix,
            &references.branches,
            &references.tags,
        ))
    }

    /// Every entry below `location`, with repository-root-relative paths,
    /// in the order the provider returned them.
    async fn list_tree(&self, location: &ResolvedLocation) -> Result<Vec<TreeEntry>, FetchError>;

    /// URL that serves the raw content of `path` at `git_ref`.
    fn raw_content_url(&self, git_ref: &str, path: &str) -> Result<String, FetchError>;
}

#[async_trait::async_trait]
impl<T: Provider + ?Sized> Provider for Arc<T> {
    fn kind(&self) -> ProviderKind {
        (**self).kind()
    }

    async fn list_references(&self) -> Result<References, FetchError> {
        (**self).list_references().await
    }

    async fn resolve_location(&self, raw_suffix: &str) -> Result<ResolvedLocation, FetchError> {
        (**self).resolve_location(raw_suffix).await
    }

    async fn list_tree(&self, location: &ResolvedLocation) -> Result<Vec<TreeEntry>, FetchError> {
        (**self).list_tree(location).await
    }

    fn raw_content_url(&self, git_ref: &str, path: &str) -> Result<String, FetchError> {
        (**self).raw_content_url(git_ref, path)
    }
}

/// Result of browsing a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Browse {
    pub location: ResolvedLocation,
    pub entries: Vec<TreeEntry>,
}

impl Browse {
    /// Entries that are files.
    pub fn blobs(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter().filter(|entry| entry.is_blob())
    }
}

/// Resolve `raw_suffix` and list the tree below it.
pub async fn browse(provider: &dyn Provider, raw_suffix: &str) -> Result<Browse, FetchError> {
    let location = provider.resolve_location(raw_suffix).await?;
    tracing::info!(
        provider = %provider.kind(),
        git_ref = %location.git_ref,
        subpath = %location.subpath,
        "listing tree"
    );
    let entries = provider.list_tree(&location).await?;
    Ok(Browse { location, entries })
}

/// Join a path reported relative to `subpath` onto it.
pub fn prefix_subpath(subpath: &str, path: &str) -> String {
    let subpath = subpath.trim_matches('/');
    if subpath.is_empty() {
        path.to_owned()
    } else {
        format!("{subpath}/{path}")
    }
}

/// Like [`prefix_subpath`], but leaves paths that already start with
/// `subpath/` alone.
pub fn root_relative(subpath: &str, path: &str) -> String {
    let trimmed = subpath.trim_matches('/');
    if !trimmed.is_empty()
        && path
            .strip_prefix(trimmed)
            .is_some_and(|rest| rest.starts_with('/'))
    {
        return path.to_owned();
    }
    prefix_subpath(subpath, path)
}

#[cfg(test)]
mod tests {
    use crate::test_support::InMemoryProvider;
    use crate::EntryKind;

    use super::*;

    fn repo() -> InMemoryProvider {
        let mut provider = InMemoryProvider::new(ProviderKind::GitHub);
        provider.add_branch("main");
        provider.add_branch("release");
        provider.add_branch("release-1");
        provider.add_tag("v1.0");
        provider.add_blob("release-1", "README.md");
        provider.add_tree("release-1", "src");
        provider.add_blob("release-1", "src/lib.rs");
        provider.add_blob("release-1", "src/main.rs");
        provider.add_blob("main", "README.md");
        provider
    }

    #[tokio::test]
    async fn browse_resolves_then_lists_subtree() {
        let provider = repo();
        let result = browse(&provider, "release-1/src").await.unwrap();

        assert_eq!(result.location, ResolvedLocation::new("release-1", "src"));
        let paths: Vec<&str> = result.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["src/lib.rs", "src/main.rs"]);
    }

    #[tokio::test]
    async fn browse_root_skips_reference_listing() {
        let provider = repo();
        let result = browse(&provider, "").await.unwrap();

        assert_eq!(result.location, ResolvedLocation::default());
        assert_eq!(provider.reference_calls(), 0);
    }

    #[tokio::test]
    async fn browse_surfaces_missing_ref() {
        let provider = repo();
        let result = browse(&provider, "nope/src").await;
        assert!(matches!(result, Err(FetchError::NotFound)));
    }

    #[tokio::test]
    async fn blobs_filters_directories() {
        let provider = repo();
        let result = browse(&provider, "release-1").await.unwrap();
        assert!(result.entries.iter().any(|e| e.kind == EntryKind::Tree));
        assert!(result.blobs().all(|e| e.kind == EntryKind::Blob));
        assert_eq!(result.blobs().count(), 3);
    }

    #[tokio::test]
    async fn shared_provider_delegates() {
        let provider: Arc<dyn Provider> = Arc::new(repo());
        let location = provider.resolve_location("main").await.unwrap();
        assert_eq!(location, ResolvedLocation::new("main", ""));
        assert_eq!(provider.kind(), ProviderKind::GitHub);
    }

    #[test]
    fn prefix_subpath_always_joins() {
        assert_eq!(prefix_subpath("src", "lib.rs"), "src/lib.rs");
        assert_eq!(prefix_subpath("src", "src/lib.rs"), "src/src/lib.rs");
        assert_eq!(prefix_subpath("", "lib.rs"), "lib.rs");
        assert_eq!(prefix_subpath("src/", "lib.rs"), "src/lib.rs");
    }

    #[test]
    fn root_relative_prefixes_subpath() {
        assert_eq!(root_relative("src", "lib.rs"), "src/lib.rs");
        assert_eq!(root_relative("", "lib.rs"), "lib.rs");
    }

    #[test]
    fn root_relative_keeps_already_rooted_paths() {
        assert_eq!(root_relative("src", "src/lib.rs"), "src/lib.rs");
        // a sibling that merely shares the name prefix is still prefixed
        assert_eq!(root_relative("src", "srcgen/x.rs"), "src/srcgen/x.rs");
    }
}
