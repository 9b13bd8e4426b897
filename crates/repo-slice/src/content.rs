use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};

use crate::entry::{FetchedFile, SelectedFile};
use crate::error::FetchError;
use crate::locator::ProviderKind;

const GITLAB_API_MARKER: &str = "/api/v4/projects/";

/// Something that can download the raw text behind a content URL.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_raw(&self, url: &str, token: Option<&str>) -> Result<String, FetchError>;
}

#[async_trait::async_trait]
impl<T: ContentSource + ?Sized> ContentSource for Arc<T> {
    async fn fetch_raw(&self, url: &str, token: Option<&str>) -> Result<String, FetchError> {
        (**self).fetch_raw(url, token).await
    }
}

/// Guess which provider issued a content URL from its shape.
///
/// GitLab raw-file URLs go through `/api/v4/projects/`; everything else is
/// treated as GitHub.
pub fn provider_for_content_url(url: &str) -> ProviderKind {
    if url.contains(GITLAB_API_MARKER) {
        ProviderKind::GitLab
    } else {
        ProviderKind::GitHub
    }
}

/// Download every selected file, one at a time, in selection order.
///
/// The first failure aborts the batch and is returned; files fetched
/// before it are discarded.
pub async fn fetch_all(
    source: &dyn ContentSource,
    selection: &[SelectedFile],
    token: Option<&str>,
) -> Result<Vec<FetchedFile>, FetchError> {
    if selection.is_empty() {
        return Err(FetchError::EmptySelection);
    }

    let mut fetched = Vec::with_capacity(selection.len());
    for file in selection {
        fetched.push(fetch_one(source, file, token).await?);
    }

    tracing::info!(files = fetched.len(), "fetched selected files");
    Ok(fetched)
}

/// Like [`fetch_all`], but keeps up to `limit` requests in flight.
///
/// Output order still matches the selection, and the error returned is the
/// one of the earliest failing file in selection order.
pub async fn fetch_all_buffered(
    source: &dyn ContentSource,
    selection: &[SelectedFile],
    token: Option<&str>,
    limit: usize,
) -> Result<Vec<FetchedFile>, FetchError> {
    if selection.is_empty() {
        return Err(FetchError::EmptySelection);
    }

    let fetched: Vec<FetchedFile> = futures::stream::iter(selection)
        .map(|file| fetch_one(source, file, token))
        .buffered(limit.max(1))
        .try_collect()
        .await?;

    tracing::info!(files = fetched.len(), limit, "fetched selected files");
    Ok(fetched)
}

async fn fetch_one(
    source: &dyn ContentSource,
    file: &SelectedFile,
    token: Option<&str>,
) -> Result<FetchedFile, FetchError> {
    tracing::debug!(path = %file.path, url = %file.content_url, "fetching file");
    let text = source.fetch_raw(&file.content_url, token).await?;
    Ok(FetchedFile {
        path: file.path.clone(),
        content_url: file.content_url.clone(),
        text,
    })
}
