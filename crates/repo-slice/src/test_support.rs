use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    ContentSource, EntryKind, FetchError, Provider, ProviderKind, References, ResolvedLocation,
    TreeEntry,
};

/// In-memory provider for testing. Holds one flat tree per ref.
///
/// An empty ref resolves to the first branch added.
pub struct InMemoryProvider {
    kind: ProviderKind,
    references: References,
    trees: HashMap<String, Vec<TreeEntry>>,
    reference_calls: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            references: References::default(),
            trees: HashMap::new(),
            reference_calls: AtomicUsize::new(0),
        }
    }

    pub fn add_branch(&mut self, name: &str) {
        self.references.branches.push(name.to_owned());
    }

    pub fn add_tag(&mut self, name: &str) {
        self.references.tags.push(name.to_owned());
    }

    pub fn add_blob(&mut self, git_ref: &str, path: &str) {
        self.add_entry(git_ref, path, EntryKind::Blob);
    }

    pub fn add_tree(&mut self, git_ref: &str, path: &str) {
        self.add_entry(git_ref, path, EntryKind::Tree);
    }

    /// How many times `list_references` was called.
    pub fn reference_calls(&self) -> usize {
        self.reference_calls.load(Ordering::SeqCst)
    }

    fn add_entry(&mut self, git_ref: &str, path: &str, kind: EntryKind) {
        let content_url = memory_url(git_ref, path);
        self.trees
            .entry(git_ref.to_owned())
            .or_default()
            .push(TreeEntry {
                path: path.to_owned(),
                kind,
                content_url,
                handle: None,
            });
    }

    fn effective_ref<'a>(&'a self, git_ref: &'a str) -> &'a str {
        if git_ref.is_empty() {
            self.references
                .branches
                .first()
                .map(String::as_str)
                .unwrap_or("")
        } else {
            git_ref
        }
    }
}

#[async_trait::async_trait]
impl Provider for InMemoryProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn list_references(&self) -> Result<References, FetchError> {
        self.reference_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.references.clone())
    }

    async fn list_tree(&self, location: &ResolvedLocation) -> Result<Vec<TreeEntry>, FetchError> {
        let tree = self
            .trees
            .get(self.effective_ref(&location.git_ref))
            .ok_or(FetchError::NotFound)?;

        if location.subpath.is_empty() {
            return Ok(tree.clone());
        }

        let prefix = format!("{}/", location.subpath);
        let entries: Vec<TreeEntry> = tree
            .iter()
            .filter(|entry| entry.path.starts_with(&prefix))
            .cloned()
            .collect();

        if entries.is_empty() {
            return Err(FetchError::NotFound);
        }
        Ok(entries)
    }

    fn raw_content_url(&self, git_ref: &str, path: &str) -> Result<String, FetchError> {
        Ok(memory_url(self.effective_ref(git_ref), path))
    }
}

fn memory_url(git_ref: &str, path: &str) -> String {
    format!("memory://{git_ref}/{path}")
}

/// Content source with canned responses per URL. Records every request.
#[derive(Default)]
pub struct ScriptedContent {
    responses: HashMap<String, Result<String, FetchError>>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(&mut self, url: impl Into<String>, text: impl Into<String>) {
        self.responses.insert(url.into(), Ok(text.into()));
    }

    pub fn fail(&mut self, url: impl Into<String>, error: FetchError) {
        self.responses.insert(url.into(), Err(error));
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.lock().iter().map(|(url, _)| url.clone()).collect()
    }

    /// Tokens passed with each request, in order.
    pub fn tokens(&self) -> Vec<Option<String>> {
        self.lock().iter().map(|(_, token)| token.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Option<String>)>> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl ContentSource for ScriptedContent {
    async fn fetch_raw(&self, url: &str, token: Option<&str>) -> Result<String, FetchError> {
        self.lock()
            .push((url.to_owned(), token.map(str::to_owned)));
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::NotFound))
    }
}
