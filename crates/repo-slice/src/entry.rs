use std::fmt;

use serde::Serialize;

/// Where inside a repository a browse starts.
///
/// An empty `git_ref` means the provider's default branch; an empty
/// `subpath` means the repository root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedLocation {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub subpath: String,
}

impl ResolvedLocation {
    pub fn new(git_ref: impl Into<String>, subpath: impl Into<String>) -> Self {
        Self {
            git_ref: git_ref.into(),
            subpath: subpath.into(),
        }
    }
}

/// Branch and tag names published by a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    pub branches: Vec<String>,
    pub tags: Vec<String>,
}

/// What a tree row points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Tree,
    Blob,
    /// Anything else the provider reports, e.g. `commit` for submodules.
    Other(String),
}

impl EntryKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "tree" => Self::Tree,
            "blob" => Self::Blob,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EntryKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One row of a repository tree.
///
/// `path` is relative to the repository root regardless of which sub-path
/// was browsed. `handle` is the provider's content identifier when it
/// reports one (a blob or tree SHA).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    pub content_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }

    /// The selection a caller would make to export this entry.
    pub fn select(&self) -> SelectedFile {
        SelectedFile {
            path: self.path.clone(),
            content_url: self.content_url.clone(),
        }
    }
}

/// A file the caller chose for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: String,
    pub content_url: String,
}

impl SelectedFile {
    pub fn new(path: impl Into<String>, content_url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_url: content_url.into(),
        }
    }
}

/// A selected file together with its downloaded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub path: String,
    pub content_url: String,
    pub text: String,
}
