pub mod content;
pub mod entry;
pub mod error;
pub mod export;
pub mod locator;
pub mod provider;
pub mod resolver;

pub use content::{ContentSource, fetch_all, fetch_all_buffered, provider_for_content_url};
pub use entry::{
    EntryKind, FetchedFile, References, ResolvedLocation, SelectedFile, TreeEntry,
};
pub use error::{FetchError, classify};
pub use export::{
    ArchiveFormat, ExportError, TEXT_FILE_NAME, TextSection, parse_text, to_archive, to_tarball,
    to_text,
};
pub use locator::{ProviderKind, RepoReference, parse as parse_url};
pub use provider::{Browse, Provider, browse};
pub use resolver::resolve;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
