use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use repo_slice::{
    ContentSource, FetchedFile, Provider, SelectedFile, TEXT_FILE_NAME, TreeEntry, browse,
    fetch_all, fetch_all_buffered, to_text,
};

use crate::config::OutputFormat;

/// Options for one export run.
pub struct ExportRequest<'a> {
    pub raw_suffix: &'a str,
    /// Files or directories to include; empty means every file.
    pub paths: &'a [String],
    pub format: OutputFormat,
    pub output: Option<&'a Path>,
    pub token: Option<&'a str>,
    /// Requests in flight. `1` fetches strictly one file at a time.
    pub concurrency: usize,
}

pub async fn run(
    provider: &dyn Provider,
    content: &dyn ContentSource,
    request: &ExportRequest<'_>,
) -> Result<()> {
    let files = collect(provider, content, request).await?;

    match write_output(&files, request.format, request.output)? {
        Some(path) => eprintln!("Wrote {} files to {}", files.len(), path.display()),
        None => eprintln!("Wrote {} files", files.len()),
    }
    Ok(())
}

/// Browse, select, and download the requested files.
pub async fn collect(
    provider: &dyn Provider,
    content: &dyn ContentSource,
    request: &ExportRequest<'_>,
) -> Result<Vec<FetchedFile>> {
    let listing = browse(provider, request.raw_suffix).await?;
    let selection = select_entries(&listing.entries, request.paths);
    tracing::info!(
        selected = selection.len(),
        listed = listing.entries.len(),
        "selected files"
    );

    let files = if request.concurrency <= 1 {
        fetch_all(content, &selection, request.token).await?
    } else {
        fetch_all_buffered(content, &selection, request.token, request.concurrency).await?
    };
    Ok(files)
}

/// Files among `entries` that equal or sit below one of `paths`, in tree
/// order. With no paths, every file.
pub fn select_entries(entries: &[TreeEntry], paths: &[String]) -> Vec<SelectedFile> {
    let wanted: Vec<&str> = paths
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect();

    entries
        .iter()
        .filter(|entry| entry.is_blob())
        .filter(|entry| {
            wanted.is_empty()
                || wanted.iter().any(|p| {
                    entry.path == *p
                        || entry
                            .path
                            .strip_prefix(p)
                            .is_some_and(|rest| rest.starts_with('/'))
                })
        })
        .map(TreeEntry::select)
        .collect()
}

/// Where to write an export: `output` itself, or `default_name` inside it
/// when it is a directory, or `default_name` in the working directory.
fn target_path(output: Option<&Path>, default_name: &str) -> PathBuf {
    match output {
        Some(dir) if dir.is_dir() => dir.join(default_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_name),
    }
}

/// Write `files` in `format`. Returns the path written, or `None` when text
/// went to stdout.
pub fn write_output(
    files: &[FetchedFile],
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<Option<PathBuf>> {
    match format.archive() {
        None => {
            let document = to_text(files);
            if output.is_none() {
                let mut out = std::io::stdout().lock();
                out.write_all(document.as_bytes())?;
                out.flush()?;
                return Ok(None);
            }
            let path = target_path(output, TEXT_FILE_NAME);
            std::fs::write(&path, document)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(Some(path))
        }
        Some(archive) => {
            let path = target_path(output, archive.default_file_name());
            let bytes = archive.write(files)?;
            std::fs::write(&path, bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(Some(path))
        }
    }
}
