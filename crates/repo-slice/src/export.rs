//! Turning fetched files into a text document or an archive.
//!
//! Nothing here touches the network.
//!
//! Text document layout, one section per file:
//!
//! ```text
//! ================================================================
//! File: src/lib.rs
//! Length: 1234
//! ================================================================
//! <exactly 1234 bytes of content>
//! <blank line>
//! ```
//!
//! The byte length makes the layout unambiguous even when a file itself
//! contains rule lines, so [`parse_text`] recovers the sections exactly.
//! In the `File:` line, `\`, line feed and carriage return in the path are
//! written as `\\`, `\n` and `\r`.

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::GzEncoder;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::entry::FetchedFile;

const RULE: &str = "================================================================";
const PATH_LABEL: &str = "File: ";
const LENGTH_LABEL: &str = "Length: ";
const SECTION_END: &str = "\n\n";

/// Default file name for a text export.
pub const TEXT_FILE_NAME: &str = "prompt.txt";

/// Errors that can occur while building or reading an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed text export at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: String },
}

/// Archive container for [`to_archive`] and [`to_tarball`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Zip => "partial_repo.zip",
            Self::TarGz => "partial_repo.tar.gz",
        }
    }

    /// Build an archive of `files` in this format.
    pub fn write(self, files: &[FetchedFile]) -> Result<Vec<u8>, ExportError> {
        match self {
            Self::Zip => to_archive(files),
            Self::TarGz => to_tarball(files),
        }
    }
}

/// One section recovered by [`parse_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSection {
    pub path: String,
    pub text: String,
}

/// Concatenate files into one annotated document, in input order.
pub fn to_text(files: &[FetchedFile]) -> String {
    let capacity = files
        .iter()
        .map(|f| f.text.len() + f.path.len() + 2 * RULE.len() + 32)
        .sum();
    let mut out = String::with_capacity(capacity);

    for file in files {
        out.push_str(RULE);
        out.push('\n');
        out.push_str(PATH_LABEL);
        out.push_str(&escape_path(&file.path));
        out.push('\n');
        out.push_str(LENGTH_LABEL);
        out.push_str(&file.text.len().to_string());
        out.push('\n');
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&file.text);
        out.push_str(SECTION_END);
    }

    out
}

/// Split a document produced by [`to_text`] back into its sections.
pub fn parse_text(document: &str) -> Result<Vec<TextSection>, ExportError> {
    let mut sections = Vec::new();
    let mut rest = document;

    while !rest.is_empty() {
        let offset = document.len() - rest.len();
        let malformed = |reason: &str| ExportError::Malformed {
            offset,
            reason: reason.to_owned(),
        };

        let after_rule = strip_rule(rest).ok_or_else(|| malformed("expected opening rule"))?;
        let (path_line, after_path) = after_rule
            .split_once('\n')
            .ok_or_else(|| malformed("missing path line"))?;
        let path = path_line
            .strip_prefix(PATH_LABEL)
            .ok_or_else(|| malformed("missing `File:` label"))?;
        let path = unescape_path(path).ok_or_else(|| malformed("invalid escape in path"))?;
        let (length_line, after_length) = after_path
            .split_once('\n')
            .ok_or_else(|| malformed("missing length line"))?;
        let length: usize = length_line
            .strip_prefix(LENGTH_LABEL)
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| malformed("invalid `Length:` line"))?;
        let body = strip_rule(after_length).ok_or_else(|| malformed("expected closing rule"))?;
        let text = body
            .get(..length)
            .ok_or_else(|| malformed("content shorter than declared length"))?;

        rest = body[length..]
            .strip_prefix(SECTION_END)
            .ok_or_else(|| malformed("missing section terminator"))?;

        sections.push(TextSection {
            path,
            text: text.to_owned(),
        });
    }

    Ok(sections)
}

fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape_path(escaped: &str) -> Option<String> {
    let mut path = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            path.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => path.push('\\'),
            'n' => path.push('\n'),
            'r' => path.push('\r'),
            _ => return None,
        }
    }
    Some(path)
}

fn strip_rule(s: &str) -> Option<&str> {
    s.strip_prefix(RULE)?.strip_prefix('\n')
}

/// Archive path for a file: one leading `/` removed.
fn archive_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Pack files into a zip archive at their repository paths.
pub fn to_archive(files: &[FetchedFile]) -> Result<Vec<u8>, ExportError> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        zip.start_file(archive_path(&file.path), options)?;
        zip.write_all(file.text.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Pack files into a gzip-compressed tar archive at their repository paths.
pub fn to_tarball(files: &[FetchedFile]) -> Result<Vec<u8>, ExportError> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut archive = tar::Builder::new(encoder);

    for file in files {
        let data = file.text.as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        archive.append_data(&mut header, archive_path(&file.path), data)?;
    }

    let encoder = archive.into_inner()?;
    Ok(encoder.finish()?)
}
