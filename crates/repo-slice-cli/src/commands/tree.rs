use std::io::{self, Write};

use anyhow::Result;
use repo_slice::{Browse, Provider, browse};

pub async fn run(provider: &dyn Provider, raw_suffix: &str, json: bool) -> Result<()> {
    let listing = browse(provider, raw_suffix).await?;

    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &listing.entries)?;
        writeln!(out)?;
    } else {
        render_outline(&listing, &mut out)?;
    }
    Ok(())
}

/// Print the listing as an indented outline, one entry per line.
///
/// Directories end in `/`. Indentation follows depth below the browsed
/// sub-path.
pub fn render_outline(listing: &Browse, out: &mut impl Write) -> io::Result<()> {
    let location = &listing.location;
    let git_ref = if location.git_ref.is_empty() {
        "(default branch)"
    } else {
        location.git_ref.as_str()
    };
    writeln!(out, "{git_ref}:/{}", location.subpath)?;

    let base_depth = location
        .subpath
        .split('/')
        .filter(|s| !s.is_empty())
        .count();

    for entry in &listing.entries {
        let depth = entry.path.split('/').count().saturating_sub(base_depth + 1);
        let name = entry.path.rsplit('/').next().unwrap_or(&entry.path);
        let marker = if entry.is_blob() { "" } else { "/" };
        writeln!(out, "{}{name}{marker}", "  ".repeat(depth + 1))?;
    }

    if listing.entries.is_empty() {
        writeln!(out, "  (empty)")?;
    }
    Ok(())
}
