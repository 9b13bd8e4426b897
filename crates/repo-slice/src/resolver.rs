use crate::entry::ResolvedLocation;

/// Split a URL's trailing segment into a ref and a sub-path.
///
/// The suffix of `.../tree/release-1/src` cannot be split without knowing
/// which refs exist: `release-1` could be a branch with `src` inside it, or
/// `release-1/src` could itself be a branch. The longest branch or tag name
/// that equals the suffix or is followed by `/` in it wins. When nothing
/// matches, the whole suffix is used as the ref.
pub fn resolve(raw_suffix: &str, branches: &[String], tags: &[String]) -> ResolvedLocation {
    if raw_suffix.is_empty() {
        return ResolvedLocation::default();
    }

    let best = branches
        .iter()
        .chain(tags)
        .map(String::as_str)
        .filter_map(|candidate| split_after(raw_suffix, candidate).map(|rest| (candidate, rest)))
        .max_by_key(|(candidate, _)| candidate.len());

    match best {
        Some((git_ref, subpath)) => {
            tracing::debug!(git_ref, subpath, "matched ref in URL suffix");
            ResolvedLocation::new(git_ref, subpath)
        }
        None => {
            tracing::debug!(raw_suffix, "no known ref matches, using whole suffix as ref");
            ResolvedLocation::new(raw_suffix, "")
        }
    }
}

/// Returns the sub-path left after `candidate` when it is a whole-segment
/// prefix of `suffix`.
fn split_after<'a>(suffix: &'a str, candidate: &str) -> Option<&'a str> {
    if candidate.is_empty() {
        return None;
    }
    let rest = suffix.strip_prefix(candidate)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('/')
}
