//! Upstream URL construction with traversal protection.
//!
//! The inbound path is appended to the base URL verbatim. Because URL parsing
//! normalizes dot segments, any segment that could climb out of the base path
//! is rejected before parsing instead of being silently collapsed.

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path segment '{0}' is not allowed")]
    Traversal(String),

    #[error("path does not form a valid URL: {0}")]
    Invalid(String),
}

/// Join `base` and `path`, appending the raw `query` unchanged.
///
/// Exactly one `/` separates the base from the path. Empty segments are kept.
pub fn target_url(base: &Url, path: &str, query: Option<&str>) -> Result<Url, PathError> {
    let path = path.trim_start_matches('/');

    for segment in path.split('/') {
        check_segment(segment)?;
    }

    let mut target = String::with_capacity(base.as_str().len() + path.len() + 16);
    target.push_str(base.as_str().trim_end_matches('/'));
    target.push('/');
    target.push_str(path);

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }

    Url::parse(&target).map_err(|e| PathError::Invalid(e.to_string()))
}

fn check_segment(segment: &str) -> Result<(), PathError> {
    let lowered = segment.to_ascii_lowercase();
    let decoded_dots = lowered.replace("%2e", ".");

    let is_dot_segment = decoded_dots == "." || decoded_dots == "..";
    let has_hidden_separator =
        lowered.contains("%2f") || lowered.contains("%5c") || segment.contains('\\');

    if is_dot_segment || has_hidden_separator {
        return Err(PathError::Traversal(segment.to_string()));
    }
    Ok(())
}
