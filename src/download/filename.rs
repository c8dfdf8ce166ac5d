//! Asset URL normalization, extension detection, and on-disk naming.
//!
//! Files inside a chapter folder are named by list position only
//! (`001.jpg`, `002.png`, ...), so a failed asset leaves a gap and never
//! shifts the index of the assets after it.

use std::path::{Component, Path};

use url::Url;

use super::constants::INDEX_PAD_WIDTH;

/// Returns true for inline `data:` URLs, which carry no downloadable asset.
#[must_use]
pub fn is_inline_data(url: &str) -> bool {
    url.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Returns true when the URL's file name contains one of the placeholder
/// fragments (case-insensitive). Host, directories and query are ignored,
/// so `/downloading/001.jpg` is a real asset while `/img/loading.gif` is not.
#[must_use]
pub fn is_placeholder<S: AsRef<str>>(url: &str, patterns: &[S]) -> bool {
    let name = file_segment(url).to_ascii_lowercase();
    if name.is_empty() {
        return false;
    }
    patterns
        .iter()
        .map(AsRef::as_ref)
        .filter(|pattern| !pattern.is_empty())
        .any(|pattern| name.contains(&pattern.to_ascii_lowercase()))
}

/// Last path segment of an absolute or relative URL.
fn file_segment(url: &str) -> String {
    let normalized = normalize_asset_url(url);
    if let Ok(parsed) = Url::parse(&normalized) {
        return parsed
            .path_segments()
            .and_then(Iterator::last)
            .unwrap_or_default()
            .to_string();
    }
    let path = normalized.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Trims the URL and gives protocol-relative URLs (`//host/a.jpg`) an
/// explicit `https:` scheme.
#[must_use]
pub fn normalize_asset_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("//") {
        format!("https:{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Derives the file extension (with leading dot, lowercase) for an asset URL.
///
/// The query string and fragment are ignored. Extensions outside `allowed`
/// and URLs without one fall back to `default_ext`.
#[must_use]
pub fn asset_extension<S: AsRef<str>>(url: &str, allowed: &[S], default_ext: &str) -> String {
    let found = extension_from_url(url)
        .filter(|ext| allowed.iter().any(|a| a.as_ref().eq_ignore_ascii_case(ext)));
    found.unwrap_or_else(|| default_ext.to_lowercase())
}

pub(crate) fn extension_from_url(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Not absolute: strip query/fragment by hand.
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let last_segment = path.rsplit('/').next()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = &last_segment[dot_index..];
    if ext.len() <= 1 || ext.len() > 12 {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Builds the on-disk file name for the asset at 1-based `index`.
#[must_use]
pub fn asset_file_name(index: usize, extension: &str) -> String {
    format!("{index:0width$}{extension}", width = INDEX_PAD_WIDTH)
}

/// Sanitizes a name for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
