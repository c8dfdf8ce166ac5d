//! Turns a chapter identifier into concrete request targets.
//!
//! Pure function of configuration: the URL template, padding widths and the
//! suffix list. The base variant always comes first; suffix variants follow
//! in declared order and model optional sub-chapters (`chap-12-5`).

use std::fmt;

use crate::download::filename::sanitize_filename;

use super::identifier::{ChapterIdentifier, ChapterNumber};

/// Placeholder in the URL template that receives the identifier token.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Naming rules for request URLs and chapter folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// URL template; [`ID_PLACEHOLDER`] is replaced, or the token appended.
    pub url_template: String,
    /// Zero-padding for the number inside the URL (0 = none).
    pub url_pad_width: usize,
    /// Suffix variants; `""` is the base variant.
    pub suffixes: Vec<String>,
    /// Numeric-mode folder prefix.
    pub folder_prefix: String,
    /// Zero-padding for the number in folder names.
    pub folder_pad_width: usize,
    /// Slug-mode folder prefix.
    pub slug_folder_prefix: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            url_template: String::new(),
            url_pad_width: 0,
            suffixes: vec![String::new()],
            folder_prefix: "Chap_".to_string(),
            folder_pad_width: 3,
            slug_folder_prefix: "Chapter_".to_string(),
        }
    }
}

/// One concrete attempt derived from a [`ChapterIdentifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterTarget {
    /// The identifier this target was derived from.
    pub identifier: ChapterIdentifier,
    /// Suffix variant; `None` for the base variant.
    pub suffix: Option<String>,
    /// URL to navigate to.
    pub request_url: String,
    /// Folder name under the output root.
    pub folder_name: String,
    /// Identifier text as it appears in the request URL (`05-1`, `one-shot`).
    pub url_token: String,
}

impl ChapterTarget {
    /// True for the base variant, whose absence is noteworthy.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.suffix.is_none()
    }
}

impl fmt::Display for ChapterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suffix {
            Some(suffix) => write!(f, "{}{suffix}", self.identifier),
            None => write!(f, "{}", self.identifier),
        }
    }
}

/// Resolves identifiers into ordered [`ChapterTarget`]s.
#[derive(Debug, Clone)]
pub struct ChapterResolver {
    settings: ResolverSettings,
    suffixes: Vec<String>,
}

impl ChapterResolver {
    /// Creates a resolver. Duplicate and blank suffixes collapse into the
    /// single leading base variant.
    #[must_use]
    pub fn new(settings: ResolverSettings) -> Self {
        let mut suffixes: Vec<String> = Vec::with_capacity(settings.suffixes.len());
        for suffix in &settings.suffixes {
            let suffix = suffix.trim();
            if !suffix.is_empty() && !suffixes.iter().any(|s| s == suffix) {
                suffixes.push(suffix.to_string());
            }
        }
        Self { settings, suffixes }
    }

    /// Returns the settings this resolver was built from.
    #[must_use]
    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Produces the targets for `identifier`: base first, then each suffix
    /// variant. Slug identifiers yield exactly one target.
    #[must_use]
    pub fn resolve(&self, identifier: &ChapterIdentifier) -> Vec<ChapterTarget> {
        match identifier {
            ChapterIdentifier::Slug(slug) => vec![self.slug_target(identifier, slug)],
            ChapterIdentifier::Number(number) => std::iter::once(None)
                .chain(self.suffixes.iter().map(Some))
                .map(|suffix| self.numeric_target(identifier, *number, suffix))
                .collect(),
        }
    }

    /// Resolves every identifier in order.
    #[must_use]
    pub fn resolve_all(&self, identifiers: &[ChapterIdentifier]) -> Vec<ChapterTarget> {
        identifiers.iter().flat_map(|id| self.resolve(id)).collect()
    }

    fn numeric_target(
        &self,
        identifier: &ChapterIdentifier,
        number: ChapterNumber,
        suffix: Option<&String>,
    ) -> ChapterTarget {
        let suffix_text = suffix.map_or("", String::as_str);
        let url_token = format!("{}{suffix_text}", number.padded(self.settings.url_pad_width));
        let folder_name = sanitize_filename(&format!(
            "{}{}{}",
            self.settings.folder_prefix,
            number.padded(self.settings.folder_pad_width),
            suffix_marker(suffix_text)
        ));

        ChapterTarget {
            identifier: identifier.clone(),
            suffix: suffix.cloned(),
            request_url: self.request_url(&url_token),
            folder_name,
            url_token,
        }
    }

    fn slug_target(&self, identifier: &ChapterIdentifier, slug: &str) -> ChapterTarget {
        ChapterTarget {
            identifier: identifier.clone(),
            suffix: None,
            request_url: self.request_url(slug),
            folder_name: sanitize_filename(&format!(
                "{}{slug}",
                self.settings.slug_folder_prefix
            )),
            url_token: slug.to_string(),
        }
    }

    fn request_url(&self, token: &str) -> String {
        let template = &self.settings.url_template;
        if template.contains(ID_PLACEHOLDER) {
            template.replace(ID_PLACEHOLDER, token)
        } else {
            format!("{template}{token}")
        }
    }
}

/// Folder marker for a suffix: its first `-` becomes `_` (`-5` -> `_5`).
fn suffix_marker(suffix: &str) -> String {
    suffix.replacen('-', "_", 1)
}
