//! "This chapter does not exist" heuristics.
//!
//! Sources signal an absent chapter by redirecting somewhere else: the
//! series home or info page, or any URL without the chapter path marker.
//! Each rule is a [`MissingChapterDetector`] so a source's quirks are
//! configured, not hard-coded. A positive result is terminal and never
//! retried, so a redirect to an interstitial (anti-bot check, rate-limit
//! page) that matches a rule also skips the chapter.

use url::Url;

use crate::chapter::ChapterTarget;

/// Classifies a resolved URL as "the requested chapter is missing".
pub trait MissingChapterDetector: Send + Sync {
    /// True when `final_url` shows `target` does not exist.
    fn is_missing(&self, final_url: &str, target: &ChapterTarget) -> bool;
}

impl<F> MissingChapterDetector for F
where
    F: Fn(&str, &ChapterTarget) -> bool + Send + Sync,
{
    fn is_missing(&self, final_url: &str, target: &ChapterTarget) -> bool {
        self(final_url, target)
    }
}

/// Missing when the final URL lost the chapter path marker (`/chap-`).
#[derive(Debug, Clone)]
pub struct PathMarkerDetector {
    marker: String,
}

impl PathMarkerDetector {
    /// Creates the rule for `marker`.
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl MissingChapterDetector for PathMarkerDetector {
    fn is_missing(&self, final_url: &str, _target: &ChapterTarget) -> bool {
        !final_url.contains(&self.marker)
    }
}

/// Missing when the final URL is one of the source's landing pages.
///
/// Comparison ignores fragments, a trailing slash, and host case.
#[derive(Debug, Clone)]
pub struct LandingPageDetector {
    pages: Vec<String>,
}

impl LandingPageDetector {
    /// Creates the rule for the given landing pages.
    #[must_use]
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            pages: pages
                .into_iter()
                .map(|p| comparable_url(p.as_ref()))
                .collect(),
        }
    }
}

impl MissingChapterDetector for LandingPageDetector {
    fn is_missing(&self, final_url: &str, _target: &ChapterTarget) -> bool {
        let resolved = comparable_url(final_url);
        self.pages.iter().any(|page| *page == resolved)
    }
}

/// Missing when the final URL no longer contains the target's URL token.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectedSlugDetector;

impl MissingChapterDetector for ExpectedSlugDetector {
    fn is_missing(&self, final_url: &str, target: &ChapterTarget) -> bool {
        !final_url.contains(&target.url_token)
    }
}

/// Missing when any inner rule fires; never missing when empty.
#[derive(Default)]
pub struct AnyOf {
    rules: Vec<Box<dyn MissingChapterDetector>>,
}

impl AnyOf {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule.
    #[must_use]
    pub fn with(mut self, rule: impl MissingChapterDetector + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for AnyOf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyOf").field("rules", &self.rules.len()).finish()
    }
}

impl MissingChapterDetector for AnyOf {
    fn is_missing(&self, final_url: &str, target: &ChapterTarget) -> bool {
        self.rules.iter().any(|r| r.is_missing(final_url, target))
    }
}

fn comparable_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => trimmed.trim_end_matches('/').to_string(),
    }
}
