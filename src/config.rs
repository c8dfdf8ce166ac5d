//! Harvest profile: one TOML file describing a source and how to fetch it.
//!
//! Only `source.url_template` and `selectors.asset` are required; every other
//! field has a default. The profile also builds the run's components so the
//! binary and tests wire things up the same way.
//!
//! ```toml
//! [source]
//! url_template = "https://reader.example.com/comic/chap-{id}.html"
//!
//! [chapters]
//! start = 1
//! end = 20
//! suffixes = ["", "-1", "-5"]
//!
//! [selectors]
//! content_ready = ".reading-detail"
//! asset = ".page-chapter img"
//!
//! [missing]
//! path_marker = "/chap-"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::acquire::{AnyOf, ExpectedSlugDetector, LandingPageDetector, LazyLoadSettings, PathMarkerDetector};
use crate::chapter::{
    ChapterIdentifier, ChapterNumber, ChapterResolver, ChapterSelection, IdentifierError,
    ResolverSettings,
};
use crate::download::constants::{
    ALLOWED_EXTENSIONS, ASSET_TIMEOUT_SECS, CONNECT_TIMEOUT_SECS, DEFAULT_EXTENSION,
    PLACEHOLDER_PATTERNS,
};
use crate::download::{
    AssetFetcher, BatchDownloader, BatchError, DEFAULT_CONCURRENCY, HttpClient, MAX_CONCURRENCY,
    MIN_CONCURRENCY, RetryPolicy,
};
use crate::orchestrator::{ChapterOrchestrator, ChapterSettings};
use crate::runner::HarvestRunner;
use crate::user_agent::resolve_user_agent;

/// Errors raised while loading or validating a profile.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The profile file could not be read.
    #[error("failed to read profile {path}: {source}")]
    Read {
        /// Profile path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The profile is not valid TOML or has unexpected keys.
    #[error("failed to parse profile {path}: {source}")]
    Parse {
        /// Profile path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its accepted range.
    #[error("Invalid config value for `{field}`: {value}. Expected: {expected}")]
    InvalidValue {
        /// Dotted field name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },

    /// Neither a chapter range nor a slug list was given.
    #[error("no chapters selected: set `chapters.start` (and `chapters.end`) or `chapters.slugs`")]
    NoChapters,

    /// The chapter selection cannot be expanded.
    #[error("invalid chapter selection: {0}")]
    Chapters(#[from] IdentifierError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The batch downloader rejected its settings.
    #[error(transparent)]
    Batch(#[from] BatchError),
}

impl ConfigError {
    fn invalid(field: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::InvalidValue {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

/// Where chapters live.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Chapter URL template with an optional `{id}` placeholder.
    pub url_template: String,
    /// Zero-padding for the number in the URL (0 = none).
    #[serde(default)]
    pub url_pad_width: usize,
}

/// Which chapters to visit and how their folders are named.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChaptersConfig {
    /// First chapter of the range.
    pub start: Option<ChapterNumber>,
    /// Last chapter of the range (inclusive); defaults to `start`.
    pub end: Option<ChapterNumber>,
    /// Range step; defaults to 1.
    pub step: Option<ChapterNumber>,
    /// Explicit slugs; non-empty selects slug mode.
    pub slugs: Vec<String>,
    /// Suffix variants tried after the base variant.
    pub suffixes: Vec<String>,
    /// Numeric-mode folder prefix.
    pub folder_prefix: String,
    /// Zero-padding for folder numbers.
    pub folder_pad_width: usize,
    /// Slug-mode folder prefix.
    pub slug_folder_prefix: String,
}

impl Default for ChaptersConfig {
    fn default() -> Self {
        let naming = ResolverSettings::default();
        Self {
            start: None,
            end: None,
            step: None,
            slugs: Vec::new(),
            suffixes: naming.suffixes,
            folder_prefix: naming.folder_prefix,
            folder_pad_width: naming.folder_pad_width,
            slug_folder_prefix: naming.slug_folder_prefix,
        }
    }
}

/// Page selectors.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectorsConfig {
    /// Container awaited before extraction; no wait when absent.
    #[serde(default)]
    pub content_ready: Option<String>,
    /// Asset elements.
    pub asset: String,
    /// Attributes read before `src`.
    #[serde(default = "default_deferred_attributes")]
    pub deferred_attributes: Vec<String>,
}

/// Missing-chapter rules; any rule firing means missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MissingConfig {
    /// The final URL must contain this marker.
    pub path_marker: Option<String>,
    /// Final URLs that mean "bounced to the landing page".
    pub landing_pages: Vec<String>,
    /// The final URL must contain the target's URL token.
    pub require_slug: bool,
}

/// Per-target attempt settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChapterConfig {
    /// Attempts per target.
    pub max_attempts: u32,
    /// Deadline for one attempt, in seconds.
    pub timeout_secs: u64,
    /// Pause before a retry, in milliseconds.
    pub retry_delay_ms: u64,
    /// Content wait limit, in seconds.
    pub content_timeout_secs: u64,
    /// Single navigation limit, in seconds.
    pub navigation_timeout_secs: u64,
}

impl Default for ChapterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 60,
            retry_delay_ms: 2000,
            content_timeout_secs: 15,
            navigation_timeout_secs: 45,
        }
    }
}

/// Asset download settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    /// Root folder for chapter folders.
    pub output_dir: PathBuf,
    /// Window size (1..=100).
    pub concurrency: usize,
    /// Attempts per asset.
    pub asset_attempts: u32,
    /// Pause between asset attempts, in milliseconds.
    pub asset_retry_delay_ms: u64,
    /// Whole-request limit per asset, in seconds.
    pub asset_timeout_secs: u64,
    /// URL fragments of placeholder images.
    pub placeholder_patterns: Vec<String>,
    /// Extensions kept from asset URLs.
    pub allowed_extensions: Vec<String>,
    /// Extension used otherwise.
    pub default_extension: String,
    /// Send the page session's cookies with asset requests.
    pub forward_cookies: bool,
    /// Send the chapter URL as `Referer`.
    pub send_referer: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            concurrency: DEFAULT_CONCURRENCY,
            asset_attempts: 3,
            asset_retry_delay_ms: 1500,
            asset_timeout_secs: ASSET_TIMEOUT_SECS,
            placeholder_patterns: PLACEHOLDER_PATTERNS.iter().map(ToString::to_string).collect(),
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(ToString::to_string).collect(),
            default_extension: DEFAULT_EXTENSION.to_string(),
            forward_cookies: false,
            send_referer: true,
        }
    }
}

/// Scroll simulation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LazyLoadConfig {
    /// Pixels per step.
    pub step_px: u32,
    /// Pause between steps, in milliseconds.
    pub interval_ms: u64,
    /// Scrolling limit, in seconds.
    pub max_duration_secs: u64,
}

impl Default for LazyLoadConfig {
    fn default() -> Self {
        Self {
            step_px: 300,
            interval_ms: 50,
            max_duration_secs: 30,
        }
    }
}

/// Browser settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserConfig {
    /// Explicit browser binary.
    pub executable: Option<PathBuf>,
    /// Run without a window.
    pub headless: bool,
    /// User-Agent for the page and asset requests.
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            user_agent: None,
        }
    }
}

/// A complete harvest profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarvestConfig {
    /// Source addressing.
    pub source: SourceConfig,
    /// Chapter selection and folder naming.
    #[serde(default)]
    pub chapters: ChaptersConfig,
    /// Page selectors.
    pub selectors: SelectorsConfig,
    /// Missing-chapter rules.
    #[serde(default)]
    pub missing: MissingConfig,
    /// Per-target attempts.
    #[serde(default)]
    pub chapter: ChapterConfig,
    /// Asset downloads.
    #[serde(default)]
    pub download: DownloadConfig,
    /// Scroll simulation.
    #[serde(default)]
    pub lazy_load: LazyLoadConfig,
    /// Browser.
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl HarvestConfig {
    /// Reads and parses a profile. Call [`HarvestConfig::validate`] after
    /// applying any overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks every value against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.url_template.trim().is_empty() {
            return Err(ConfigError::invalid(
                "source.url_template",
                "\"\"",
                "a non-empty URL template",
            ));
        }
        if self.selectors.asset.trim().is_empty() {
            return Err(ConfigError::invalid(
                "selectors.asset",
                "\"\"",
                "a non-empty CSS selector",
            ));
        }
        if let Some(selector) = &self.selectors.content_ready
            && selector.trim().is_empty()
        {
            return Err(ConfigError::invalid(
                "selectors.content_ready",
                "\"\"",
                "a CSS selector, or omit the key",
            ));
        }
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.download.concurrency) {
            return Err(ConfigError::invalid(
                "download.concurrency",
                self.download.concurrency,
                "1..=100",
            ));
        }
        if self.chapter.max_attempts == 0 {
            return Err(ConfigError::invalid("chapter.max_attempts", 0, "at least 1"));
        }
        if self.download.asset_attempts == 0 {
            return Err(ConfigError::invalid("download.asset_attempts", 0, "at least 1"));
        }
        validate_secs("chapter.timeout_secs", self.chapter.timeout_secs)?;
        validate_secs("chapter.content_timeout_secs", self.chapter.content_timeout_secs)?;
        validate_secs("chapter.navigation_timeout_secs", self.chapter.navigation_timeout_secs)?;
        validate_secs("download.asset_timeout_secs", self.download.asset_timeout_secs)?;
        if self.lazy_load.step_px == 0 {
            return Err(ConfigError::invalid("lazy_load.step_px", 0, "at least 1"));
        }
        if !self.download.default_extension.starts_with('.') {
            return Err(ConfigError::invalid(
                "download.default_extension",
                &self.download.default_extension,
                "an extension with a leading dot, like .jpg",
            ));
        }

        self.identifiers()?;
        Ok(())
    }

    /// Chapter selection described by `[chapters]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoChapters`] when neither mode is configured.
    pub fn selection(&self) -> Result<ChapterSelection, ConfigError> {
        let chapters = &self.chapters;
        if !chapters.slugs.is_empty() {
            return Ok(ChapterSelection::Slugs(chapters.slugs.clone()));
        }
        let start = chapters.start.ok_or(ConfigError::NoChapters)?;
        Ok(ChapterSelection::Range {
            start,
            end: chapters.end.unwrap_or(start),
            step: chapters.step.unwrap_or(ChapterNumber::whole(1)),
        })
    }

    /// Identifiers to visit, in order.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing or unusable selection.
    pub fn identifiers(&self) -> Result<Vec<ChapterIdentifier>, ConfigError> {
        Ok(self.selection()?.identifiers()?)
    }

    /// Naming rules for the resolver.
    #[must_use]
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            url_template: self.source.url_template.trim().to_string(),
            url_pad_width: self.source.url_pad_width,
            suffixes: self.chapters.suffixes.clone(),
            folder_prefix: self.chapters.folder_prefix.clone(),
            folder_pad_width: self.chapters.folder_pad_width,
            slug_folder_prefix: self.chapters.slug_folder_prefix.clone(),
        }
    }

    /// Settings for the per-target state machine.
    #[must_use]
    pub fn chapter_settings(&self) -> ChapterSettings {
        ChapterSettings {
            max_attempts: self.chapter.max_attempts,
            timeout: Duration::from_secs(self.chapter.timeout_secs),
            retry_delay: Duration::from_millis(self.chapter.retry_delay_ms),
            content_selector: self.selectors.content_ready.clone(),
            content_timeout: Duration::from_secs(self.chapter.content_timeout_secs),
            asset_selector: self.selectors.asset.clone(),
            forward_cookies: self.download.forward_cookies,
            send_referer: self.download.send_referer,
            output_root: self.download.output_dir.clone(),
        }
    }

    /// Scroll settings for the page acquirer.
    #[must_use]
    pub fn lazy_load_settings(&self) -> LazyLoadSettings {
        LazyLoadSettings {
            step_px: self.lazy_load.step_px,
            interval: Duration::from_millis(self.lazy_load.interval_ms),
            max_duration: Duration::from_secs(self.lazy_load.max_duration_secs),
        }
    }

    /// Per-navigation timeout for the page acquirer.
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.chapter.navigation_timeout_secs)
    }

    /// User-Agent shared by the page and asset requests.
    #[must_use]
    pub fn user_agent(&self) -> String {
        resolve_user_agent(self.browser.user_agent.as_deref())
    }

    /// Missing-chapter rules from `[missing]`.
    #[must_use]
    pub fn missing_detector(&self) -> AnyOf {
        let mut rules = AnyOf::new();
        if let Some(marker) = self.missing.path_marker.as_deref().map(str::trim)
            && !marker.is_empty()
        {
            rules = rules.with(PathMarkerDetector::new(marker));
        }
        if !self.missing.landing_pages.is_empty() {
            rules = rules.with(LandingPageDetector::new(&self.missing.landing_pages));
        }
        if self.missing.require_slug {
            rules = rules.with(ExpectedSlugDetector);
        }
        rules
    }

    /// Asset HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the client cannot be built.
    pub fn http_client(&self) -> Result<HttpClient, ConfigError> {
        HttpClient::with_settings(
            &self.user_agent(),
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(self.download.asset_timeout_secs),
        )
        .map_err(ConfigError::HttpClient)
    }

    /// Windowed asset downloader.
    ///
    /// # Errors
    ///
    /// Returns an error if the client or the window size is invalid.
    pub fn batch_downloader(&self) -> Result<BatchDownloader, ConfigError> {
        let fetcher = AssetFetcher::new(
            self.http_client()?,
            RetryPolicy::new(
                self.download.asset_attempts,
                Duration::from_millis(self.download.asset_retry_delay_ms),
            ),
        )
        .with_placeholder_patterns(self.download.placeholder_patterns.clone());
        Ok(BatchDownloader::new(fetcher, self.download.concurrency)?.with_extensions(
            self.download.allowed_extensions.clone(),
            self.download.default_extension.clone(),
        ))
    }

    /// The fully wired runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the downloader cannot be built.
    pub fn build_runner(&self) -> Result<HarvestRunner, ConfigError> {
        let orchestrator = ChapterOrchestrator::new(self.chapter_settings(), self.batch_downloader()?);
        Ok(HarvestRunner::new(
            ChapterResolver::new(self.resolver_settings()),
            orchestrator,
        ))
    }

    /// Browser launch settings.
    #[cfg(feature = "chromium")]
    #[must_use]
    pub fn launch_options(&self) -> crate::renderer::chromium::LaunchOptions {
        crate::renderer::chromium::LaunchOptions {
            executable: self.browser.executable.clone(),
            headless: self.browser.headless,
            user_agent: self.user_agent(),
        }
    }
}

impl std::str::FromStr for HarvestConfig {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

fn validate_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::invalid(field, value, "1..=3600"));
    }
    Ok(())
}

fn default_deferred_attributes() -> Vec<String> {
    vec!["data-original".to_string(), "data-src".to_string()]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::acquire::MissingChapterDetector;
    use crate::chapter::ChapterTarget;

    const MINIMAL: &str = r#"
        [source]
        url_template = "https://reader.example.com/comic/chap-{id}.html"

        [chapters]
        start = 1
        end = 3

        [selectors]
        asset = ".page img"
    "#;

    fn parse(text: &str) -> HarvestConfig {
        text.parse().unwrap()
    }

    #[test]
    fn test_minimal_profile_uses_defaults() {
        let config = parse(MINIMAL);
        config.validate().unwrap();

        assert_eq!(config.download.concurrency, 10);
        assert_eq!(config.download.asset_attempts, 3);
        assert_eq!(config.download.asset_retry_delay_ms, 1500);
        assert_eq!(config.chapter.max_attempts, 3);
        assert_eq!(config.chapter.timeout_secs, 60);
        assert_eq!(config.chapter.retry_delay_ms, 2000);
        assert_eq!(config.chapters.suffixes, vec![String::new()]);
        assert_eq!(config.chapters.folder_prefix, "Chap_");
        assert_eq!(
            config.selectors.deferred_attributes,
            vec!["data-original", "data-src"]
        );
        assert!(config.browser.headless);
        assert!(config.download.send_referer);
        assert!(!config.download.forward_cookies);
        assert!(config.selectors.content_ready.is_none());
    }

    #[test]
    fn test_range_expands_to_identifiers() {
        let ids = parse(MINIMAL).identifiers().unwrap();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_end_defaults_to_start() {
        let text = MINIMAL.replace("end = 3", "");
        assert_eq!(parse(&text).identifiers().unwrap().len(), 1);
    }

    #[test]
    fn test_fractional_range_from_profile() {
        let text = MINIMAL
            .replace("start = 1", "start = 85")
            .replace("end = 3", "end = \"85.2\"\nstep = 0.1");
        let ids = parse(&text).identifiers().unwrap();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["85", "85.1", "85.2"]);
    }

    #[test]
    fn test_slugs_select_slug_mode() {
        let text = MINIMAL.replace("end = 3", "end = 3\nslugs = [\"one\", \"two\"]");
        let config = parse(&text);
        assert!(config.selection().unwrap().is_slug_mode());
        assert_eq!(config.identifiers().unwrap().len(), 2);
    }

    #[test]
    fn test_no_chapters_is_rejected() {
        let text = MINIMAL.replace("start = 1", "").replace("end = 3", "");
        assert!(matches!(
            parse(&text).validate(),
            Err(ConfigError::NoChapters)
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut config = parse(MINIMAL);
        config.download.concurrency = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("download.concurrency"), "{err}");

        let mut config = parse(MINIMAL);
        config.download.concurrency = 101;
        assert!(config.validate().is_err());

        let mut config = parse(MINIMAL);
        config.chapter.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = parse(MINIMAL);
        config.selectors.asset = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = parse(MINIMAL);
        config.download.default_extension = "jpg".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let text = MINIMAL.replace("start = 1", "start = 5");
        assert!(matches!(
            parse(&text).validate(),
            Err(ConfigError::Chapters(IdentifierError::StartAfterEnd { .. }))
        ));
    }

    #[test]
    fn test_runaway_range_is_rejected() {
        for (from, to) in [
            ("end = 3", "end = 100000000000"),
            ("end = 3", "end = 2\nstep = \"0.000000001\""),
        ] {
            let text = MINIMAL.replace(from, to);
            let err = parse(&text).validate().unwrap_err();
            assert!(
                matches!(
                    err,
                    ConfigError::Chapters(IdentifierError::RangeTooLarge { .. })
                ),
                "{err}"
            );
        }
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let text = MINIMAL.replace("asset = \".page img\"", "asset = \".page img\"\nassets = \"x\"");
        assert!(text.parse::<HarvestConfig>().is_err());
    }

    #[test]
    fn test_missing_section_builds_rules() {
        let text = format!(
            "{MINIMAL}\n[missing]\npath_marker = \"/chap-\"\nlanding_pages = [\"https://reader.example.com/comic\"]\n"
        );
        let config = parse(&text);
        let rules = config.missing_detector();
        assert_eq!(rules.len(), 2);

        let target: ChapterTarget = ChapterResolver::new(config.resolver_settings())
            .resolve(&config.identifiers().unwrap()[0])
            .remove(0);
        assert!(rules.is_missing("https://reader.example.com/comic/", &target));
        assert!(!rules.is_missing(&target.request_url, &target));
    }

    #[test]
    fn test_no_missing_rules_by_default() {
        assert!(parse(MINIMAL).missing_detector().is_empty());
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");
        let err = HarvestConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.toml"));

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(
            HarvestConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_build_runner_wires_components() {
        let config = parse(MINIMAL);
        let runner = config.build_runner().unwrap();
        let targets = runner.resolver().resolve_all(&config.identifiers().unwrap());
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[1].folder_name, "Chap_002");
        assert_eq!(
            targets[1].request_url,
            "https://reader.example.com/comic/chap-2.html"
        );
    }
}
