//! Constants for the download module (timeouts, retry budgets, file naming).

use std::time::Duration;

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout for one asset (20 seconds).
pub const ASSET_TIMEOUT_SECS: u64 = 20;

/// Default attempts per asset, including the first.
pub const DEFAULT_ASSET_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts of the same asset.
pub const ASSET_RETRY_DELAY: Duration = Duration::from_millis(1500);

/// Width of the zero-padded on-disk index (`001.jpg`).
pub const INDEX_PAD_WIDTH: usize = 3;

/// Extension used when the URL has none or an unrecognized one.
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Extensions kept as-is when found on an asset URL.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

/// URL fragments of lazy-load placeholders and spinners.
pub const PLACEHOLDER_PATTERNS: &[&str] = &["transparent", "loading"];
