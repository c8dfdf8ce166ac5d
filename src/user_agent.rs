//! Shared User-Agent string for the rendering session and asset requests.
//!
//! Image hosts compare the asset request against the page request; both must
//! look like the same desktop browser or the host answers with a placeholder
//! or a 403.

/// Browser-equivalent User-Agent used unless a profile overrides it.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Returns the configured User-Agent, falling back to [`BROWSER_USER_AGENT`]
/// when the override is absent or blank.
#[must_use]
pub fn resolve_user_agent(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|ua| !ua.is_empty())
        .unwrap_or(BROWSER_USER_AGENT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_looks_like_a_browser() {
        assert!(BROWSER_USER_AGENT.starts_with("Mozilla/5.0"));
        assert!(BROWSER_USER_AGENT.contains("Chrome/"));
        assert!(!BROWSER_USER_AGENT.contains("Headless"));
    }

    #[test]
    fn test_resolve_user_agent_prefers_override() {
        assert_eq!(resolve_user_agent(Some("custom/1.0")), "custom/1.0");
        assert_eq!(resolve_user_agent(Some("   ")), BROWSER_USER_AGENT);
        assert_eq!(resolve_user_agent(None), BROWSER_USER_AGENT);
    }
}
