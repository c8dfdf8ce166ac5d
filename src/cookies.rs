//! Session cookie snapshot forwarded from the rendering session to asset requests.
//!
//! Some image hosts only serve a chapter's pages to the session that
//! rendered it. The rendering session's cookie jar is captured once per
//! successful chapter visit and replayed as a single `Cookie` header.

use std::collections::BTreeMap;
use std::fmt;

/// Cookie name to value mapping captured from the rendering session.
///
/// Values are sensitive; the `Debug` impl prints names only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    entries: BTreeMap<String, String>,
}

impl SessionCookies {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a cookie. Empty names are ignored.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if name.trim().is_empty() {
            return;
        }
        self.entries.insert(name, value.into());
    }

    /// Returns the value stored for `name`.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of cookies in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the snapshot holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the snapshot as a `Cookie` request header value
    /// (`a=1; b=2`), or `None` when empty. Names are sorted.
    #[must_use]
    pub fn to_header_value(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let joined = self
            .entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(joined)
    }
}

impl<K, V> FromIterator<(K, V)> for SessionCookies
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut cookies = Self::new();
        for (name, value) in iter {
            cookies.insert(name, value);
        }
        cookies
    }
}

impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookies")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}
